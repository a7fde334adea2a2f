use crate::foundation::core::{Canvas, Region};
use crate::param::kinds::{ImageData, ImageKind, NumberKind, RegionKind};
use crate::render::compositor::{Compositor, RenderMode, RenderedFrame};
use crate::template::Template;
use crate::template::catalog::{Catalog, Registry};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];
const SHADOW: [u8; 4] = [0, 0, 0, 160];

fn template(module: &str, effects: &[&str]) -> Template {
    let registry = Registry::with_builtins();
    let mut t = Template::new("fx", Canvas::new(10, 10).unwrap());
    let m = registry.create_module(module, t.params_mut()).unwrap().unwrap();
    t.push_module(m);
    for name in effects {
        let e = registry.create_effect(name, t.params_mut()).unwrap().unwrap();
        t.add_effect(0, e).unwrap();
    }
    t
}

fn set_location(t: &mut Template, region: Region) {
    let id = t.module(0).unwrap().layer().inputs().id("Location").unwrap();
    t.params_mut().get_mut::<RegionKind>(id).unwrap().set_value(region);
}

fn set_effect_number(t: &mut Template, effect: usize, name: &str, value: f64) {
    let id = t.module(0).unwrap().effects()[effect]
        .layer()
        .inputs()
        .id(name)
        .unwrap();
    t.params_mut().get_mut::<NumberKind>(id).unwrap().set_value(value);
}

fn render(t: &mut Template) -> RenderedFrame {
    Compositor::default()
        .render(t, RenderMode::Export)
        .unwrap()
}

fn px(out: &RenderedFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * out.frame.width + x) * 4) as usize;
    [out.frame.data[i], out.frame.data[i + 1], out.frame.data[i + 2], out.frame.data[i + 3]]
}

#[test]
fn opacity_scales_premultiplied_pixels() {
    let mut t = template("Solid", &["Opacity"]);
    assert_eq!(px(&render(&mut t), 0, 0), WHITE);

    set_effect_number(&mut t, 0, "Opacity", 50.0);
    assert_eq!(px(&render(&mut t), 0, 0), [128, 128, 128, 128]);

    set_effect_number(&mut t, 0, "Opacity", 0.0);
    assert_eq!(px(&render(&mut t), 0, 0), CLEAR);
}

#[test]
fn out_of_range_effect_input_skips_the_module() {
    let mut t = template("Solid", &["Opacity"]);
    set_effect_number(&mut t, 0, "Opacity", 150.0);
    let out = render(&mut t);
    assert_eq!(out.skipped.len(), 1);
    assert!(t.module(0).unwrap().surface().is_blank());
    assert_eq!(px(&out, 0, 0), CLEAR);
}

#[test]
fn blur_softens_edges_and_zero_is_identity() {
    let mut t = template("Solid", &["Blur"]);
    set_location(&mut t, Region::new(0, 0, 5, 10));
    set_effect_number(&mut t, 0, "Radius", 0.0);
    let sharp = render(&mut t);
    assert_eq!(px(&sharp, 4, 5), WHITE);
    assert_eq!(px(&sharp, 5, 5), CLEAR);

    set_effect_number(&mut t, 0, "Radius", 2.0);
    let soft = render(&mut t);
    let inside = px(&soft, 3, 5)[3];
    let edge = px(&soft, 5, 5)[3];
    assert!(edge > 0 && edge < 255, "edge alpha {edge}");
    assert!(inside > edge);
    assert_eq!(px(&soft, 9, 5), CLEAR);
}

#[test]
fn drop_shadow_sits_under_the_module() {
    let mut t = template("Solid", &["DropShadow"]);
    set_location(&mut t, Region::new(0, 0, 4, 4));
    let out = render(&mut t);
    assert_eq!(px(&out, 1, 1), WHITE);
    // Overlap: the module stays on top of its own shadow.
    assert_eq!(px(&out, 3, 3), WHITE);
    assert_eq!(px(&out, 6, 6), SHADOW);
    assert_eq!(px(&out, 7, 7), SHADOW);
    assert_eq!(px(&out, 8, 8), CLEAR);
    assert_eq!(px(&out, 5, 1), CLEAR);
}

#[test]
fn soft_shadow_bleeds_past_its_edge() {
    let mut t = template("Solid", &["DropShadow"]);
    set_location(&mut t, Region::new(0, 0, 4, 4));
    set_effect_number(&mut t, 0, "Softness", 2.0);
    let out = render(&mut t);
    let a = px(&out, 8, 6)[3];
    assert!(a > 0 && a < 160, "bleed alpha {a}");
}

#[test]
fn node_shadow_follows_the_retained_visual() {
    let mut t = template("Image", &["DropShadow"]);
    let id = t.module(0).unwrap().layer().inputs().id("Image").unwrap();
    let green = ImageData::new(image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255])));
    t.params_mut().get_mut::<ImageKind>(id).unwrap().set_value(green);
    set_location(&mut t, Region::new(1, 1, 2, 2));
    set_effect_number(&mut t, 0, "Offset X", 3.0);
    set_effect_number(&mut t, 0, "Offset Y", 0.0);

    let out = render(&mut t);
    assert_eq!(px(&out, 1, 1), [0, 255, 0, 255]);
    assert_eq!(px(&out, 4, 1), SHADOW);
    assert_eq!(px(&out, 5, 2), SHADOW);
    assert_eq!(px(&out, 3, 1), CLEAR);
}

#[test]
fn huge_shadow_offset_is_rejected_without_panicking() {
    let mut t = template("Solid", &["DropShadow"]);
    set_effect_number(&mut t, 0, "Offset X", 1e19);
    let out = render(&mut t);
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(px(&out, 0, 0), CLEAR);
}

#[test]
fn shadow_offset_by_a_full_edge_falls_off_the_canvas() {
    let mut t = template("Solid", &["DropShadow"]);
    set_location(&mut t, Region::new(0, 0, 4, 4));
    set_effect_number(&mut t, 0, "Offset X", f64::from(Canvas::MAX_EDGE));
    set_effect_number(&mut t, 0, "Offset Y", -f64::from(Canvas::MAX_EDGE));
    let out = render(&mut t);
    assert!(out.skipped.is_empty());
    assert_eq!(px(&out, 1, 1), WHITE);
    assert_eq!(px(&out, 6, 6), CLEAR);
    assert_eq!(px(&out, 9, 0), CLEAR);
}

#[test]
fn effects_run_in_chain_order() {
    let mut faded_then_shadowed = template("Solid", &["Opacity", "DropShadow"]);
    set_location(&mut faded_then_shadowed, Region::new(0, 0, 4, 4));
    set_effect_number(&mut faded_then_shadowed, 0, "Opacity", 0.0);
    // Nothing left to cast a shadow from.
    assert_eq!(px(&render(&mut faded_then_shadowed), 6, 6), CLEAR);

    let mut shadowed_then_faded = template("Solid", &["DropShadow", "Opacity"]);
    set_location(&mut shadowed_then_faded, Region::new(0, 0, 4, 4));
    set_effect_number(&mut shadowed_then_faded, 1, "Opacity", 50.0);
    assert_eq!(px(&render(&mut shadowed_then_faded), 6, 6)[3], 80);
}
