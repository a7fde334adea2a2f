use super::*;
use crate::foundation::core::Canvas;
use crate::layer::module::Module;
use crate::render::compositor::{Compositor, RenderMode, RenderedFrame};
use crate::template::Template;

fn solid(canvas: Canvas) -> Template {
    let mut t = Template::new("solid", canvas);
    let m = Module::new(Box::new(Solid::default()), t.params_mut()).unwrap();
    t.push_module(m);
    t
}

fn set_location(t: &mut Template, region: Region) {
    let id = t.module(0).unwrap().layer().inputs().id("Location").unwrap();
    t.params_mut()
        .get_mut::<RegionKind>(id)
        .unwrap()
        .set_value(region);
}

fn px(out: &RenderedFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * out.frame.width + x) * 4) as usize;
    out.frame.data[i..i + 4].try_into().unwrap()
}

#[test]
fn defaults_fill_white_over_the_canvas() {
    let mut t = solid(Canvas::new(8, 8).unwrap());
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert!(out.frame.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
}

#[test]
fn fills_only_its_location() {
    let mut t = solid(Canvas::new(8, 8).unwrap());
    set_location(&mut t, Region::new(2, 3, 4, 2));
    let color = t.module(0).unwrap().layer().inputs().id("Background").unwrap();
    t.params_mut()
        .get_mut::<ColorKind>(color)
        .unwrap()
        .set_value(Color::rgba(0, 0, 255, 255));

    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(px(&out, 2, 3), [0, 0, 255, 255]);
    assert_eq!(px(&out, 5, 4), [0, 0, 255, 255]);
    assert_eq!(px(&out, 1, 3), [0, 0, 0, 0]);
    assert_eq!(px(&out, 6, 4), [0, 0, 0, 0]);
    assert_eq!(px(&out, 2, 5), [0, 0, 0, 0]);
}

#[test]
fn empty_location_skips() {
    let mut t = solid(Canvas::new(4, 4).unwrap());
    set_location(&mut t, Region::new(1, 1, 0, 3));
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].reason, "location is empty");
    assert!(out.frame.data.iter().all(|&b| b == 0));
}

#[test]
fn unparseable_location_skips_instead_of_failing() {
    let mut t = solid(Canvas::new(4, 4).unwrap());
    let id = t.module(0).unwrap().layer().inputs().id("Location").unwrap();
    t.params_mut()
        .get_mut::<RegionKind>(id)
        .unwrap()
        .edit(|fields| fields.x = "left".into());
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(out.skipped.len(), 1);
    assert!(out.skipped[0].reason.contains("Location"));
}
