use std::rc::Rc;

use super::*;
use crate::foundation::core::{Canvas, Color};
use crate::layer::composite::CompositeModule;
use crate::param::kinds::{ColorKind, ImageData, TextKind};
use crate::param::undo::{UndoHistory, UndoLog};
use crate::render::compositor::{Compositor, RenderMode, RenderedFrame};
use crate::template::Template;

const GREEN: [u8; 4] = [0, 255, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn banner() -> Template {
    banner_with(FontBook::new(), 20, 10)
}

fn banner_with(fonts: FontBook, width: u32, height: u32) -> Template {
    let mut t = Template::new("banner", Canvas::new(width, height).unwrap());
    let m = Module::new(
        Box::new(CompositeModule::new(Banner::new(fonts))),
        t.params_mut(),
    )
    .unwrap();
    t.push_module(m);
    t
}

fn dejavu() -> FontBook {
    let fonts = FontBook::new();
    fonts
        .register_font(include_bytes!("../../data/fonts/DejaVuSans.ttf"))
        .unwrap();
    fonts
}

fn set_title(t: &mut Template, title: &str) {
    let id = t.module(0).unwrap().layer().inputs().id("Title").unwrap();
    t.params_mut()
        .get_mut::<TextKind>(id)
        .unwrap()
        .set_value(title.to_owned());
}

fn children(t: &Template) -> &[Module] {
    t.module(0)
        .unwrap()
        .behavior_as::<CompositeModule<Banner>>()
        .unwrap()
        .children()
}

fn set_number(t: &mut Template, name: &str, value: f64) {
    let id = t.module(0).unwrap().layer().inputs().id(name).unwrap();
    t.params_mut().get_mut::<NumberKind>(id).unwrap().set_value(value);
}

fn set_logo(t: &mut Template, w: u32, h: u32) {
    let id = t.module(0).unwrap().layer().inputs().id("Logo").unwrap();
    let logo = ImageData::new(image::RgbaImage::from_pixel(w, h, image::Rgba(GREEN)));
    t.params_mut().get_mut::<ImageKind>(id).unwrap().set_value(logo);
}

fn child_location(t: &Template, child: usize) -> Option<Region> {
    children(t)[child]
        .layer()
        .inputs()
        .value::<RegionKind>(t.params(), "Location")
}

fn px(out: &RenderedFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * out.frame.width + x) * 4) as usize;
    [out.frame.data[i], out.frame.data[i + 1], out.frame.data[i + 2], out.frame.data[i + 3]]
}

#[test]
fn child_inputs_are_shared_not_copied() {
    let t = banner();
    let own = t.module(0).unwrap().layer().inputs();
    let kids = children(&t);
    assert_eq!(own.id("Background"), kids[BAR].layer().inputs().id("Background"));
    assert_eq!(own.id("Location"), kids[BAR].layer().inputs().id("Location"));
    assert_eq!(own.id("Logo"), kids[LOGO].layer().inputs().id("Image"));
    assert!(!own.contains("Image"));

    let bg = own.id("Background").unwrap();
    assert_eq!(t.params().ref_count(bg), 2);
}

#[test]
fn editing_through_the_banner_reaches_the_child() {
    let mut t = banner();
    let bg = t.module(0).unwrap().layer().inputs().id("Background").unwrap();
    t.params_mut()
        .get_mut::<ColorKind>(bg)
        .unwrap()
        .set_value(Color::rgba(1, 2, 3, 255));
    let child = children(&t)[BAR]
        .layer()
        .inputs()
        .value::<ColorKind>(t.params(), "Background");
    assert_eq!(child, Some(Color::rgba(1, 2, 3, 255)));
}

#[test]
fn bar_without_logo_is_padding_tall() {
    let mut t = banner();
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!((out.frame.width, out.frame.height), (20, 20));
    assert_eq!(out.origin, (0, 10));
    assert_eq!(child_location(&t, BAR), Some(Region::new(0, -10, 20, 10)));
    assert_eq!(px(&out, 0, 0), WHITE);
    assert_eq!(px(&out, 19, 9), WHITE);
    assert_eq!(px(&out, 0, 10), [0, 0, 0, 0]);
}

#[test]
fn logo_sits_inside_the_padded_bar() {
    let mut t = banner();
    set_logo(&mut t, 4, 2);
    set_number(&mut t, "Padding", 3.0);
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();

    assert_eq!(out.frame.height, 18);
    assert_eq!(child_location(&t, BAR), Some(Region::new(0, -8, 20, 8)));
    assert_eq!(child_location(&t, LOGO), Some(Region::new(3, -5, 4, 2)));
    // Canvas (3, -5) lands at frame (3, 3).
    assert_eq!(px(&out, 3, 3), GREEN);
    assert_eq!(px(&out, 6, 4), GREEN);
    assert_eq!(px(&out, 2, 3), WHITE);
    assert_eq!(px(&out, 7, 3), WHITE);
}

#[test]
fn zero_height_banner_is_skipped() {
    let mut t = banner();
    set_number(&mut t, "Padding", 0.0);
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].reason, "banner has no height");
    assert_eq!((out.frame.width, out.frame.height), (20, 10));
}

#[test]
fn layout_is_not_an_edit() {
    let mut t = banner();
    let log = Rc::new(UndoLog::new());
    let history: Rc<dyn UndoHistory> = log.clone();
    for (_, slot) in t.params_mut().iter_mut() {
        slot.register_undo_once(&history);
    }
    Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert!(!log.can_undo());
}

#[test]
fn primary_child_is_the_bar() {
    let mut t = banner();
    Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    let m = t.module(0).unwrap();
    assert_eq!(m.bounds(t.params()), Some(Region::new(0, -10, 20, 10)));
}

#[test]
fn oversized_padding_is_invalid_instead_of_overflowing() {
    let mut t = banner();
    set_number(&mut t, "Padding", 3e9);
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].reason, "input \"Padding\" is not valid");
    assert_eq!((out.frame.width, out.frame.height), (20, 10));
}

#[test]
fn bar_location_is_owned_by_layout() {
    let t = banner();
    let m = t.module(0).unwrap();
    let own = m.layer().inputs();
    let location = own.id("Location").unwrap();
    assert!(t.params().slot(location).unwrap().is_disabled());
    assert_eq!(m.user_inputs(t.params()), own.len() - 1);
    assert!(!t.params().slot(own.id("Padding").unwrap()).unwrap().is_disabled());
}

#[test]
fn title_inputs_are_shared_from_the_text_child() {
    let t = banner();
    let own = t.module(0).unwrap().layer().inputs();
    let title = children(&t)[TITLE].layer().inputs();
    assert_eq!(own.id("Title"), title.id("Content"));
    assert_eq!(own.id("Title Color"), title.id("Color"));
    assert_eq!(own.id("Title Font"), title.id("Family"));
    assert_eq!(own.id("Title Size"), title.id("Size"));
    assert_eq!(own.value::<TextKind>(t.params(), "Title").as_deref(), Some(""));
}

#[test]
fn title_sets_the_bar_height_and_sits_right_of_the_logo() {
    let mut t = banner_with(dejavu(), 200, 40);
    set_logo(&mut t, 4, 2);
    set_title(&mut t, "Hi");
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert!(out.skipped.is_empty());

    let bar = child_location(&t, BAR).unwrap();
    let title = child_location(&t, TITLE).unwrap();
    let logo = child_location(&t, LOGO).unwrap();
    assert_eq!(title.x, 5 + 4 + 5);
    assert!(title.height > 2);
    assert_eq!(bar, Region::new(0, -(title.height + 10), 200, title.height + 10));
    assert_eq!(title.y, bar.y + 5);
    assert_eq!(logo.y, bar.y + 5 + (title.height - 2) / 2);
    assert_eq!(out.origin, (0, bar.height));

    // Black glyphs on the white bar, inside the title's box.
    let dark: Vec<(u32, u32)> = (0..out.frame.height)
        .flat_map(|y| (0..out.frame.width).map(move |x| (x, y)))
        .filter(|&(x, y)| {
            let [r, g, _, a] = px(&out, x, y);
            a == 255 && r < 128 && g < 128
        })
        .collect();
    assert!(!dark.is_empty());
    let frame_title = title.translate(0, bar.height);
    assert!(dark.iter().all(|&(x, y)| {
        frame_title.contains(crate::foundation::core::Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5))
    }));
}

#[test]
fn long_titles_wrap_to_the_bar() {
    let mut t = banner_with(dejavu(), 120, 40);
    set_title(&mut t, "one two three four five six");
    Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    let title = child_location(&t, TITLE).unwrap();
    assert!(title.width <= 120 - 10);
    let wrap = children(&t)[TITLE]
        .layer()
        .inputs()
        .value::<NumberKind>(t.params(), "Wrap");
    assert_eq!(wrap, Some(110.0));
}

#[test]
fn unresolvable_title_font_leaves_the_bar_padding_tall() {
    let mut t = banner();
    set_title(&mut t, "Hi");
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert!(out.skipped.is_empty());
    assert_eq!((out.frame.width, out.frame.height), (20, 20));
    assert_eq!(px(&out, 10, 5), WHITE);
}
