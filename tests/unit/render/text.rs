use super::*;

const DEJAVU: &[u8] = include_bytes!("../../data/fonts/DejaVuSans.ttf");

fn book() -> FontBook {
    let fonts = FontBook::new();
    fonts.register_font(DEJAVU).unwrap();
    fonts
}

fn style(size: f32, wrap: Option<f32>) -> TextStyle {
    TextStyle {
        family: "DejaVu Sans".to_owned(),
        weight: 400.0,
        italic: false,
        size,
        color: Color::BLACK,
        wrap,
    }
}

#[test]
fn registering_names_the_family_once() {
    let fonts = FontBook::new();
    assert!(fonts.families().is_empty());
    assert_eq!(fonts.register_font(DEJAVU).unwrap(), ["DejaVu Sans"]);
    fonts.register_font(DEJAVU).unwrap();
    assert_eq!(fonts.families(), ["DejaVu Sans"]);
    assert_eq!(fonts.family("dejavu sans").as_deref(), Some("DejaVu Sans"));
    assert_eq!(fonts.family("Comic Sans"), None);
}

#[test]
fn clones_share_registrations() {
    let fonts = FontBook::new();
    let shared = fonts.clone();
    fonts.register_font(DEJAVU).unwrap();
    assert_eq!(shared.families(), ["DejaVu Sans"]);
}

#[test]
fn garbage_is_not_a_font() {
    let fonts = FontBook::new();
    assert!(matches!(
        fonts.register_font(b"not a font"),
        Err(ComposerError::Validation(_))
    ));
    assert!(fonts.families().is_empty());
}

#[test]
fn load_dir_picks_up_font_files() {
    let fonts = FontBook::new();
    assert_eq!(fonts.load_dir(Path::new("tests/data/fonts")).unwrap(), 1);
    assert_eq!(fonts.families(), ["DejaVu Sans"]);
    assert!(fonts.load_dir(Path::new("tests/data/no-such-dir")).is_err());
}

#[test]
fn layout_grows_with_size_and_wraps() {
    let fonts = book();
    let small = fonts.layout("Hello world", &style(12.0, None)).unwrap();
    let large = fonts.layout("Hello world", &style(24.0, None)).unwrap();
    assert!(small.width() > 0.0 && small.height() > 0.0);
    assert!(large.width() > small.width());
    assert!(large.height() > small.height());

    let narrow = fonts
        .layout("Hello world", &style(24.0, Some(large.width() / 2.0)))
        .unwrap();
    assert!(narrow.width() < large.width());
    assert!(narrow.height() > large.height());
}

#[test]
fn layout_rejects_unknown_families_and_bad_sizes() {
    let fonts = book();
    let mut unknown = style(12.0, None);
    unknown.family = "Nope".to_owned();
    assert!(fonts.layout("x", &unknown).is_err());
    assert!(fonts.layout("x", &style(0.0, None)).is_err());
    assert!(fonts.layout("x", &style(f32::NAN, None)).is_err());
}
