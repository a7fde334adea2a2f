use super::*;

#[test]
fn fill_rect_covers_interior_only() {
    let mut s = Surface::new(8, 8);
    let mut r = Rasterizer::new();
    r.fill_rect(&mut s, Rect::new(2.0, 2.0, 6.0, 6.0), Color::rgba(255, 0, 0, 255))
        .unwrap();
    assert_eq!(s.pixel(3, 3), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(7, 7), Some([0, 0, 0, 0]));
}

#[test]
fn fill_respects_surface_origin() {
    let mut s = Surface::with_origin(8, 8, (0, 4));
    let mut r = Rasterizer::new();
    r.fill_rect(&mut s, Rect::new(0.0, 0.0, 8.0, 2.0), Color::WHITE)
        .unwrap();
    assert_eq!(s.canvas_pixel(1, 1), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
}

#[test]
fn fill_circle_paints_center() {
    let mut s = Surface::new(16, 16);
    let mut r = Rasterizer::new();
    r.fill_circle(&mut s, Point::new(8.0, 8.0), 4.0, Color::BLACK)
        .unwrap();
    assert_eq!(s.pixel(8, 8), Some([0, 0, 0, 255]));
    assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn stroke_circle_leaves_the_center_open() {
    let mut s = Surface::new(16, 16);
    let mut r = Rasterizer::new();
    r.stroke_circle(&mut s, Point::new(8.0, 8.0), 5.0, 2.0, Color::BLACK)
        .unwrap();
    assert_eq!(s.pixel(8, 8), Some([0, 0, 0, 0]));
    assert!(s.pixel(13, 8).unwrap()[3] > 0);
    assert!(s.pixel(8, 3).unwrap()[3] > 0);
    assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn fill_text_inks_only_below_its_anchor() {
    use crate::render::text::{FontBook, TextStyle};

    let fonts = FontBook::new();
    fonts
        .register_font(include_bytes!("../../data/fonts/DejaVuSans.ttf"))
        .unwrap();
    let style = TextStyle {
        family: "DejaVu Sans".to_owned(),
        weight: 400.0,
        italic: false,
        size: 20.0,
        color: Color::rgba(255, 0, 0, 255),
        wrap: None,
    };
    let layout = fonts.layout("HH", &style).unwrap();

    let mut s = Surface::new(64, 64);
    let mut r = Rasterizer::new();
    r.fill_text(&mut s, &layout, Point::new(10.0, 30.0)).unwrap();
    let inked: Vec<(u32, u32)> = (0..64)
        .flat_map(|y| (0..64).map(move |x| (x, y)))
        .filter(|&(x, y)| s.pixel(x, y).unwrap()[3] > 0)
        .collect();
    assert!(!inked.is_empty());
    assert!(inked.iter().all(|&(x, y)| x >= 10 && y >= 30));
    // Glyph color is premultiplied red.
    assert!(inked.iter().any(|&(x, y)| s.pixel(x, y) == Some([255, 0, 0, 255])));
}
