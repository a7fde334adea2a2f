use super::*;

#[test]
fn canvas_rejects_zero_and_oversized_edges() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(Canvas::new(4, 3).unwrap().byte_len(), 48);
}

#[test]
fn region_json_is_flat_object_of_ints() {
    let r = Region::new(10, 20, 100, 50);
    let v = serde_json::to_value(r).unwrap();
    assert_eq!(
        v,
        serde_json::json!({"x": 10, "y": 20, "width": 100, "height": 50})
    );
    let back: Region = serde_json::from_value(v).unwrap();
    assert_eq!(back, r);
}

#[test]
fn region_degenerate_and_contains() {
    assert!(Region::new(0, 0, 0, 5).is_degenerate());
    let r = Region::new(2, 2, 4, 4);
    assert!(r.contains(Point::new(3.0, 3.0)));
    assert!(!r.contains(Point::new(7.0, 3.0)));
}

#[test]
fn color_hex_roundtrip_and_short_form() {
    let c = Color::rgba(0x12, 0xAB, 0xCD, 0x80);
    assert_eq!(c.to_hex(), "#12ABCD80");
    assert_eq!(Color::parse_hex("#12abcd80").unwrap(), c);
    assert_eq!(
        Color::parse_hex("ff0000").unwrap(),
        Color::rgba(255, 0, 0, 255)
    );
    assert!(Color::parse_hex("#12345").is_err());
    assert!(Color::parse_hex("#GG0000").is_err());
}

#[test]
fn color_premul_scales_channels() {
    assert_eq!(Color::rgba(255, 128, 0, 128).to_premul(), [128, 64, 0, 128]);
    assert_eq!(Color::WHITE.to_premul(), [255, 255, 255, 255]);
}
