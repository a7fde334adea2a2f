use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
    assert_eq!(mul_div255_u16(255, 128), 128);
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = vec![200u8, 100, 50, 128, 10, 20, 30, 255, 9, 9, 9, 0];
    premultiply_in_place(&mut px);
    assert_eq!(&px[4..8], &[10, 20, 30, 255]);
    unpremultiply_in_place(&mut px);
    for (got, want) in px[0..3].iter().zip([200u8, 100, 50]) {
        assert!((i32::from(*got) - i32::from(want)).abs() <= 2);
    }
}
