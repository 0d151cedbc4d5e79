use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in [Ease::Linear, Ease::OutQuad] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn out_quad_is_strictly_increasing() {
    let mut prev = Ease::OutQuad.apply(0.0);
    for i in 1..=1000 {
        let v = Ease::OutQuad.apply(f64::from(i) / 1000.0);
        assert!(v > prev, "not increasing at step {i}");
        prev = v;
    }
}

#[test]
fn out_quad_front_loads_motion() {
    assert_eq!(Ease::OutQuad.apply(0.5), 0.75);
    assert!(Ease::OutQuad.apply(0.25) > Ease::Linear.apply(0.25));
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::OutQuad.apply(-1.0), 0.0);
    assert_eq!(Ease::OutQuad.apply(2.0), 1.0);
}

#[test]
fn lerp_hits_both_ends() {
    assert_eq!(lerp(1.0, 1.08, 0.0), 1.0);
    assert_eq!(lerp(1.0, 1.08, 1.0), 1.08);
    assert!((lerp(1.0, 1.08, 0.5) - 1.04).abs() < 1e-12);
}
