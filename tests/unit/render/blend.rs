use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_half_opacity_on_black_halves_color() {
    let out = over([0, 0, 0, 255], [200, 100, 0, 255], 0.5);
    assert_eq!(out, [100, 50, 0, 255]);
}

#[test]
fn crossfade_t_0_is_a_and_t_1_is_b() {
    let a = [10, 20, 30, 40];
    let b = [200, 210, 220, 230];
    assert_eq!(crossfade(a, b, 0.0), a);
    assert_eq!(crossfade(a, b, 1.0), b);
}

#[test]
fn crossfade_of_equal_colors_does_not_darken() {
    let c = [120, 60, 30, 255];
    for i in 0..=10 {
        let out = crossfade(c, c, i as f32 / 10.0);
        for ch in 0..4 {
            assert!(out[ch].abs_diff(c[ch]) <= 1, "t={i} {out:?}");
        }
    }
}

#[test]
fn crossfade_into_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(crossfade_into(&mut dst, &[0u8; 8], &[0u8; 4], 0.5).is_err());
}
