use super::*;
use crate::assets::image::AssetId;
use crate::foundation::core::FrameIndex;
use crate::foundation::rng::Rng64;
use crate::session::settings::{Resolution, Settings};

fn solid(id: u64, rgba: [u8; 4]) -> ImageAsset {
    let (w, h) = (64, 36);
    let mut px = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        px.extend_from_slice(&rgba);
    }
    ImageAsset::from_rgba8(AssetId(id), w, h, px).unwrap()
}

fn settings() -> Settings {
    Settings {
        hold_seconds: 1.0,
        resolution: Resolution::Hd720,
        add_music: false,
    }
}

#[test]
fn hold_frames_show_their_image_edge_to_edge() {
    let images = [solid(0, [200, 10, 10, 255]), solid(1, [10, 10, 200, 255])];
    let plan = TimelinePlan::new(2, &settings(), &mut Rng64::new(3)).unwrap();
    let mut r = FrameRenderer::new(settings().canvas());

    let first = plan.descriptor_at(FrameIndex(0)).unwrap();
    let f = r.render(&plan, &images, &first).unwrap();
    for (x, y) in [(0, 0), (1279, 0), (0, 719), (1279, 719), (640, 360)] {
        assert_eq!(f.pixel(x, y), [200, 10, 10, 255]);
    }

    let last = plan
        .descriptor_at(FrameIndex(plan.emitted_frames() - 1))
        .unwrap();
    let f = r.render(&plan, &images, &last).unwrap();
    assert_eq!(f.pixel(640, 360), [10, 10, 200, 255]);
}

#[test]
fn transition_frames_stay_opaque() {
    let images = [solid(0, [255, 255, 255, 255]), solid(1, [0, 255, 0, 255])];
    let plan = TimelinePlan::new(2, &settings(), &mut Rng64::new(8)).unwrap();
    let mut r = FrameRenderer::new(settings().canvas());
    let start = plan.hold_frames();
    for i in [start, start + 10, start + 29] {
        let d = plan.descriptor_at(FrameIndex(i)).unwrap();
        let f = r.render(&plan, &images, &d).unwrap();
        assert_eq!(f.pixel(640, 360)[3], 255);
        assert_eq!(f.pixel(0, 0)[3], 255);
    }
}

#[test]
fn missing_image_is_a_validation_error() {
    let images = [solid(0, [1, 2, 3, 255])];
    let plan = TimelinePlan::new(2, &settings(), &mut Rng64::new(1)).unwrap();
    let mut r = FrameRenderer::new(settings().canvas());
    let last = plan
        .descriptor_at(FrameIndex(plan.emitted_frames() - 1))
        .unwrap();
    let err = r.render(&plan, &images, &last).unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));
}
