use super::*;

fn settings(hold_seconds: f64) -> Settings {
    Settings {
        hold_seconds,
        ..Settings::default()
    }
}

fn plan(n: usize, hold: f64, seed: u64) -> TimelinePlan {
    TimelinePlan::new(n, &settings(hold), &mut Rng64::new(seed)).unwrap()
}

#[test]
fn two_images_default_hold() {
    let p = plan(2, 3.0, 1);
    assert_eq!(p.total_frames(), 240);
    assert_eq!(p.hold_frames(), 90);
    assert_eq!(p.transition_frames(), 30);
    assert_eq!(p.emitted_frames(), 90 + 30 + 90);
    assert_eq!(p.transitions().len(), 1);

    let kinds: Vec<_> = p
        .phases()
        .iter()
        .map(|sp| match sp.phase {
            TimelinePhase::Hold { .. } => "hold",
            TimelinePhase::Transition { .. } => "transition",
        })
        .collect();
    assert_eq!(kinds, ["hold", "transition", "hold"]);
    assert_eq!(p.phases()[1].range.len_frames(), 30);
}

#[test]
fn total_frames_formula_holds_for_many_shapes() {
    for n in 2..8 {
        for hold in [1.0, 1.5, 2.0, 3.0, 7.25, 10.0] {
            let p = plan(n, hold, n as u64);
            let expected = (n as f64 * (hold + 1.0) * 30.0).round() as u64;
            assert_eq!(p.total_frames(), expected, "n={n} hold={hold}");
            assert_eq!(p.frames().count() as u64, p.emitted_frames());
        }
    }
}

#[test]
fn one_transition_per_boundary_and_terminal_hold() {
    let p = plan(5, 1.0, 9);
    let transitions: Vec<_> = p
        .phases()
        .iter()
        .filter_map(|sp| match sp.phase {
            TimelinePhase::Transition {
                from_index,
                to_index,
                ..
            } => Some((from_index, to_index)),
            TimelinePhase::Hold { .. } => None,
        })
        .collect();
    assert_eq!(transitions, [(0, 1), (1, 2), (2, 3), (3, 4)]);
    assert!(matches!(
        p.phases().last().unwrap().phase,
        TimelinePhase::Hold { image_index: 4, .. }
    ));
}

#[test]
fn fewer_than_two_images_is_rejected() {
    for n in [0, 1] {
        let err = TimelinePlan::new(n, &Settings::default(), &mut Rng64::new(0)).unwrap_err();
        assert!(matches!(err, KenBurnsError::Validation(_)));
    }
}

#[test]
fn invalid_settings_are_rejected() {
    let err = TimelinePlan::new(3, &settings(0.2), &mut Rng64::new(0)).unwrap_err();
    assert!(matches!(err, KenBurnsError::Validation(_)));
}

#[test]
fn frames_are_contiguous_and_progress_ramps() {
    let p = plan(3, 1.0, 4);
    let mut expected = 0u64;
    let mut last_t = None;
    for d in p.frames() {
        assert_eq!(d.index, FrameIndex(expected));
        expected += 1;
        match d.step {
            FrameStep::Hold { t, .. } => {
                assert!((0.0..1.0).contains(&t));
                if let Some(prev) = last_t {
                    assert!(t == 0.0 || t > prev);
                }
                last_t = Some(t);
            }
            FrameStep::Transition { progress, .. } => {
                assert!((0.0..1.0).contains(&progress));
                last_t = None;
            }
        }
    }
    assert_eq!(expected, p.emitted_frames());
}

#[test]
fn progress_is_reported_every_fifth_frame() {
    let p = plan(2, 1.0, 0);
    let ticks: Vec<u64> = p
        .frames()
        .filter(|d| d.report_progress)
        .map(|d| d.frames_done())
        .collect();
    assert_eq!(ticks.first(), Some(&5));
    assert!(ticks.windows(2).all(|w| w[1] - w[0] == 5));
}

#[test]
fn progress_percent_rounds_and_clamps() {
    assert_eq!(progress_percent(0, 240), 0);
    assert_eq!(progress_percent(120, 240), 50);
    assert_eq!(progress_percent(210, 240), 88);
    assert_eq!(progress_percent(500, 240), 100);
    assert_eq!(progress_percent(3, 0), 100);
}

#[test]
fn descriptor_at_matches_iteration() {
    let p = plan(3, 1.5, 21);
    for d in p.frames() {
        assert_eq!(p.descriptor_at(d.index), Some(d));
    }
    assert_eq!(p.descriptor_at(FrameIndex(p.emitted_frames())), None);
}

#[test]
fn same_seed_same_plan() {
    let a = plan(6, 2.0, 77);
    let b = plan(6, 2.0, 77);
    assert_eq!(a.motions(), b.motions());
    assert_eq!(a.transitions(), b.transitions());
    let c = plan(6, 2.0, 78);
    assert_ne!(a.motions(), c.motions());
}

#[test]
fn transition_reuses_image_motion() {
    let p = plan(3, 1.0, 5);
    let first_transition = p
        .frames()
        .find(|d| matches!(d.step, FrameStep::Transition { .. }))
        .unwrap();
    let FrameStep::Transition {
        from_index,
        to_index,
        ..
    } = first_transition.step
    else {
        unreachable!()
    };
    assert_eq!((from_index, to_index), (0, 1));
    assert_eq!(first_transition.index.0, p.hold_frames());
    assert_eq!(p.motions().len(), 3);
}

#[test]
fn plan_serializes_phases_and_counts() {
    let p = plan(2, 3.0, 3);
    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["total_frames"], 240);
    assert_eq!(v["phases"][0]["phase"], "hold");
    assert_eq!(v["phases"][1]["phase"], "transition");
    assert_eq!(v["phases"][1]["frames"], 30);
    assert_eq!(v["phases"][1]["range"]["start"], 90);
}
