// Unit tests for business rules

use super::*;

fn halves(fps1: f64, total1: i64, fps2: f64, total2: i64) -> HalfPair<HalfInfo> {
    HalfPair::new(
        HalfInfo {
            fps: fps1,
            total_frames: total1,
            duration_secs: total1 as f64 / fps1,
        },
        HalfInfo {
            fps: fps2,
            total_frames: total2,
            duration_secs: total2 as f64 / fps2,
        },
    )
}

fn corner() -> Window {
    Window { before: 2.0, after: 4.0 }
}

#[test]
fn test_frame_index_first_half_at_25_fps() {
    let annotation = Annotation::new("1 - 00:30", 30000);
    let target = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 67500, 25.0, 67500)).unwrap();
    assert_eq!(target, TemporalTarget::Frame { half: Half::First, index: 750 });
}

#[test]
fn test_frame_index_uses_selected_half_fps() {
    let annotation = Annotation::new("2 - 00:10", 10000);
    let target = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 1000, 50.0, 1000)).unwrap();
    assert_eq!(target, TemporalTarget::Frame { half: Half::Second, index: 500 });
}

#[test]
fn test_frame_index_floors() {
    // 1000 / 29.97 ms per frame
    assert_eq!(TemporalResolver::frame_index(1000, 29.97), 29);
    assert_eq!(TemporalResolver::frame_index(39, 25.0), 0);
    assert_eq!(TemporalResolver::frame_index(40, 25.0), 1);
    assert_eq!(TemporalResolver::frame_index(-1, 25.0), -1);
}

#[test]
fn test_frame_resolution_is_idempotent() {
    let annotation = Annotation::new("1 - 12:34", 754_321);
    let info = halves(29.97, 200_000, 29.97, 200_000);
    let first = TemporalResolver::resolve_frame(&annotation, &info).unwrap();
    let second = TemporalResolver::resolve_frame(&annotation, &info).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_frame_equal_to_total_is_rejected() {
    // 1000 frames at 25 fps; position 40000 ms resolves to frame 1000
    let annotation = Annotation::new("1 - 00:40", 40000);
    let result = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 1000, 25.0, 5000));
    assert_eq!(
        result,
        Err(SkipReason::FrameOutOfRange { index: 1000, total_frames: 1000 })
    );
}

#[test]
fn test_last_frame_is_accepted() {
    let annotation = Annotation::new("1 - 00:39", 39960);
    let target = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 1000, 25.0, 1000)).unwrap();
    assert_eq!(target, TemporalTarget::Frame { half: Half::First, index: 999 });
}

#[test]
fn test_negative_position_is_out_of_range() {
    let annotation = Annotation::new("2 - 00:00", -500);
    let result = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 1000, 25.0, 1000));
    assert!(matches!(result, Err(SkipReason::FrameOutOfRange { index: -13, .. })));
}

#[test]
fn test_invalid_half_is_rejected() {
    let annotation = Annotation::new("3 - 00:10", 10000);
    let frame = TemporalResolver::resolve_frame(&annotation, &halves(25.0, 1000, 25.0, 1000));
    assert!(matches!(frame, Err(SkipReason::InvalidHalf(_))));

    let clip = TemporalResolver::resolve_clip(&annotation, corner());
    assert!(matches!(clip, Err(SkipReason::InvalidHalf(_))));
}

#[test]
fn test_clip_second_half_scenario() {
    let annotation = Annotation::new("2 - 01:00", 60000);
    let target = TemporalResolver::resolve_clip(&annotation, corner()).unwrap();
    assert_eq!(
        target,
        TemporalTarget::Clip {
            half: Half::Second,
            range: ClipRange { start: 58.0, end: 64.0 },
        }
    );
}

#[test]
fn test_clip_start_clamps_to_zero() {
    let range = WindowPolicy::clip_range(1.5, corner());
    assert_eq!(range.start, 0.0);
    assert_eq!(range.end, 5.5);

    let range = WindowPolicy::clip_range(0.0, Window { before: 4.0, after: 4.0 });
    assert_eq!(range, ClipRange { start: 0.0, end: 4.0 });
}

#[test]
fn test_clip_end_is_not_bounded() {
    let range = WindowPolicy::clip_range(10_000.0, corner());
    assert_eq!(range.end, 10_004.0);
}

#[test]
fn test_clip_before_kickoff_is_empty() {
    let annotation = Annotation::new("1 - 00:00", -10_000);
    let result = TemporalResolver::resolve_clip(&annotation, corner());
    assert!(matches!(result, Err(SkipReason::EmptyRange { .. })));
}

#[test]
fn test_filter_exact_match_scenario() {
    let annotations = vec![
        Annotation::new("1 - 00:10", 10000).with_label("label", "Goal"),
        Annotation::new("1 - 00:20", 20000).with_label("label", "Corner"),
    ];
    let selected = AnnotationFilter::select(&annotations, "label", "Corner");
    assert_eq!(selected, vec![annotations[1].clone()]);
}

#[test]
fn test_filter_is_case_sensitive_and_exact() {
    let annotations = vec![
        Annotation::new("1 - 00:10", 10000).with_label("label", "corner"),
        Annotation::new("1 - 00:20", 20000).with_label("label", "Corner kick"),
        Annotation::new("1 - 00:30", 30000).with_label("label", "Corner"),
    ];
    let selected = AnnotationFilter::select(&annotations, "label", "Corner");
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].position_ms, 30000);
}

#[test]
fn test_filter_preserves_order_and_uses_selected_field() {
    let annotations = vec![
        Annotation::new("2 - 10:00", 600_000).with_label("change_type", "logo"),
        Annotation::new("1 - 05:00", 300_000).with_label("label", "logo"),
        Annotation::new("1 - 01:00", 60_000).with_label("change_type", "logo"),
        Annotation::new("1 - 02:00", 120_000),
    ];
    let selected = AnnotationFilter::select(&annotations, "change_type", "logo");
    let positions: Vec<i64> = selected.iter().map(|a| a.position_ms).collect();
    assert_eq!(positions, vec![600_000, 60_000]);
}

#[test]
fn test_artifact_names() {
    let encoding = EncodingConfig::default();
    let frame = TemporalTarget::Frame { half: Half::First, index: 750 };
    assert_eq!(ArtifactNamer::file_name(&frame, &encoding), "frame750.jpg");

    let clip = TemporalTarget::Clip {
        half: Half::Second,
        range: ClipRange { start: 58.7, end: 64.7 },
    };
    assert_eq!(ArtifactNamer::file_name(&clip, &encoding), "clip_58-64.mp4");
}
