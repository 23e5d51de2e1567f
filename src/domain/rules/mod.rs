// Domain rules - Temporal mapping, windowing, filtering and naming policies

use crate::domain::model::*;

#[cfg(test)]
mod tests;

/// Maps annotation timestamps onto one half's video
pub struct TemporalResolver;

impl TemporalResolver {
    /// `floor(position_ms / (1000 / fps))`
    pub fn frame_index(position_ms: i64, fps: f64) -> i64 {
        let frame_duration_ms = 1000.0 / fps;
        (position_ms as f64 / frame_duration_ms).floor() as i64
    }

    pub fn event_seconds(position_ms: i64) -> f64 {
        position_ms as f64 / 1000.0
    }

    /// Resolve an annotation to a single frame of the half it targets.
    ///
    /// Indices outside `[0, total_frames)` are rejected, never clamped.
    pub fn resolve_frame(
        annotation: &Annotation,
        halves: &HalfPair<HalfInfo>,
    ) -> Result<TemporalTarget, SkipReason> {
        let half = annotation
            .half()
            .map_err(|e| SkipReason::InvalidHalf(e.to_string()))?;
        let info = halves.get(half);

        let index = Self::frame_index(annotation.position_ms, info.fps);
        if index < 0 || index >= info.total_frames {
            return Err(SkipReason::FrameOutOfRange {
                index,
                total_frames: info.total_frames,
            });
        }

        Ok(TemporalTarget::Frame { half, index })
    }

    /// Resolve an annotation to a clip range around its event time
    pub fn resolve_clip(annotation: &Annotation, window: Window) -> Result<TemporalTarget, SkipReason> {
        let half = annotation
            .half()
            .map_err(|e| SkipReason::InvalidHalf(e.to_string()))?;

        let range = WindowPolicy::clip_range(Self::event_seconds(annotation.position_ms), window);
        if range.end <= range.start {
            return Err(SkipReason::EmptyRange {
                start: range.start,
                end: range.end,
            });
        }

        Ok(TemporalTarget::Clip { half, range })
    }
}

/// Applies an extraction window around an event time
pub struct WindowPolicy;

impl WindowPolicy {
    /// `start = max(0, event - before)`, `end = event + after`; the end is not
    /// bounded here, extraction truncates it to the source length.
    pub fn clip_range(event_seconds: f64, window: Window) -> ClipRange {
        ClipRange {
            start: (event_seconds - window.before).max(0.0),
            end: event_seconds + window.after,
        }
    }
}

/// Selects annotations by exact label value
pub struct AnnotationFilter;

impl AnnotationFilter {
    /// Ordered subsequence whose `field` equals `value` (case-sensitive).
    /// Annotations without the field never match.
    pub fn select(annotations: &[Annotation], field: &str, value: &str) -> Vec<Annotation> {
        annotations
            .iter()
            .filter(|annotation| annotation.label(field) == Some(value))
            .cloned()
            .collect()
    }
}

/// Deterministic artifact file names
pub struct ArtifactNamer;

impl ArtifactNamer {
    pub fn file_name(target: &TemporalTarget, encoding: &EncodingConfig) -> String {
        match target {
            TemporalTarget::Frame { index, .. } => {
                format!("frame{}.{}", index, encoding.image_extension)
            }
            TemporalTarget::Clip { range, .. } => format!(
                "clip_{}-{}.{}",
                range.start.trunc() as i64,
                range.end.trunc() as i64,
                encoding.clip_extension
            ),
        }
    }
}
