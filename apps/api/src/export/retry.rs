//! Adaptive size budget for PDF export.
//!
//! Up to three normal passes, each cheaper than the last, then one forced pass
//! at the minimum settings that is kept whatever its size. Never more than
//! four rasterizations.

use serde::Serialize;

pub const INITIAL_SCALE: f32 = 1.5;
pub const INITIAL_QUALITY: f32 = 0.85;
pub const MIN_SCALE: f32 = 1.0;
pub const MIN_QUALITY: f32 = 0.5;
pub const SCALE_STEP: f32 = 0.3;
pub const QUALITY_STEP: f32 = 0.15;
pub const MAX_ATTEMPTS: u8 = 3;
/// Normal passes plus the forced one.
pub const MAX_PASSES: u8 = MAX_ATTEMPTS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Content streams are deflated.
    Medium,
    /// Nothing beyond the JPEG itself is compressed.
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportAttempt {
    /// 0-based count of normal passes already degraded from.
    pub attempt: u8,
    pub scale: f32,
    pub quality: f32,
    pub mode: CompressionMode,
    pub forced: bool,
}

impl ExportAttempt {
    pub fn initial() -> Self {
        ExportAttempt {
            attempt: 0,
            scale: INITIAL_SCALE,
            quality: INITIAL_QUALITY,
            mode: CompressionMode::Medium,
            forced: false,
        }
    }

    pub fn forced_minimum() -> Self {
        ExportAttempt {
            attempt: MAX_ATTEMPTS,
            scale: MIN_SCALE,
            quality: MIN_QUALITY,
            mode: CompressionMode::Fast,
            forced: true,
        }
    }

    /// JPEG quality on the 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    fn degraded(&self) -> Self {
        ExportAttempt {
            attempt: self.attempt + 1,
            scale: (self.scale - SCALE_STEP).max(MIN_SCALE),
            quality: (self.quality - QUALITY_STEP).max(MIN_QUALITY),
            mode: self.mode,
            forced: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Output is within the limit.
    Accept,
    /// Try again with cheaper settings.
    Retry(ExportAttempt),
    /// Normal passes exhausted; run the forced minimum pass.
    ForceMinimum(ExportAttempt),
    /// The forced pass is still too large; keep it anyway.
    AcceptOversized,
}

/// Decides what follows a pass that produced `size` bytes.
pub fn next_step(current: &ExportAttempt, size: usize, limit: usize) -> Step {
    if size <= limit {
        return Step::Accept;
    }
    if current.forced {
        return Step::AcceptOversized;
    }
    if current.attempt + 1 < MAX_ATTEMPTS {
        Step::Retry(current.degraded())
    } else {
        Step::ForceMinimum(ExportAttempt::forced_minimum())
    }
}

/// The setting to fall back to when a capture at `current.scale` is too tall
/// for the canvas. `None` once the minimum scale has already been tried.
pub fn on_canvas_overflow(current: &ExportAttempt) -> Option<ExportAttempt> {
    (current.scale > MIN_SCALE).then(ExportAttempt::forced_minimum)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives the state machine with a size function; returns the passes run.
    fn simulate(size_of: impl Fn(&ExportAttempt) -> usize, limit: usize) -> (Vec<ExportAttempt>, Step) {
        let mut passes = Vec::new();
        let mut attempt = ExportAttempt::initial();
        loop {
            passes.push(attempt);
            match next_step(&attempt, size_of(&attempt), limit) {
                Step::Retry(next) | Step::ForceMinimum(next) => attempt = next,
                done => return (passes, done),
            }
        }
    }

    #[test]
    fn test_small_output_accepted_first_time() {
        let (passes, step) = simulate(|_| 1_000, 5_000);
        assert_eq!(passes.len(), 1);
        assert_eq!(step, Step::Accept);
    }

    #[test]
    fn test_degrades_until_it_fits() {
        // fits once quality drops to 0.70 or below
        let (passes, step) = simulate(|a| if a.quality > 0.71 { 9_000 } else { 4_000 }, 5_000);
        assert_eq!(passes.len(), 2);
        assert_eq!(step, Step::Accept);
        assert!((passes[1].scale - 1.2).abs() < 1e-4);
        assert!((passes[1].quality - 0.70).abs() < 1e-4);
    }

    #[test]
    fn test_never_more_than_four_passes() {
        let (passes, step) = simulate(|_| usize::MAX, 5_000);
        assert_eq!(passes.len(), MAX_PASSES as usize);
        assert_eq!(step, Step::AcceptOversized);

        let last = passes[3];
        assert!(last.forced);
        assert_eq!(last.scale, MIN_SCALE);
        assert_eq!(last.quality, MIN_QUALITY);
        assert_eq!(last.mode, CompressionMode::Fast);
    }

    #[test]
    fn test_scale_and_quality_respect_floors() {
        let (passes, _) = simulate(|_| usize::MAX, 0);
        for pass in &passes {
            assert!(pass.scale >= MIN_SCALE);
            assert!(pass.quality >= MIN_QUALITY);
        }
        // third normal pass: 1.5 - 0.6 = 0.9 clamps to 1.0
        assert_eq!(passes[2].scale, MIN_SCALE);
        assert!((passes[2].quality - 0.55).abs() < 1e-4);
    }

    #[test]
    fn test_forced_pass_may_fit() {
        let (passes, step) = simulate(|a| if a.forced { 10 } else { 100 }, 50);
        assert_eq!(passes.len(), 4);
        assert_eq!(step, Step::Accept);
    }

    #[test]
    fn test_canvas_overflow_drops_to_minimum_scale() {
        let next = on_canvas_overflow(&ExportAttempt::initial()).unwrap();
        assert_eq!(next, ExportAttempt::forced_minimum());
        assert_eq!(on_canvas_overflow(&ExportAttempt::forced_minimum()), None);

        // the third normal pass already runs at the minimum scale
        let (passes, _) = simulate(|_| usize::MAX, 0);
        assert_eq!(on_canvas_overflow(&passes[2]), None);
    }

    #[test]
    fn test_jpeg_quality() {
        assert_eq!(ExportAttempt::initial().jpeg_quality(), 85);
        assert_eq!(ExportAttempt::forced_minimum().jpeg_quality(), 50);
    }
}
