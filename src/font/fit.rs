//! Font size fitting.
//!
//! Scans sizes upward from the minimum and keeps the last one whose measured
//! box fits the target. The scan stops at the first overflow, which relies on
//! every [`TextMeasure`] growing monotonically with size.

use super::TextMeasure;

/// Outcome of a fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub size: f32,
    /// Even the minimum size did not fit; text is drawn at `size` anyway.
    pub overflow: bool,
}

/// Largest size in `[min, max]`, stepping by `step`, whose box fits within
/// `width × height`.
///
/// ```
/// use eticheta::font::{fit_text, TextMeasure};
///
/// struct Mono;
/// impl TextMeasure for Mono {
///     fn measure(&self, text: &str, size: f32) -> (f32, f32) {
///         (text.len() as f32 * size * 0.5, size)
///     }
/// }
///
/// let fit = fit_text(&Mono, "ABCD", (100.0, 40.0), (8.0, 72.0), 1.0);
/// assert_eq!(fit.size, 40.0);
/// assert!(!fit.overflow);
/// ```
pub fn fit_text(
    measure: &dyn TextMeasure,
    text: &str,
    (width, height): (f32, f32),
    (min, max): (f32, f32),
    step: f32,
) -> Fit {
    let fits = |size: f32| {
        let (w, h) = measure.measure(text, size);
        w <= width && h <= height
    };

    if !fits(min) {
        log::debug!("{:?} overflows {}x{} even at {}", text, width, height, min);
        return Fit {
            size: min,
            overflow: true,
        };
    }

    let step = if step > 0.0 { step } else { 1.0 };
    let mut best = min;
    let mut k = 1u32;
    loop {
        let candidate = min + step * k as f32;
        if candidate > max || !fits(candidate) {
            break;
        }
        best = candidate;
        k += 1;
    }

    Fit {
        size: best,
        overflow: false,
    }
}
