//! Pure calculation functions for photo geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Difference between width and height below which a photo counts as square.
pub const SCALE_RANGE: u32 = 120;

/// Layout scale factors consumed by the gallery's column layout.
///
/// These are relative weights, not pixel sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactors {
    pub width: u32,
    pub height: u32,
}

/// Compute layout scale factors from true pixel dimensions.
///
/// Near-square photos (`|height - width| < 120`) get `1 × 1`; everything
/// else gets each dimension divided by 120, rounded half up.
///
/// # Examples
/// ```
/// # use photo_manifest::imaging::scale_factors;
/// let s = scale_factors(800, 850);
/// assert_eq!((s.width, s.height), (1, 1));
///
/// let s = scale_factors(1000, 400);
/// assert_eq!((s.width, s.height), (8, 3));
/// ```
pub fn scale_factors(width: u32, height: u32) -> ScaleFactors {
    if width.abs_diff(height) < SCALE_RANGE {
        return ScaleFactors {
            width: 1,
            height: 1,
        };
    }
    ScaleFactors {
        width: divide_rounded(width, SCALE_RANGE),
        height: divide_rounded(height, SCALE_RANGE),
    }
}

/// Bounding box for the down-sampled copy used to compute a placeholder.
///
/// Each dimension is divided by `divisor` and rounded, never below 1 pixel.
/// The backend fits the image inside this box, so the aspect ratio survives.
pub fn sample_dimensions(dims: (u32, u32), divisor: u32) -> (u32, u32) {
    let divisor = divisor.max(1);
    (
        divide_rounded(dims.0, divisor).max(1),
        divide_rounded(dims.1, divisor).max(1),
    )
}

fn divide_rounded(value: u32, divisor: u32) -> u32 {
    (value as f64 / divisor as f64).round() as u32
}
