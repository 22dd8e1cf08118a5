//! Gaussian smoothing of a plotted series.
use crate::error::{HistError, Result};

/// Default standard deviation of the smoothing kernel
pub const DEFAULT_SIGMA: f64 = 2.0;

/// The kernel is cut off this many standard deviations from its centre
const TRUNCATE: f64 = 4.0;

/// Largest kernel half-width accepted; wider kernels are rejected
pub const MAX_KERNEL_RADIUS: i64 = 1_000_000;

/// Kernel half-width for `sigma`, or an error when it exceeds
/// [`MAX_KERNEL_RADIUS`]
fn kernel_radius(sigma: f64) -> Result<i64> {
    let radius = (TRUNCATE * sigma + 0.5).floor();
    if radius > MAX_KERNEL_RADIUS as f64 {
        return Err(HistError::InvalidParameter {
            reason: format!(
                "smoothing sigma {} needs a kernel radius above {}",
                sigma, MAX_KERNEL_RADIUS
            ),
        });
    }
    Ok(radius as i64)
}

/// Normalized Gaussian weights for offsets `-radius..=radius`
fn gaussian_kernel(sigma: f64, radius: i64) -> Vec<f64> {
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    weights.into_iter().map(|w| w / total).collect()
}

/// Map an out-of-bounds index back into `0..len` by mirroring about the
/// edges, repeating the edge sample (`d c b a | a b c d | d c b a`)
fn reflect_index(i: i64, len: usize) -> usize {
    let len = len as i64;
    let m = i.rem_euclid(2 * len);
    if m < len {
        m as usize
    } else {
        (2 * len - 1 - m) as usize
    }
}

/// Smooth `values` with a 1-D Gaussian filter of standard deviation `sigma`.
///
/// The output has the same length as the input. The input is not touched.
pub fn gaussian_filter1d(values: &[f64], sigma: f64) -> Result<Vec<f64>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(HistError::InvalidParameter {
            reason: format!("smoothing sigma must be positive, got {}", sigma),
        });
    }

    if values.is_empty() {
        return Ok(Vec::new());
    }

    let radius = kernel_radius(sigma)?;
    let kernel = gaussian_kernel(sigma, radius);

    let smoothed: Vec<f64> = (0..values.len() as i64)
        .map(|centre| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let offset = k as i64 - radius;
                    w * values[reflect_index(centre + offset, values.len())]
                })
                .sum::<f64>()
        })
        .collect();

    Ok(smoothed)
}
