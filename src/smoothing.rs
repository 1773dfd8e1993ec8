use crate::error::{ClusterRasterError, Result};
use crate::raster::Raster;
use log::{debug, info};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut2, Axis};

/// Default kernel spread, in pixels
pub const DEFAULT_SIGMA: f64 = 15.0;

/// Kernel radius in multiples of sigma (same truncation as scipy.ndimage)
const TRUNCATE: f64 = 4.0;

/// Smooth every band of the raster with an isotropic Gaussian of spread `sigma`.
///
/// `sigma <= 0` returns the raster untouched. Bands are filtered independently
/// and in parallel; borders are extended by symmetric reflection so the
/// output keeps the input shape.
pub fn smooth(mut raster: Raster, sigma: f64) -> Result<Raster> {
    if !sigma.is_finite() {
        return Err(ClusterRasterError::InvalidSigma(sigma));
    }
    if sigma <= 0.0 {
        debug!("sigma={} requested, smoothing skipped", sigma);
        return Ok(raster);
    }

    let kernel = gaussian_kernel(sigma);
    info!(
        "Smoothing {} bands (sigma: {} px, kernel radius: {} px)",
        raster.band_count(),
        sigma,
        kernel.len() / 2
    );

    raster
        .data
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(band_index, mut band)| {
            debug!("Smoothing band {}", band_index + 1);
            smooth_band(&mut band, &kernel);
        });

    Ok(raster)
}

/// Normalised 1-D Gaussian weights of length `2 * radius + 1`
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let d = i as f64 - radius as f64;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();

    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
    weights
}

/// Mirror an out-of-range index back into `0..len` (`d c b a | a b c d | d c b a`)
fn reflect_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let m = index.rem_euclid(period) as usize;
    if m < len {
        m
    } else {
        2 * len - 1 - m
    }
}

fn convolve_line(input: &[f64], kernel: &[f64], output: &mut [f64]) {
    let radius = (kernel.len() / 2) as isize;
    let len = input.len();

    for (i, out) in output.iter_mut().enumerate() {
        *out = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * input[reflect_index(i as isize + k as isize - radius, len)])
            .sum();
    }
}

/// Separable pass: rows first, then columns. Accumulates in f64.
fn smooth_band(band: &mut ArrayViewMut2<f32>, kernel: &[f64]) {
    let (nrows, ncols) = band.dim();
    if nrows == 0 || ncols == 0 {
        return;
    }

    let mut work: Array2<f64> = band.mapv(f64::from);

    let mut line = vec![0.0; ncols];
    let mut filtered = vec![0.0; ncols];
    for mut row in work.rows_mut() {
        line.iter_mut().zip(row.iter()).for_each(|(l, &v)| *l = v);
        convolve_line(&line, kernel, &mut filtered);
        row.iter_mut().zip(&filtered).for_each(|(v, &f)| *v = f);
    }

    let mut line = vec![0.0; nrows];
    let mut filtered = vec![0.0; nrows];
    for mut col in work.columns_mut() {
        line.iter_mut().zip(col.iter()).for_each(|(l, &v)| *l = v);
        convolve_line(&line, kernel, &mut filtered);
        col.iter_mut().zip(&filtered).for_each(|(v, &f)| *v = f);
    }

    band.zip_mut_with(&work, |out, &v| *out = v as f32);
}
