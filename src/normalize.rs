//! Turning raw exposure counts into pixel intensities.
//!
//! Visitation counts are extremely heavy-tailed: a handful of pixels
//! near the origin collect orders of magnitude more visits than the
//! rest.  Scaling linearly leaves everything but those pixels black, so
//! intensities are taken on the square root of the counts instead.

use std::str::FromStr;

use crate::errors::RenderError;
use crate::exposure::{Exposure, Policy};
use crate::raster::Raster;

/// How channels become colors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// The first histogram drives all three output channels.
    Grayscale,
    /// Histogram `k` drives output channel `k`.
    FullColor,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::FullColor
    }
}

impl FromStr for ColorMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(ColorMode::Grayscale),
            "color" | "colour" | "full-color" => Ok(ColorMode::FullColor),
            other => Err(RenderError::invalid(format!("unknown color mode '{}'", other))),
        }
    }
}

/// Maps each visit count to a byte.  Under the additive policy a
/// count `n` becomes `255 * sqrt(n) / sqrt(max)`; under the
/// multiplicative policy it becomes `255 * sqrt(f^n) / sqrt(f^max)`,
/// computed as `255 * f^((n - max) / 2)` so that no `f^n` is ever
/// formed.  Both are truncated.
///
/// An all-zero histogram (no orbit ever landed on the raster) comes out
/// all zero under either policy.
pub fn normalize(histogram: &[u64], policy: &Policy) -> Vec<u8> {
    let max = histogram.iter().cloned().max().unwrap_or(0);
    if max == 0 {
        return vec![0; histogram.len()];
    }
    let top = max as f64;
    let scale = |v: f64| (255.0 * v).min(255.0) as u8;
    match *policy {
        Policy::Additive => {
            let root = top.sqrt();
            histogram.iter().map(|&n| scale((n as f64).sqrt() / root)).collect()
        }
        Policy::Multiplicative(factor) => {
            let half_log = factor.ln() / 2.0;
            histogram
                .iter()
                .map(|&n| scale(((n as f64 - top) * half_log).exp()))
                .collect()
        }
    }
}

/// Normalizes every channel independently and lays them into a raster.
/// Output channels with no histogram behind them stay black.
pub fn to_raster(exposure: &Exposure, mode: ColorMode, policy: &Policy) -> Raster {
    let mut raster = Raster::new(exposure.width, exposure.height);
    if exposure.channels() == 0 {
        return raster;
    }
    match mode {
        ColorMode::Grayscale => {
            let gray = normalize(exposure.channel(0), policy);
            for (pixel, v) in raster.data.chunks_mut(3).zip(gray) {
                pixel.copy_from_slice(&[v, v, v]);
            }
        }
        ColorMode::FullColor => {
            for k in 0..exposure.channels().min(3) {
                let intensities = normalize(exposure.channel(k), policy);
                for (pixel, v) in raster.data.chunks_mut(3).zip(intensities) {
                    pixel[k] = v;
                }
            }
        }
    }
    raster
}
