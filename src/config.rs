//! Immutable descriptions of a render.  Every renderer takes one of
//! these by value, validates it up front, and never changes it.

use crate::errors::{RenderError, Result};
use crate::exposure::Policy;
use crate::iterate::Family;
use crate::normalize::ColorMode;
use crate::planes::{PlaneMapper, Window};

/// Everything an escape-time render needs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscapeConfig {
    /// Raster columns.
    pub width: usize,
    /// Raster rows.
    pub height: usize,
    /// Which recurrence to iterate.
    pub family: Family,
    /// The part of the plane on screen.
    pub window: Window,
    /// Iteration cap.  Zero is allowed and leaves every pixel bounded.
    pub cap: usize,
    /// Worker threads.
    pub threads: usize,
    /// Color for pixels that never escape.
    pub sentinel: [u8; 3],
}

impl EscapeConfig {
    /// The family's canonical window, a cap of 1000, one thread, and
    /// black for the set itself.
    pub fn new(width: usize, height: usize, family: Family) -> Self {
        EscapeConfig {
            width,
            height,
            family,
            window: family.window(),
            cap: 1000,
            threads: 1,
            sentinel: [0, 0, 0],
        }
    }

    /// Fails on an empty raster, a degenerate window or no threads.
    pub fn validate(&self) -> Result<()> {
        PlaneMapper::new(self.width, self.height, self.window)?;
        if self.threads == 0 {
            return Err(RenderError::invalid("thread count must be positive"));
        }
        Ok(())
    }

    /// The mapping between this raster and its window.
    pub fn plane(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(self.width, self.height, self.window)
    }
}

/// Everything a Buddhabrot render needs.
#[derive(Clone, Debug, PartialEq)]
pub struct BuddhabrotConfig {
    /// Raster columns.
    pub width: usize,
    /// Raster rows.
    pub height: usize,
    /// Which recurrence to iterate.
    pub family: Family,
    /// The part of the plane orbits are projected onto.  Seeds are
    /// always drawn from the family's sampling domain.
    pub window: Window,
    /// Total seeds to expose.
    pub samples: usize,
    /// Seeds generated and exposed per batch.  Must divide `samples`.
    pub batch_size: usize,
    /// A seed is accepted if it escapes within this many steps.
    pub sample_threshold: usize,
    /// One channel per entry, each bounding how far its orbits run.
    pub thresholds: Vec<usize>,
    /// How visits are counted.
    pub policy: Policy,
    /// How channels become colors.
    pub color_mode: ColorMode,
    /// Fixes the random stream.  `None` draws a seed from entropy.
    pub seed: Option<u64>,
    /// Worker threads.
    pub threads: usize,
}

impl Default for BuddhabrotConfig {
    fn default() -> Self {
        let family = Family::Mandelbrot;
        BuddhabrotConfig {
            width: 700,
            height: 400,
            family,
            window: family.sampling_domain(),
            samples: 100_000,
            batch_size: 10_000,
            sample_threshold: 5000,
            thresholds: vec![5000, 500, 50],
            policy: Policy::Additive,
            color_mode: ColorMode::FullColor,
            seed: None,
            threads: 1,
        }
    }
}

impl BuddhabrotConfig {
    /// How many batches the samples are split into.
    pub fn batches(&self) -> usize {
        if self.batch_size == 0 {
            0
        } else {
            self.samples / self.batch_size
        }
    }

    /// Checks every field before any iteration happens.
    pub fn validate(&self) -> Result<()> {
        PlaneMapper::new(self.width, self.height, self.window)?;
        if self.samples == 0 {
            return Err(RenderError::invalid("sample count must be positive"));
        }
        if self.batch_size == 0 {
            return Err(RenderError::invalid("batch size must be positive"));
        }
        if self.samples % self.batch_size != 0 {
            return Err(RenderError::invalid(format!(
                "batch size {} does not divide the sample count {}",
                self.batch_size, self.samples
            )));
        }
        if self.sample_threshold == 0 {
            return Err(RenderError::invalid("sampling threshold must be positive"));
        }
        if self.thresholds.is_empty() || self.thresholds.len() > 3 {
            return Err(RenderError::invalid(format!(
                "between one and three channel thresholds are required, got {}",
                self.thresholds.len()
            )));
        }
        if self.thresholds.iter().any(|&t| t == 0) {
            return Err(RenderError::invalid("channel thresholds must be positive"));
        }
        if self.threads == 0 {
            return Err(RenderError::invalid("thread count must be positive"));
        }
        self.policy.validate()
    }

    /// The mapping between this raster and its window.
    pub fn plane(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(self.width, self.height, self.window)
    }
}
