// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The classic escape-time picture.
//!
//! Every pixel is mapped to a point `c`, iterated until it escapes or
//! hits the cap, and the step it escaped at is recorded.  Coloring those
//! counts directly wastes most of the palette on the thin band of
//! pixels nearest the boundary, so the counts are histogram-equalized
//! first: a pixel's hue is the fraction of escaping pixels that escaped
//! strictly sooner than it did.

use std::sync::atomic::{AtomicUsize, Ordering};

use itertools::iproduct;
use tracing::debug;

use crate::config::EscapeConfig;
use crate::errors::{RenderError, Result};
use crate::observer::Observer;
use crate::palette::{to_rgb8, ColorMap};
use crate::planes::{Pixel, PlaneMapper};
use crate::raster::Raster;

/// Renders one escape-time image per call.
#[derive(Clone, Debug)]
pub struct EscapeTimeRenderer {
    config: EscapeConfig,
    plane: PlaneMapper,
}

impl EscapeTimeRenderer {
    /// Validates the configuration; nothing is iterated yet.
    pub fn new(config: EscapeConfig) -> Result<Self> {
        config.validate()?;
        let plane = config.plane()?;
        Ok(EscapeTimeRenderer { config, plane })
    }

    /// The configuration this renderer was built from.
    pub fn config(&self) -> &EscapeConfig {
        &self.config
    }

    /// The escape step of every pixel, row-major, with `cap` standing in
    /// for pixels that never escaped.  Rows are split into one band per
    /// thread; each band writes only its own slice.
    pub fn iteration_counts(&self, observer: &dyn Observer) -> Result<Vec<usize>> {
        let EscapeConfig {
            width,
            height,
            family,
            cap,
            threads,
            ..
        } = self.config;
        let plane = self.plane;
        let band_rows = (height + threads - 1) / threads;
        let mut counts = vec![0; plane.len()];
        let finished = AtomicUsize::new(0);

        debug!(width, height, cap, threads, family = family.name(), "iterating");
        {
            let finished = &finished;
            crossbeam::scope(|spawner| {
                for (band, cells) in counts.chunks_mut(band_rows * width).enumerate() {
                    spawner.spawn(move |_| {
                        let top = band * band_rows;
                        let rows = cells.len() / width;
                        for (y, x) in iproduct!(0..rows, 0..width) {
                            let c = plane.to_complex(&Pixel(x, top + y));
                            cells[y * width + x] = family.classify(c, cap).iterations(cap);
                        }
                        let done = finished.fetch_add(rows, Ordering::SeqCst) + rows;
                        observer.rows_done(done, height);
                    });
                }
            })
            .map_err(|_| RenderError::WorkerPanicked)?;
        }
        Ok(counts)
    }

    /// Iterates every pixel and colors the result through `map`.
    pub fn render<M: ColorMap + ?Sized>(&self, map: &M, observer: &dyn Observer) -> Result<Raster> {
        let counts = self.iteration_counts(observer)?;
        Ok(colorize(
            &counts,
            self.config.width,
            self.config.height,
            self.config.cap,
            map,
            self.config.sentinel,
        ))
    }
}

/// How many pixels escaped at each step `0..cap`.  Pixels at `cap`
/// never escaped and are not counted.
pub fn escape_histogram(counts: &[usize], cap: usize) -> Vec<usize> {
    let mut histogram = vec![0; cap];
    for &n in counts {
        if n < cap {
            histogram[n] += 1;
        }
    }
    histogram
}

/// The equalized hue for each escape step: the share of escaping
/// pixels that escaped strictly earlier.  `None` when nothing escaped,
/// since there is nothing to equalize.
pub fn equalize(counts: &[usize], cap: usize) -> Option<Vec<f64>> {
    let histogram = escape_histogram(counts, cap);
    let total: usize = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let mut hues = Vec::with_capacity(cap);
    let mut below = 0;
    for bucket in histogram {
        hues.push(below as f64 / total as f64);
        below += bucket;
    }
    Some(hues)
}

/// Colors an iteration-count field.  Pixels that never escaped get the
/// sentinel, everything else goes through the color map.
pub fn colorize<M: ColorMap + ?Sized>(
    counts: &[usize],
    width: usize,
    height: usize,
    cap: usize,
    map: &M,
    sentinel: [u8; 3],
) -> Raster {
    let hues = match equalize(counts, cap) {
        Some(hues) => hues,
        None => {
            debug!("no pixel escaped, skipping equalization");
            return Raster::filled(width, height, sentinel);
        }
    };
    let mut raster = Raster::new(width, height);
    for (pixel, &n) in raster.data.chunks_mut(3).zip(counts) {
        let color = if n < cap {
            to_rgb8(map.lookup(hues[n]))
        } else {
            sentinel
        };
        pixel.copy_from_slice(&color);
    }
    raster
}
