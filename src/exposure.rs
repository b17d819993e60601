// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Exposure: replaying trajectories onto per-channel histograms.
//!
//! Every value an escaping orbit visits before it leaves is itself a
//! point on the complex plane.  Map it back onto the raster and bump the
//! pixel it lands in.  Each channel has its own threshold, so a channel
//! with a short threshold only sees the first few steps of each orbit;
//! that is what gives the Nebulabrot its red/green/blue layering.
//!
//! Cells hold plain visit counts whatever the policy.  Counts merge by
//! integer addition, so how the seeds were split into batches or threads
//! cannot show up in the result.  The policy only decides how a count
//! becomes a brightness, see [`crate::normalize`].

use std::str::FromStr;

use num::Complex;

use crate::errors::{RenderError, Result};
use crate::iterate::Family;
use crate::planes::PlaneMapper;

/// How visits translate into brightness.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Policy {
    /// A cell visited `n` times is worth `n`.
    Additive,
    /// A cell visited `n` times is worth `factor^n` (factor > 1), which
    /// exaggerates the hottest pixels.
    Multiplicative(f64),
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Additive
    }
}

impl Policy {
    /// Factor used when `multiplicative` is given without one.
    pub const DEFAULT_FACTOR: f64 = 1.01;

    /// Fails for a multiplicative factor that is not finite and above 1.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Policy::Multiplicative(f) if !(f > 1.0 && f.is_finite()) => Err(RenderError::invalid(
                format!("multiplicative factor must be finite and greater than 1, got {}", f),
            )),
            _ => Ok(()),
        }
    }
}

impl FromStr for Policy {
    type Err = RenderError;

    /// `additive`, `multiplicative` or `multiplicative:FACTOR`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_lowercase();
        let mut parts = s.splitn(2, ':');
        let policy = match (parts.next(), parts.next()) {
            (Some("additive"), None) => Policy::Additive,
            (Some("multiplicative"), None) => Policy::Multiplicative(Policy::DEFAULT_FACTOR),
            (Some("multiplicative"), Some(factor)) => match factor.parse::<f64>() {
                Ok(f) => Policy::Multiplicative(f),
                Err(_) => {
                    return Err(RenderError::invalid(format!(
                        "could not parse multiplicative factor '{}'",
                        factor
                    )))
                }
            },
            _ => return Err(RenderError::invalid(format!("unknown accumulation policy '{}'", s))),
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// One row-major visit-count histogram per channel, all the size of
/// the raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exposure {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    channels: Vec<Vec<u64>>,
}

impl Exposure {
    /// `channels` empty histograms.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Exposure {
            width,
            height,
            channels: vec![vec![0; width * height]; channels],
        }
    }

    /// Wraps existing histograms.  Every channel must hold
    /// `width * height` cells.
    pub fn from_channels(width: usize, height: usize, channels: Vec<Vec<u64>>) -> Result<Self> {
        if let Some(bad) = channels.iter().find(|c| c.len() != width * height) {
            return Err(RenderError::invalid(format!(
                "channel holds {} cells, a {}x{} raster needs {}",
                bad.len(),
                width,
                height,
                width * height
            )));
        }
        Ok(Exposure {
            width,
            height,
            channels,
        })
    }

    /// How many histograms there are.
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// The cells of channel `k`, row-major.
    pub fn channel(&self, k: usize) -> &[u64] {
        &self.channels[k]
    }

    /// One cell.
    pub fn get(&self, k: usize, x: usize, y: usize) -> u64 {
        self.channels[k][y * self.width + x]
    }

    /// The largest count in channel `k`.
    pub fn max(&self, k: usize) -> u64 {
        self.channels[k].iter().cloned().max().unwrap_or(0)
    }

    /// The number of visits recorded in channel `k`.
    pub fn total(&self, k: usize) -> u64 {
        self.channels[k].iter().sum()
    }

    /// Folds another exposure of the same shape into this one.
    pub fn merge(&mut self, other: &Exposure) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        debug_assert_eq!(self.channels(), other.channels());
        for (mine, theirs) in self.channels.iter_mut().zip(&other.channels) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a = a.saturating_add(*b);
            }
        }
    }
}

/// Replays seeds and records where their orbits go.
#[derive(Clone, Debug)]
pub struct ExposureAccumulator {
    family: Family,
    plane: PlaneMapper,
    thresholds: Vec<usize>,
}

impl ExposureAccumulator {
    /// One channel per threshold.
    pub fn new(family: Family, plane: PlaneMapper, thresholds: Vec<usize>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(RenderError::invalid("at least one channel threshold is required"));
        }
        if thresholds.iter().any(|&t| t == 0) {
            return Err(RenderError::invalid("channel thresholds must be positive"));
        }
        Ok(ExposureAccumulator {
            family,
            plane,
            thresholds,
        })
    }

    /// The per-channel thresholds.
    pub fn thresholds(&self) -> &[usize] {
        &self.thresholds
    }

    /// Fresh histograms shaped for this accumulator.
    pub fn histograms(&self) -> Exposure {
        Exposure::new(self.plane.width, self.plane.height, self.thresholds.len())
    }

    /// Records every point of `trajectory` that lands on the raster in
    /// channel `k`.
    pub fn plot(&self, k: usize, trajectory: &[Complex<f64>], exposure: &mut Exposure) {
        let cells = &mut exposure.channels[k];
        for z in trajectory {
            if let Some(offset) = self.plane.point_to_offset(z) {
                cells[offset] = cells[offset].saturating_add(1);
            }
        }
    }

    /// Replays every seed from `z = 0`.  Each channel sees the orbit
    /// up to its own threshold or the escape, whichever comes first.
    pub fn accumulate(&self, seeds: &[Complex<f64>], exposure: &mut Exposure) {
        debug_assert_eq!(exposure.channels(), self.thresholds.len());
        let longest = self.thresholds.iter().cloned().max().unwrap_or(0);
        let mut trajectory = Vec::new();
        for &c in seeds {
            self.family.trace_into(c, longest, &mut trajectory);
            for (k, &threshold) in self.thresholds.iter().enumerate() {
                let end = threshold.min(trajectory.len());
                self.plot(k, &trajectory[..end], exposure);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::planes::Window;
    use crate::sampler::TrajectorySampler;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn accumulator(width: usize, height: usize, thresholds: Vec<usize>) -> ExposureAccumulator {
        let plane = PlaneMapper::new(width, height, Family::Mandelbrot.window()).unwrap();
        ExposureAccumulator::new(Family::Mandelbrot, plane, thresholds).unwrap()
    }

    fn seeds(count: usize, threshold: usize, seed: u64) -> Vec<Complex<f64>> {
        TrajectorySampler::new(Family::Mandelbrot)
            .sample(count, threshold, &mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn two_cell_trajectory_on_a_four_by_four_raster() {
        let plane = PlaneMapper::new(4, 4, Window::new(-2.0, 2.0, -2.0, 2.0)).unwrap();
        let acc = ExposureAccumulator::new(Family::Mandelbrot, plane, vec![10]).unwrap();
        let mut exposure = acc.histograms();
        acc.plot(0, &[Complex::new(-0.5, -0.5), Complex::new(-0.5, 0.5)], &mut exposure);
        for y in 0..4 {
            for x in 0..4 {
                let expected = if (x, y) == (1, 1) || (x, y) == (1, 2) { 1 } else { 0 };
                assert_eq!(exposure.get(0, x, y), expected);
            }
        }
        let intensities = normalize(exposure.channel(0), &Policy::Additive);
        assert_eq!(intensities[1 * 4 + 1], 255);
        assert_eq!(intensities[2 * 4 + 1], 255);
        assert_eq!(intensities.iter().filter(|&&v| v == 0).count(), 14);
    }

    #[test]
    fn off_raster_points_are_skipped() {
        let acc = accumulator(8, 8, vec![10]);
        let mut exposure = acc.histograms();
        acc.plot(0, &[Complex::new(5.0, 5.0), Complex::new(-3.0, 0.0), Complex::new(0.0, 0.0)], &mut exposure);
        assert_eq!(exposure.total(0), 1);
    }

    #[test]
    fn totals_match_in_window_visits() {
        let acc = accumulator(35, 20, vec![300]);
        let seeds = seeds(50, 300, 5);
        let mut exposure = acc.histograms();
        acc.accumulate(&seeds, &mut exposure);
        let plane = PlaneMapper::new(35, 20, Family::Mandelbrot.window()).unwrap();
        let expected: usize = seeds
            .iter()
            .map(|&c| {
                let (trajectory, _) = Family::Mandelbrot.trace(c, 300);
                trajectory.iter().filter(|z| plane.to_pixel(z).is_some()).count()
            })
            .sum();
        assert_eq!(exposure.total(0), expected as u64);
    }

    #[test]
    fn shorter_thresholds_see_a_prefix_of_the_orbit() {
        let acc = accumulator(40, 40, vec![1000, 3, 1]);
        let mut exposure = acc.histograms();
        acc.accumulate(&seeds(200, 1000, 9), &mut exposure);
        assert!(exposure.total(0) >= exposure.total(1));
        assert!(exposure.total(1) >= exposure.total(2));
        assert!(exposure.total(2) <= 200);
        for (a, b) in exposure.channel(0).iter().zip(exposure.channel(1)) {
            assert!(a >= b);
        }
    }

    #[test]
    fn batches_do_not_change_the_result() {
        let acc = accumulator(30, 20, vec![500, 50, 5]);
        let all = seeds(240, 500, 21);

        let mut whole = acc.histograms();
        acc.accumulate(&all, &mut whole);

        let mut first = acc.histograms();
        let mut second = acc.histograms();
        acc.accumulate(&all[..120], &mut first);
        acc.accumulate(&all[120..], &mut second);
        first.merge(&second);

        assert_eq!(whole, first);
        for policy in &[Policy::Additive, Policy::Multiplicative(Policy::DEFAULT_FACTOR)] {
            for k in 0..3 {
                assert_eq!(normalize(whole.channel(k), policy), normalize(first.channel(k), policy));
            }
        }
    }

    #[test]
    fn merging_is_order_independent() {
        let acc = accumulator(30, 20, vec![200]);
        let parts: Vec<Exposure> = (0..3)
            .map(|seed| {
                let mut exposure = acc.histograms();
                acc.accumulate(&seeds(40, 200, seed), &mut exposure);
                exposure
            })
            .collect();
        let mut forward = acc.histograms();
        for part in &parts {
            forward.merge(part);
        }
        let mut backward = acc.histograms();
        for part in parts.iter().rev() {
            backward.merge(part);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn histograms_only_grow() {
        let acc = accumulator(30, 20, vec![200]);
        let mut exposure = acc.histograms();
        let mut previous = exposure.clone();
        for batch in 0..4 {
            acc.accumulate(&seeds(30, 200, batch), &mut exposure);
            for (now, before) in exposure.channel(0).iter().zip(previous.channel(0)) {
                assert!(now >= before);
            }
            previous = exposure.clone();
        }
    }

    #[test]
    fn repeat_visits_count_up() {
        let acc = accumulator(4, 4, vec![10]);
        let mut exposure = acc.histograms();
        assert!(exposure.channel(0).iter().all(|&v| v == 0));
        acc.plot(0, &[Complex::new(0.0, 0.0), Complex::new(0.0, 0.0)], &mut exposure);
        assert_eq!(exposure.max(0), 2);
        assert_eq!(exposure.total(0), 2);
    }

    #[test]
    fn from_channels_checks_shape() {
        assert!(Exposure::from_channels(2, 2, vec![vec![0; 4], vec![0; 3]]).is_err());
        let e = Exposure::from_channels(2, 2, vec![vec![1, 2, 3, 4]]).unwrap();
        assert_eq!(e.get(0, 1, 1), 4);
        assert_eq!(e.max(0), 4);
    }

    #[test]
    fn rejects_bad_channels() {
        let plane = PlaneMapper::new(4, 4, Family::Mandelbrot.window()).unwrap();
        assert!(ExposureAccumulator::new(Family::Mandelbrot, plane, vec![]).is_err());
        assert!(ExposureAccumulator::new(Family::Mandelbrot, plane, vec![5, 0]).is_err());
    }

    #[test]
    fn policies_parse() {
        assert_eq!("additive".parse::<Policy>().unwrap(), Policy::Additive);
        assert_eq!(
            "multiplicative".parse::<Policy>().unwrap(),
            Policy::Multiplicative(Policy::DEFAULT_FACTOR)
        );
        assert_eq!("Multiplicative:1.5".parse::<Policy>().unwrap(), Policy::Multiplicative(1.5));
        assert!("multiplicative:1".parse::<Policy>().is_err());
        assert!("multiplicative:abc".parse::<Policy>().is_err());
        assert!("linear".parse::<Policy>().is_err());
        assert!(Policy::Multiplicative(0.5).validate().is_err());
    }
}
