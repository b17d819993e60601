// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that plot where escaping points *go* rather than how fast they
//! leave.  Random seeds outside the set are drawn, each orbit is
//! replayed, and every pixel the orbit passes through gets brighter.
//!
//! The work is split into batches so that only one batch of seeds is
//! ever held in memory.  Within a batch each worker thread draws its own
//! share of seeds from its own random stream and exposes them into its
//! own partial histograms, so workers never contend.  The partials are
//! merged once, at the end.  Partials are visit counts, so the merge is
//! an exact sum and does not care about order or grouping.

use std::ops::ControlFlow;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::BuddhabrotConfig;
use crate::errors::{RenderError, Result};
use crate::exposure::{Exposure, ExposureAccumulator};
use crate::normalize::to_raster;
use crate::observer::Observer;
use crate::raster::Raster;
use crate::sampler::TrajectorySampler;

/// One thread's random stream and partial histograms.
struct Worker {
    rng: StdRng,
    exposure: Exposure,
}

impl Worker {
    fn expose(
        &mut self,
        sampler: &TrajectorySampler,
        accumulator: &ExposureAccumulator,
        share: usize,
        threshold: usize,
    ) -> Result<()> {
        let seeds = sampler.sample(share, threshold, &mut self.rng)?;
        accumulator.accumulate(&seeds, &mut self.exposure);
        Ok(())
    }
}

/// Splits `total` into `parts` shares differing by at most one.
fn shares(total: usize, parts: usize) -> Vec<usize> {
    let (base, extra) = (total / parts, total % parts);
    (0..parts).map(|i| base + if i < extra { 1 } else { 0 }).collect()
}

/// The sampling, exposure and normalization pipeline.
#[derive(Clone, Debug)]
pub struct BuddhabrotRenderer {
    config: BuddhabrotConfig,
    sampler: TrajectorySampler,
    accumulator: ExposureAccumulator,
}

impl BuddhabrotRenderer {
    /// Validates the configuration; nothing is sampled yet.
    pub fn new(config: BuddhabrotConfig) -> Result<Self> {
        config.validate()?;
        let sampler = TrajectorySampler::new(config.family);
        let accumulator =
            ExposureAccumulator::new(config.family, config.plane()?, config.thresholds.clone())?;
        Ok(BuddhabrotRenderer {
            config,
            sampler,
            accumulator,
        })
    }

    /// The configuration this renderer was built from.
    pub fn config(&self) -> &BuddhabrotConfig {
        &self.config
    }

    /// Runs every batch and returns the merged histograms.  If the
    /// observer breaks after a batch, the histograms gathered so far are
    /// returned instead.
    pub fn expose(&self, observer: &dyn Observer) -> Result<Exposure> {
        let config = &self.config;
        let batches = config.batches();
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut workers: Vec<Worker> = (0..config.threads)
            .map(|i| Worker {
                rng: StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                exposure: self.accumulator.histograms(),
            })
            .collect();
        let shares = shares(config.batch_size, config.threads);

        info!(
            samples = config.samples,
            batches,
            threads = config.threads,
            seed,
            "exposing"
        );
        for batch in 1..=batches {
            let sampler = &self.sampler;
            let accumulator = &self.accumulator;
            let threshold = config.sample_threshold;
            let outcome = crossbeam::scope(|spawner| {
                let handles: Vec<_> = workers
                    .iter_mut()
                    .zip(&shares)
                    .map(|(worker, &share)| {
                        spawner.spawn(move |_| worker.expose(sampler, accumulator, share, threshold))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked)?)
                    .collect::<Result<()>>()
            });
            outcome.map_err(|_| RenderError::WorkerPanicked)??;

            debug!(batch, batches, "batch exposed");
            if let ControlFlow::Break(()) = observer.batch_done(batch, batches) {
                info!(batch, batches, "stopped early");
                break;
            }
        }

        let mut workers = workers.into_iter();
        let mut merged = match workers.next() {
            Some(first) => first.exposure,
            None => self.accumulator.histograms(),
        };
        for worker in workers {
            merged.merge(&worker.exposure);
        }
        Ok(merged)
    }

    /// Exposes and normalizes in one go.
    pub fn render(&self, observer: &dyn Observer) -> Result<Raster> {
        let exposure = self.expose(observer)?;
        for k in 0..exposure.channels() {
            debug!(channel = k, max = exposure.max(k), "normalizing");
        }
        Ok(to_raster(&exposure, self.config.color_mode, &self.config.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::Policy;
    use crate::iterate::Family;
    use crate::normalize::ColorMode;
    use crate::observer::Silent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small(seed: u64) -> BuddhabrotConfig {
        BuddhabrotConfig {
            width: 35,
            height: 20,
            samples: 600,
            batch_size: 200,
            sample_threshold: 500,
            thresholds: vec![500, 50, 5],
            seed: Some(seed),
            ..BuddhabrotConfig::default()
        }
    }

    #[test]
    fn shares_cover_the_batch() {
        assert_eq!(shares(10, 3), vec![4, 3, 3]);
        assert_eq!(shares(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(shares(9, 1), vec![9]);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        for &threads in &[1, 3] {
            let config = BuddhabrotConfig { threads, ..small(99) };
            let a = BuddhabrotRenderer::new(config.clone()).unwrap().expose(&Silent).unwrap();
            let b = BuddhabrotRenderer::new(config).unwrap().expose(&Silent).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn single_thread_matches_a_manual_replay() {
        let config = small(5);
        let exposure = BuddhabrotRenderer::new(config.clone()).unwrap().expose(&Silent).unwrap();

        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        let accumulator =
            ExposureAccumulator::new(Family::Mandelbrot, config.plane().unwrap(), config.thresholds.clone())
                .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut expected = accumulator.histograms();
        for _ in 0..config.batches() {
            let seeds = sampler.sample(config.batch_size, 500, &mut rng).unwrap();
            accumulator.accumulate(&seeds, &mut expected);
        }
        assert_eq!(exposure, expected);
    }

    #[test]
    fn every_channel_receives_light() {
        let exposure = BuddhabrotRenderer::new(small(1)).unwrap().expose(&Silent).unwrap();
        assert_eq!(exposure.channels(), 3);
        for k in 0..3 {
            assert!(exposure.max(k) > 0);
        }
    }

    struct StopAfter(usize, AtomicUsize);

    impl Observer for StopAfter {
        fn batch_done(&self, batch: usize, _batches: usize) -> ControlFlow<()> {
            self.1.store(batch, Ordering::SeqCst);
            if batch >= self.0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    #[test]
    fn stopping_early_keeps_a_valid_snapshot() {
        let renderer = BuddhabrotRenderer::new(small(8)).unwrap();
        let stop = StopAfter(1, AtomicUsize::new(0));
        let partial = renderer.expose(&stop).unwrap();
        assert_eq!(stop.1.load(Ordering::SeqCst), 1);

        let full = renderer.expose(&Silent).unwrap();
        let partial_total = partial.total(0);
        let full_total = full.total(0);
        assert!(partial_total > 0);
        assert!(partial_total < full_total);
        for (p, f) in partial.channel(0).iter().zip(full.channel(0)) {
            assert!(p <= f);
        }
    }

    #[test]
    fn grayscale_render_is_gray() {
        let config = BuddhabrotConfig {
            color_mode: ColorMode::Grayscale,
            threads: 2,
            ..small(3)
        };
        let raster = BuddhabrotRenderer::new(config).unwrap().render(&Silent).unwrap();
        assert!(raster.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
        assert!(raster.pixels().any(|p| p[0] == 255));
    }

    #[test]
    fn policy_only_changes_the_normalization() {
        let additive = BuddhabrotConfig { threads: 2, ..small(4) };
        let multiplicative = BuddhabrotConfig {
            policy: Policy::Multiplicative(Policy::DEFAULT_FACTOR),
            ..additive.clone()
        };
        let counts = BuddhabrotRenderer::new(additive).unwrap().expose(&Silent).unwrap();
        let renderer = BuddhabrotRenderer::new(multiplicative).unwrap();
        assert_eq!(renderer.expose(&Silent).unwrap(), counts);
        let raster = renderer.render(&Silent).unwrap();
        assert_eq!(raster, to_raster(&counts, ColorMode::FullColor, &renderer.config().policy));
    }

    #[test]
    fn thread_partials_merge_to_the_single_pass() {
        // Two workers with seeds 30 and 31 draw exactly what two manual
        // streams would; merged, they must equal one pass over all seeds.
        let config = BuddhabrotConfig {
            samples: 200,
            batch_size: 200,
            threads: 2,
            policy: Policy::Multiplicative(Policy::DEFAULT_FACTOR),
            ..small(30)
        };
        let exposure = BuddhabrotRenderer::new(config.clone()).unwrap().expose(&Silent).unwrap();

        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        let accumulator =
            ExposureAccumulator::new(Family::Mandelbrot, config.plane().unwrap(), config.thresholds.clone())
                .unwrap();
        let mut seeds = sampler.sample(100, 500, &mut StdRng::seed_from_u64(30)).unwrap();
        seeds.extend(sampler.sample(100, 500, &mut StdRng::seed_from_u64(31)).unwrap());
        let mut expected = accumulator.histograms();
        accumulator.accumulate(&seeds, &mut expected);
        assert_eq!(exposure, expected);
    }

    #[test]
    fn burning_ship_buddhabrot_renders() {
        let config = BuddhabrotConfig {
            family: Family::BurningShip,
            window: Family::BurningShip.window(),
            ..small(12)
        };
        let exposure = BuddhabrotRenderer::new(config).unwrap().expose(&Silent).unwrap();
        assert!(exposure.max(0) > 0);
    }

    #[test]
    fn invalid_configs_fail_before_rendering() {
        let config = BuddhabrotConfig {
            samples: 1000,
            batch_size: 3,
            ..small(0)
        };
        assert!(BuddhabrotRenderer::new(config).is_err());
    }
}
