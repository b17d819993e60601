//! Rejection sampling of trajectory seeds.  A Buddhabrot only plots the
//! orbits of points that escape, so seeds are drawn uniformly from a
//! fixed domain and thrown away until enough escaping ones are found.

use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::errors::{RenderError, Result};
use crate::iterate::Family;
use crate::planes::Window;

/// Draws seeds known to lie outside the set.
#[derive(Clone, Debug)]
pub struct TrajectorySampler {
    family: Family,
    domain: Window,
    re: Uniform<f64>,
    im: Uniform<f64>,
}

impl TrajectorySampler {
    /// Samples from the family's fixed sampling domain.
    pub fn new(family: Family) -> Self {
        let domain = family.sampling_domain();
        TrajectorySampler {
            family,
            domain,
            re: Uniform::new_inclusive(domain.real_min, domain.real_max),
            im: Uniform::new_inclusive(domain.imag_min, domain.imag_max),
        }
    }

    /// The rectangle seeds are drawn from.
    pub fn domain(&self) -> Window {
        self.domain
    }

    /// Collects exactly `count` seeds that escape within `threshold`
    /// steps.  Rejected draws are discarded, never nudged.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        count: usize,
        threshold: usize,
        rng: &mut R,
    ) -> Result<Vec<Complex<f64>>> {
        if threshold == 0 {
            return Err(RenderError::invalid(
                "sampling threshold must be positive, nothing escapes in zero steps",
            ));
        }
        let mut seeds = Vec::with_capacity(count);
        while seeds.len() < count {
            let c = Complex::new(self.re.sample(rng), self.im.sample(rng));
            if self.family.classify(c, threshold).escaped() {
                seeds.push(c);
            }
        }
        Ok(seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn collects_exactly_the_requested_count() {
        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        let mut rng = StdRng::seed_from_u64(7);
        for &count in &[0, 1, 17, 500] {
            assert_eq!(sampler.sample(count, 200, &mut rng).unwrap().len(), count);
        }
    }

    #[test]
    fn every_seed_escapes_and_lies_in_the_domain() {
        for family in &[Family::Mandelbrot, Family::BurningShip] {
            let sampler = TrajectorySampler::new(*family);
            let mut rng = StdRng::seed_from_u64(11);
            let seeds = sampler.sample(300, 500, &mut rng).unwrap();
            for c in seeds {
                let d = sampler.domain();
                assert!(c.re >= d.real_min && c.re <= d.real_max);
                assert!(c.im >= d.imag_min && c.im <= d.imag_max);
                assert!(family.classify(c, 500).escaped());
            }
        }
    }

    #[test]
    fn mandelbrot_domain_is_fixed() {
        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        assert_eq!(sampler.domain(), Window::new(-2.5, 1.0, -1.0, 1.0));
    }

    #[test]
    fn same_seed_same_samples() {
        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        let a = sampler.sample(100, 1000, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sampler.sample(100, 1000, &mut StdRng::seed_from_u64(42)).unwrap();
        let c = sampler.sample(100, 1000, &mut StdRng::seed_from_u64(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let sampler = TrajectorySampler::new(Family::Mandelbrot);
        assert!(sampler.sample(10, 0, &mut StdRng::seed_from_u64(1)).is_err());
    }
}
