// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The iteration driver shared by every renderer.
//!
//! An escape-time fractal is defined by a recurrence `z -> f(z, c)`
//! started at `z = 0`, and a predicate saying when `z` has wandered far
//! enough that it will never come back.  Each family supplies those two
//! pieces (and, optionally, a closed-form test for points known to be
//! inside the set) through the `Recurrence` trait; the loop that runs
//! them, including the periodicity check, lives here once.

use std::str::FromStr;

use num::Complex;

use crate::errors::RenderError;
use crate::planes::Window;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// Mandelbrot orbits are abandoned once either component passes this.
pub const BAILOUT: f64 = 2.0;

/// Burning-Ship orbits are abandoned once `|z|^2` reaches this.
pub const SHIP_BAILOUT_SQR: f64 = 10.0;

/// What became of a point after iterating it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// Left the bailout region at this (zero-based) step.
    Escaped(usize),
    /// Stayed put for the whole threshold, or provably never leaves.
    Bounded,
}

impl Status {
    /// True for `Escaped`.
    pub fn escaped(&self) -> bool {
        match *self {
            Status::Escaped(_) => true,
            Status::Bounded => false,
        }
    }

    /// The escape step, or `cap` for points that never escaped.
    pub fn iterations(&self, cap: usize) -> usize {
        match *self {
            Status::Escaped(n) => n,
            Status::Bounded => cap,
        }
    }
}

/// One family of escape-time fractals.
pub trait Recurrence {
    /// Advance the orbit one step.
    fn step(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64>;

    /// Whether `z` has left the region the orbit can return from.
    fn escaped(&self, z: &Complex<f64>) -> bool;

    /// A closed-form test for points that never escape.  Must never
    /// claim a point that would escape; the default claims nothing.
    fn interior(&self, _c: &Complex<f64>) -> bool {
        false
    }
}

/// `z^2 + c`, with the main cardioid and the period-2 bulb as known
/// interior.
#[derive(Copy, Clone, Debug, Default)]
pub struct Mandelbrot;

/// `(|Re z| + i|Im z|)^2 + c`.  No closed-form interior is known.
#[derive(Copy, Clone, Debug, Default)]
pub struct BurningShip;

/// The main cardioid: `Re(c) <= p - 2p^2 + 1/4` with `p = |c - 1/4|`.
#[inline]
pub fn in_cardioid(c: &Complex<f64>) -> bool {
    let p = ((c.re - D4) * (c.re - D4) + c.im * c.im).sqrt();
    c.re <= p - 2.0 * p * p + D4
}

/// The period-2 bulb, the disc of radius 1/4 around -1.
#[inline]
pub fn in_period2_bulb(c: &Complex<f64>) -> bool {
    (c.re + 1.0) * (c.re + 1.0) + c.im * c.im <= D16
}

impl Recurrence for Mandelbrot {
    #[inline]
    fn step(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        z * z + c
    }

    #[inline]
    fn escaped(&self, z: &Complex<f64>) -> bool {
        z.re.abs() > BAILOUT || z.im.abs() > BAILOUT
    }

    #[inline]
    fn interior(&self, c: &Complex<f64>) -> bool {
        in_cardioid(c) || in_period2_bulb(c)
    }
}

impl Recurrence for BurningShip {
    #[inline]
    fn step(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        let folded = Complex::new(z.re.abs(), z.im.abs());
        folded * folded + c
    }

    #[inline]
    fn escaped(&self, z: &Complex<f64>) -> bool {
        !(z.norm_sqr() < SHIP_BAILOUT_SQR)
    }
}

/// Runs the orbit of `c` for at most `threshold` steps, handing every
/// value that has not escaped to `visit`.
///
/// A checkpoint of `z` is taken whenever the step index is a power of
/// two and every later value is compared against it; an exact repeat
/// means the orbit is cycling and can stop as `Bounded`.  Exact float
/// equality only happens on a true cycle, so this never misclassifies.
pub fn orbit<R, F>(family: &R, c: Complex<f64>, threshold: usize, mut visit: F) -> Status
where
    R: Recurrence + ?Sized,
    F: FnMut(Complex<f64>),
{
    let mut z = Complex::new(0.0, 0.0);
    let mut checkpoint = z;
    for i in 0..threshold {
        z = family.step(z, c);
        if family.escaped(&z) {
            return Status::Escaped(i);
        }
        visit(z);
        if z == checkpoint {
            return Status::Bounded;
        }
        if i.is_power_of_two() {
            checkpoint = z;
        }
    }
    Status::Bounded
}

/// Membership test with the interior shortcut.
pub fn classify<R: Recurrence + ?Sized>(family: &R, c: Complex<f64>, threshold: usize) -> Status {
    if family.interior(&c) {
        return Status::Bounded;
    }
    orbit(family, c, threshold, |_| ())
}

/// Membership test that always iterates.
pub fn classify_exhaustive<R: Recurrence + ?Sized>(
    family: &R,
    c: Complex<f64>,
    threshold: usize,
) -> Status {
    orbit(family, c, threshold, |_| ())
}

/// Replaces the contents of `trajectory` with the orbit of `c`, up to
/// but not including the escaping value.
pub fn trace_into<R: Recurrence + ?Sized>(
    family: &R,
    c: Complex<f64>,
    threshold: usize,
    trajectory: &mut Vec<Complex<f64>>,
) -> Status {
    trajectory.clear();
    orbit(family, c, threshold, |z| trajectory.push(z))
}

/// The orbit of `c` together with how it ended.
pub fn trace<R: Recurrence + ?Sized>(
    family: &R,
    c: Complex<f64>,
    threshold: usize,
) -> (Vec<Complex<f64>>, Status) {
    let mut trajectory = Vec::new();
    let status = trace_into(family, c, threshold, &mut trajectory);
    (trajectory, status)
}

/// Selects a family by name.  Each call dispatches once to the
/// monomorphised driver so the inner loop never matches on the tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Family {
    /// `z^2 + c`
    Mandelbrot,
    /// `(|Re z| + i|Im z|)^2 + c`
    BurningShip,
}

macro_rules! dispatch {
    ($family: expr, $f: ident ( $($arg: expr),* )) => {
        match $family {
            Family::Mandelbrot => $f(&Mandelbrot, $($arg),*),
            Family::BurningShip => $f(&BurningShip, $($arg),*),
        }
    };
}

impl Family {
    /// See [`classify`].
    pub fn classify(self, c: Complex<f64>, threshold: usize) -> Status {
        dispatch!(self, classify(c, threshold))
    }

    /// See [`classify_exhaustive`].
    pub fn classify_exhaustive(self, c: Complex<f64>, threshold: usize) -> Status {
        dispatch!(self, classify_exhaustive(c, threshold))
    }

    /// See [`trace`].
    pub fn trace(self, c: Complex<f64>, threshold: usize) -> (Vec<Complex<f64>>, Status) {
        dispatch!(self, trace(c, threshold))
    }

    /// See [`trace_into`].
    pub fn trace_into(
        self,
        c: Complex<f64>,
        threshold: usize,
        trajectory: &mut Vec<Complex<f64>>,
    ) -> Status {
        dispatch!(self, trace_into(c, threshold, trajectory))
    }

    /// The usual framing of the whole set.
    pub fn window(self) -> Window {
        match self {
            Family::Mandelbrot => Window::new(-2.5, 1.0, -1.0, 1.0),
            Family::BurningShip => Window::new(-2.5, 1.5, -2.0, 1.0),
        }
    }

    /// Where trajectory seeds are drawn from.  Fixed per family and
    /// independent of whatever window ends up on screen.
    pub fn sampling_domain(self) -> Window {
        self.window()
    }

    /// The name accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Family::Mandelbrot => "mandelbrot",
            Family::BurningShip => "burning-ship",
        }
    }
}

impl FromStr for Family {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mandelbrot" => Ok(Family::Mandelbrot),
            "burning-ship" | "burningship" | "ship" => Ok(Family::BurningShip),
            other => Err(RenderError::invalid(format!("unknown fractal family '{}'", other))),
        }
    }
}
