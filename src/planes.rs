//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangular window on the complex plane.  Maps points from
//! one to the other in both directions.
use num::Complex;

use crate::errors::{RenderError, Result};

/// A rectangular region of the complex plane.  The real part of a
/// complex number is treated as the x-component and the imaginary part
/// as the y-component; `imag_min` lands on row 0 of the raster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Window {
    /// Left edge.
    pub real_min: f64,
    /// Right edge.
    pub real_max: f64,
    /// Edge mapped onto row 0.
    pub imag_min: f64,
    /// Edge mapped past the last row.
    pub imag_max: f64,
}

impl Window {
    /// Builds a window from its two real and two imaginary bounds.
    pub const fn new(real_min: f64, real_max: f64, imag_min: f64, imag_max: f64) -> Self {
        Window {
            real_min,
            real_max,
            imag_min,
            imag_max,
        }
    }

    /// Builds a window from its left-lower and right-upper corners, the
    /// way the command line describes one.
    pub fn from_corners(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Self {
        Window::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im)
    }

    /// Fails unless both spans are finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.real_min < self.real_max) {
            return Err(RenderError::invalid(
                "the left lower corner is not to the left of the right upper corner",
            ));
        }
        if !(self.imag_min < self.imag_max) {
            return Err(RenderError::invalid(
                "the left lower corner is not lower than the right upper corner",
            ));
        }
        if !(self.real_max - self.real_min).is_finite() || !(self.imag_max - self.imag_min).is_finite() {
            return Err(RenderError::invalid("the window must have finite bounds"));
        }
        Ok(())
    }
}

/// Describes the x, y of a point in the raster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// Rescales `value` from the span `[left_min, left_max]` onto the span
/// `[right_min, right_max]`.
#[inline]
pub fn translate(value: f64, left_min: f64, left_max: f64, right_min: f64, right_max: f64) -> f64 {
    let scaled = (value - left_min) / (left_max - left_min);
    right_min + scaled * (right_max - right_min)
}

/// Contains the definitions of two planes: an integral cartesian plane
/// `width` by `height` pixels, and a window on the complex plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// Columns in the integral plane.
    pub width: usize,
    /// Rows in the integral plane.
    pub height: usize,
    /// The region of the complex plane stretched over the raster.
    pub window: Window,
}

impl PlaneMapper {
    /// Fails if the raster is empty or the window is degenerate.
    pub fn new(width: usize, height: usize, window: Window) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(RenderError::invalid(format!(
                "raster must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        window.validate()?;
        Ok(PlaneMapper {
            width,
            height,
            window,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Given a pixel on the integral plane, return the complex number
    /// at the center of that pixel.
    pub fn to_complex(&self, pixel: &Pixel) -> Complex<f64> {
        let w = &self.window;
        Complex::new(
            translate(pixel.0 as f64 + 0.5, 0.0, self.width as f64, w.real_min, w.real_max),
            translate(pixel.1 as f64 + 0.5, 0.0, self.height as f64, w.imag_min, w.imag_max),
        )
    }

    /// Given a complex number, find the pixel it falls in.  Points
    /// outside the window are routine for orbits and come back as
    /// `None`.
    pub fn to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let w = &self.window;
        let left = translate(point.re, w.real_min, w.real_max, 0.0, self.width as f64).floor();
        let top = translate(point.im, w.imag_min, w.imag_max, 0.0, self.height as f64).floor();
        // NaN fails both comparisons and is rejected with the rest.
        if !(left >= 0.0 && left < self.width as f64 && top >= 0.0 && top < self.height as f64) {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }

    /// The linear offset of a pixel in a row-major buffer.
    #[inline]
    pub fn offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.width + pixel.0
    }

    /// Maps an orbit point straight to its offset in a row-major
    /// buffer, or `None` when it misses the raster.
    #[inline]
    pub fn point_to_offset(&self, point: &Complex<f64>) -> Option<usize> {
        self.to_pixel(point).map(|p| self.offset(&p))
    }
}
