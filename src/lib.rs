#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal renderer
//!
//! Two ways of looking at the same recurrence.  The escape-time picture
//! takes a point on the complex plane, repeatedly squares it and adds
//! the original point back, and colors the pixel by how many steps it
//! took to run off to infinity.  Points that never run away form the
//! black heart of the Mandelbrot set.
//!
//! The Buddhabrot looks at the orbits instead.  Each step of an
//! escaping point's iteration creates a new complex number that is
//! itself a coordinate on the plane.  By mapping that coordinate to the
//! nearest pixel and incrementing the pixel, we can plot the orbit of
//! every point that eventually leaves, and the accumulated density
//! forms the Buddhabrot.  Giving each color channel a different
//! iteration limit produces the Nebulabrot.
//!
//! Both the Mandelbrot recurrence `z^2 + c` and the Burning Ship
//! recurrence `(|Re z| + i|Im z|)^2 + c` are supported by either
//! renderer.

extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;

pub mod buddha;
pub mod config;
pub mod errors;
pub mod escape;
pub mod exposure;
pub mod iterate;
pub mod normalize;
pub mod observer;
pub mod palette;
pub mod planes;
pub mod raster;
pub mod sampler;

pub use buddha::BuddhabrotRenderer;
pub use config::{BuddhabrotConfig, EscapeConfig};
pub use errors::{RenderError, Result};
pub use escape::EscapeTimeRenderer;
pub use exposure::{Exposure, ExposureAccumulator, Policy};
pub use iterate::{Family, Status};
pub use normalize::{normalize, ColorMode};
pub use observer::{LogObserver, Observer, Silent};
pub use palette::{ColorMap, Gradient, Hls, Palette};
pub use planes::{Pixel, PlaneMapper, Window};
pub use raster::{FileSink, ImageSink, Raster};
pub use sampler::TrajectorySampler;
