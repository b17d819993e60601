// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The handful of things that can go wrong.  The renderers are closed
//! numeric pipelines, so almost every failure is a bad configuration
//! caught before any iteration happens, or a failure to write the
//! finished image.

use failure::Fail;

/// Every failure the library reports.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// A width, height, threshold, sample count or batch size that
    /// cannot describe a render.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfiguration(String),

    /// The image encoder refused the raster.
    #[fail(display = "could not encode image: {}", _0)]
    Image(String),

    /// The sink has no way to do what was asked.
    #[fail(display = "not supported: {}", _0)]
    Unsupported(String),

    /// A render thread died before finishing its share.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,

    /// The sink could not reach the file system.
    #[fail(display = "i/o failure: {}", _0)]
    Io(#[cause] std::io::Error),
}

impl RenderError {
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        RenderError::InvalidConfiguration(message.into())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => RenderError::Io(e),
            e => RenderError::Image(e.to_string()),
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
