//! The finished picture, and where it goes.

use std::path::Path;

use image::RgbImage;

use crate::errors::{RenderError, Result};

/// A `height` x `width` grid of RGB pixels stored row-major, three
/// bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Pixels per row.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl Raster {
    /// An all-black raster.
    pub fn new(width: usize, height: usize) -> Self {
        Raster {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    /// A raster where every pixel has the same color.
    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Raster {
            width,
            height,
            data,
        }
    }

    /// The color at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Iterates over the pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks(3).map(|p| [p[0], p[1], p[2]])
    }

    /// Copies into an `image` buffer.
    pub fn to_image(&self) -> Result<RgbImage> {
        let (w, h) = (self.width as u32, self.height as u32);
        RgbImage::from_raw(w, h, self.data.clone())
            .ok_or_else(|| RenderError::Image("raster does not match its dimensions".to_string()))
    }
}

/// Somewhere a finished raster can be sent.
pub trait ImageSink {
    /// Persist the raster under `path`.
    fn write(&self, raster: &Raster, path: &Path) -> Result<()>;

    /// Put the raster on screen.  No sink in this crate owns a display,
    /// so the default refuses with `Unsupported`.
    fn show(&self, _raster: &Raster) -> Result<()> {
        Err(RenderError::Unsupported("on-screen display".to_string()))
    }
}

/// Writes through the `image` crate, which picks the format from the
/// path's extension (`.png`, `.ppm`, `.jpg`, ...).
#[derive(Copy, Clone, Debug, Default)]
pub struct FileSink;

impl ImageSink for FileSink {
    fn write(&self, raster: &Raster, path: &Path) -> Result<()> {
        raster.to_image()?.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn filled_rasters_are_uniform() {
        let r = Raster::filled(3, 2, [1, 2, 3]);
        assert_eq!(r.data.len(), 18);
        assert!(r.pixels().all(|p| p == [1, 2, 3]));
    }

    #[test]
    fn get_reads_row_major() {
        let mut r = Raster::new(4, 3);
        r.data[(1 * 4 + 3) * 3..(1 * 4 + 3) * 3 + 3].copy_from_slice(&[9, 8, 7]);
        assert_eq!(r.get(3, 1), [9, 8, 7]);
        assert_eq!(r.get(1, 1), [0, 0, 0]);
        assert_eq!(r.pixels().filter(|p| *p != [0, 0, 0]).count(), 1);
    }

    #[test]
    fn converts_into_an_image() {
        let mut r = Raster::new(2, 2);
        r.data[3] = 255;
        let img = r.to_image().unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0]);
        assert_eq!(img.dimensions(), (2, 2));
    }

    #[test]
    fn file_sink_cannot_show() {
        match FileSink.show(&Raster::new(1, 1)) {
            Err(RenderError::Unsupported(_)) => (),
            other => panic!("expected Unsupported, got {:?}", other),
        }
    }

    #[test]
    fn file_sink_writes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        FileSink.write(&Raster::filled(5, 4, [10, 20, 30]), &path).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (5, 4));
        assert_eq!(back.get_pixel(4, 3).0, [10, 20, 30]);
    }

    #[test]
    fn file_sink_rejects_unknown_extensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.nonsense");
        assert!(FileSink.write(&Raster::new(2, 2), &path).is_err());
    }
}
