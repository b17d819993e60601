//! Continuous color maps for the escape-time renderer.  A map takes a
//! position in `[0, 1]` and hands back an RGB triple in `[0, 1]^3`.

use std::str::FromStr;

use num::clamp;

use crate::errors::RenderError;

/// Anything that can turn an equalized hue into a color.
pub trait ColorMap: Sync {
    /// `t` is in `[0, 1]`; so is each returned component.
    fn lookup(&self, t: f64) -> (f64, f64, f64);
}

impl<F> ColorMap for F
where
    F: Fn(f64) -> (f64, f64, f64) + Sync,
{
    fn lookup(&self, t: f64) -> (f64, f64, f64) {
        self(t)
    }
}

/// A walk around the hue circle at fixed lightness and saturation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hls {
    /// Hue at `t = 0`, in turns.
    pub start: f64,
    /// Lightness, `0..=1`.
    pub lightness: f64,
    /// Saturation, `0..=1`.
    pub saturation: f64,
}

impl Default for Hls {
    fn default() -> Self {
        Hls {
            start: 0.01,
            lightness: 0.6,
            saturation: 0.65,
        }
    }
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

impl ColorMap for Hls {
    fn lookup(&self, t: f64) -> (f64, f64, f64) {
        let (l, s) = (self.lightness, self.saturation);
        let h = self.start + clamp(t, 0.0, 1.0);
        if s == 0.0 {
            return (l, l, l);
        }
        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;
        (
            hue_channel(m1, m2, h + 1.0 / 3.0),
            hue_channel(m1, m2, h),
            hue_channel(m1, m2, h - 1.0 / 3.0),
        )
    }
}

/// Piecewise-linear interpolation between evenly spaced stops.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, f64, f64)>,
}

impl Gradient {
    /// Needs at least one stop.
    pub fn new(stops: Vec<(f64, f64, f64)>) -> Result<Self, RenderError> {
        if stops.is_empty() {
            return Err(RenderError::invalid("a gradient needs at least one stop"));
        }
        Ok(Gradient { stops })
    }

    /// Black through purple and orange to pale yellow.
    pub fn inferno() -> Self {
        Gradient {
            stops: vec![
                (0.001, 0.000, 0.014),
                (0.258, 0.039, 0.406),
                (0.578, 0.148, 0.404),
                (0.865, 0.317, 0.226),
                (0.988, 0.645, 0.040),
                (0.988, 0.998, 0.645),
            ],
        }
    }

    /// Black, red, yellow, white.
    pub fn fire() -> Self {
        Gradient {
            stops: vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (1.0, 1.0, 1.0)],
        }
    }

    /// Black, blue, cyan, white.
    pub fn ocean() -> Self {
        Gradient {
            stops: vec![(0.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, 1.0, 1.0), (1.0, 1.0, 1.0)],
        }
    }
}

impl ColorMap for Gradient {
    fn lookup(&self, t: f64) -> (f64, f64, f64) {
        let last = self.stops.len() - 1;
        if last == 0 {
            return self.stops[0];
        }
        let scaled = clamp(t, 0.0, 1.0) * last as f64;
        let idx = (scaled as usize).min(last - 1);
        let frac = scaled - idx as f64;
        let (r1, g1, b1) = self.stops[idx];
        let (r2, g2, b2) = self.stops[idx + 1];
        (r1 + (r2 - r1) * frac, g1 + (g2 - g1) * frac, b1 + (b2 - b1) * frac)
    }
}

/// The maps reachable by name from the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum Palette {
    /// See [`Hls`].
    Hls(Hls),
    /// See [`Gradient`].
    Gradient(Gradient),
}

impl ColorMap for Palette {
    fn lookup(&self, t: f64) -> (f64, f64, f64) {
        match self {
            Palette::Hls(m) => m.lookup(t),
            Palette::Gradient(m) => m.lookup(t),
        }
    }
}

impl FromStr for Palette {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hls" => Ok(Palette::Hls(Hls::default())),
            "inferno" => Ok(Palette::Gradient(Gradient::inferno())),
            "fire" => Ok(Palette::Gradient(Gradient::fire())),
            "ocean" => Ok(Palette::Gradient(Gradient::ocean())),
            other => Err(RenderError::invalid(format!("unknown palette '{}'", other))),
        }
    }
}

/// Scales a `[0, 1]` color onto bytes.
pub fn to_rgb8(color: (f64, f64, f64)) -> [u8; 3] {
    let scale = |v: f64| clamp(v * 255.0, 0.0, 255.0) as u8;
    [scale(color.0), scale(color.1), scale(color.2)]
}
