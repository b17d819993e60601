// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate num;
extern crate num_cpus;
extern crate orbits;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use num::Complex;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orbits::{
    BuddhabrotConfig, BuddhabrotRenderer, ColorMode, EscapeConfig, EscapeTimeRenderer, Family,
    FileSink, ImageSink, LogObserver, Palette, Policy, Raster, RenderError, Window,
};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn parse_list<T: FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',').map(|v| T::from_str(v.trim()).ok()).collect()
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_parse<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    match T::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

const MANDELBROT: &str = "mandelbrot";
const BURNING_SHIP: &str = "burning-ship";
const BUDDHABROT: &str = "buddhabrot";

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const WHITE: &str = "white";
const SAMPLES: &str = "samples";
const BATCHES: &str = "batches";
const THRESHOLDS: &str = "thresholds";
const SAMPLE_THRESHOLD: &str = "sample-threshold";
const POLICY: &str = "policy";
const GRAYSCALE: &str = "grayscale";
const SEED: &str = "seed";
const FAMILY: &str = "family";

/// Arguments every subcommand takes.
fn common<'a, 'b>(app: App<'a, 'b>, size: &'a str) -> App<'a, 'b> {
    let max_threads = num_cpus::get();
    app.arg(
        Arg::with_name(OUTPUT)
            .required(true)
            .long(OUTPUT)
            .short("o")
            .takes_value(true)
            .help("Output file; the extension picks the format"),
    )
    .arg(
        Arg::with_name(SIZE)
            .required(false)
            .long(SIZE)
            .short("s")
            .takes_value(true)
            .default_value(size)
            .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
            .help("Size of output image"),
    )
    .arg(
        Arg::with_name(LEFTLOWER)
            .required(false)
            .long(LEFTLOWER)
            .short("l")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
            .help("Left lower corner of the window, defaults to the family's usual framing"),
    )
    .arg(
        Arg::with_name(RIGHTUPPER)
            .required(false)
            .long(RIGHTUPPER)
            .short("r")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
            .help("Right upper corner of the window, defaults to the family's usual framing"),
    )
    .arg(
        Arg::with_name(THREADS)
            .required(false)
            .long(THREADS)
            .short("t")
            .takes_value(true)
            .validator(move |s| {
                validate_range(
                    &s,
                    1,
                    max_threads,
                    "Could not parse thread count",
                    &format!("Thread count must be between 1 and {}", max_threads),
                )
            })
            .help("Number of threads to use in solver, defaults to every core"),
    )
}

fn escape_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    common(app, "800x600")
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 0 and 200000",
                    )
                })
                .help("Iteration cap per pixel"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .default_value("hls")
                .possible_values(&["hls", "inferno", "fire", "ocean"])
                .help("Color map for escaping pixels"),
        )
        .arg(
            Arg::with_name(WHITE)
                .long(WHITE)
                .help("Paint the set itself white instead of black"),
        )
}

fn buddha_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    common(app, "700x400")
        .arg(
            Arg::with_name(FAMILY)
                .required(false)
                .long(FAMILY)
                .short("f")
                .takes_value(true)
                .default_value(MANDELBROT)
                .possible_values(&[MANDELBROT, BURNING_SHIP])
                .help("Recurrence whose orbits are plotted"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .required(false)
                .long(SAMPLES)
                .short("n")
                .takes_value(true)
                .default_value("100000")
                .validator(|s| validate_parse::<usize>(&s, "Could not parse sample count"))
                .help("Number of escaping seeds to expose"),
        )
        .arg(
            Arg::with_name(BATCHES)
                .required(false)
                .long(BATCHES)
                .short("b")
                .takes_value(true)
                .default_value("10")
                .validator(|s| validate_parse::<usize>(&s, "Could not parse batch count"))
                .help("Number of batches; must divide the sample count"),
        )
        .arg(
            Arg::with_name(THRESHOLDS)
                .required(false)
                .long(THRESHOLDS)
                .takes_value(true)
                .default_value("5000,500,50")
                .validator(|s| match parse_list::<usize>(&s) {
                    Some(_) => Ok(()),
                    None => Err("Could not parse channel thresholds".to_string()),
                })
                .help("Per-channel iteration thresholds, red first"),
        )
        .arg(
            Arg::with_name(SAMPLE_THRESHOLD)
                .required(false)
                .long(SAMPLE_THRESHOLD)
                .takes_value(true)
                .validator(|s| validate_parse::<usize>(&s, "Could not parse sampling threshold"))
                .help("Seeds must escape within this many steps, defaults to the largest channel threshold"),
        )
        .arg(
            Arg::with_name(POLICY)
                .required(false)
                .long(POLICY)
                .takes_value(true)
                .default_value("additive")
                .validator(|s| match Policy::from_str(&s) {
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.to_string()),
                })
                .help("additive, or multiplicative[:FACTOR]"),
        )
        .arg(
            Arg::with_name(GRAYSCALE)
                .long(GRAYSCALE)
                .short("g")
                .help("Render the first channel only, in gray"),
        )
        .arg(
            Arg::with_name(SEED)
                .required(false)
                .long(SEED)
                .takes_value(true)
                .validator(|s| validate_parse::<u64>(&s, "Could not parse random seed"))
                .help("Fix the random stream for a reproducible image"),
        )
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("orbits")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time and Buddhabrot fractal renderer")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(escape_args(
            SubCommand::with_name(MANDELBROT).about("Histogram-equalized Mandelbrot set"),
        ))
        .subcommand(escape_args(
            SubCommand::with_name(BURNING_SHIP).about("Histogram-equalized Burning Ship"),
        ))
        .subcommand(buddha_args(
            SubCommand::with_name(BUDDHABROT).about("Buddhabrot / Nebulabrot orbit density"),
        ))
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, RenderError> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| RenderError::InvalidConfiguration(format!("could not parse --{}", name)))
}

fn size(matches: &ArgMatches) -> Result<(usize, usize), RenderError> {
    matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<usize>(s, 'x'))
        .ok_or_else(|| RenderError::InvalidConfiguration("could not parse --size".to_string()))
}

fn window(matches: &ArgMatches, family: Family) -> Window {
    let framing = family.window();
    let leftlower = matches
        .value_of(LEFTLOWER)
        .and_then(parse_complex)
        .unwrap_or_else(|| Complex::new(framing.real_min, framing.imag_min));
    let rightupper = matches
        .value_of(RIGHTUPPER)
        .and_then(parse_complex)
        .unwrap_or_else(|| Complex::new(framing.real_max, framing.imag_max));
    Window::from_corners(leftlower, rightupper)
}

fn threads(matches: &ArgMatches) -> Result<usize, RenderError> {
    match matches.value_of(THREADS) {
        Some(_) => value(matches, THREADS),
        None => Ok(num_cpus::get()),
    }
}

fn write(raster: &Raster, matches: &ArgMatches) -> Result<(), RenderError> {
    let output = matches.value_of(OUTPUT).unwrap_or("orbits.png");
    FileSink.write(raster, Path::new(output))?;
    info!(path = output, "image written");
    Ok(())
}

fn escape_time(family: Family, matches: &ArgMatches) -> Result<(), RenderError> {
    let (width, height) = size(matches)?;
    let config = EscapeConfig {
        window: window(matches, family),
        cap: value(matches, ITERATIONS)?,
        threads: threads(matches)?,
        sentinel: if matches.is_present(WHITE) {
            [255, 255, 255]
        } else {
            [0, 0, 0]
        },
        ..EscapeConfig::new(width, height, family)
    };
    let palette: Palette = value(matches, PALETTE)?;
    let raster = EscapeTimeRenderer::new(config)?.render(&palette, &LogObserver)?;
    write(&raster, matches)
}

fn buddhabrot(matches: &ArgMatches) -> Result<(), RenderError> {
    let family: Family = value(matches, FAMILY)?;
    let (width, height) = size(matches)?;
    let samples: usize = value(matches, SAMPLES)?;
    let batches: usize = value(matches, BATCHES)?;
    if batches == 0 || samples % batches != 0 {
        return Err(RenderError::InvalidConfiguration(format!(
            "{} batches do not evenly divide {} samples",
            batches, samples
        )));
    }
    let thresholds: Vec<usize> = matches
        .value_of(THRESHOLDS)
        .and_then(parse_list::<usize>)
        .ok_or_else(|| RenderError::InvalidConfiguration("could not parse --thresholds".to_string()))?;
    let sample_threshold = match matches.value_of(SAMPLE_THRESHOLD) {
        Some(_) => value(matches, SAMPLE_THRESHOLD)?,
        None => thresholds.iter().cloned().max().unwrap_or(0),
    };
    let seed = match matches.value_of(SEED) {
        Some(_) => Some(value(matches, SEED)?),
        None => None,
    };
    let config = BuddhabrotConfig {
        width,
        height,
        family,
        window: window(matches, family),
        samples,
        batch_size: samples / batches,
        sample_threshold,
        thresholds,
        policy: value(matches, POLICY)?,
        color_mode: if matches.is_present(GRAYSCALE) {
            ColorMode::Grayscale
        } else {
            ColorMode::FullColor
        },
        seed,
        threads: threads(matches)?,
    };
    let raster = BuddhabrotRenderer::new(config)?.render(&LogObserver)?;
    write(&raster, matches)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbits=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    let outcome = match matches.subcommand() {
        (MANDELBROT, Some(m)) => escape_time(Family::Mandelbrot, m),
        (BURNING_SHIP, Some(m)) => escape_time(Family::BurningShip, m),
        (BUDDHABROT, Some(m)) => buddhabrot(m),
        (other, _) => Err(RenderError::InvalidConfiguration(format!(
            "unknown subcommand '{}'",
            other
        ))),
    };
    if let Err(e) = outcome {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
