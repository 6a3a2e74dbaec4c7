//! Accent backgrounds and the luma-threshold text color choice.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Rounded broadcast luma above which text is drawn black.
pub const LUMA_THRESHOLD: u8 = 125;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("unsupported color syntax: {0}")]
    Syntax(String),
    #[error("color component out of range: {0}")]
    Range(String),
}

/// sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Background color in one of the forms a card style can carry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Color {
    /// Hue in degrees, saturation and lightness in percent.
    Hsl {
        hue: f64,
        saturation: f64,
        lightness: f64,
    },
    Rgb(Rgb),
}

impl Color {
    pub fn to_rgb(&self) -> Rgb {
        match *self {
            Color::Rgb(rgb) => rgb,
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => hsl_to_rgb(hue, saturation / 100.0, lightness / 100.0),
        }
    }
}

impl FromStr for Color {
    type Err = ColorError;

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)` and `hsl(h, s%, l%)`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let value = input.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).map(Color::Rgb);
        }
        if let Some(args) = function_args(&value, "rgb") {
            let [r, g, b] = parse_components(args, &value)?;
            let channel = |v: f64| {
                if (0.0..=255.0).contains(&v) {
                    Ok(v.round() as u8)
                } else {
                    Err(ColorError::Range(input.to_string()))
                }
            };
            return Ok(Color::Rgb(Rgb::new(channel(r)?, channel(g)?, channel(b)?)));
        }
        if let Some(args) = function_args(&value, "hsl") {
            let [hue, saturation, lightness] = parse_components(args, &value)?;
            if !(0.0..=100.0).contains(&saturation) || !(0.0..=100.0).contains(&lightness) {
                return Err(ColorError::Range(input.to_string()));
            }
            return Ok(Color::Hsl {
                hue,
                saturation,
                lightness,
            });
        }
        Err(ColorError::Syntax(input.to_string()))
    }
}

fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_components(args: &str, original: &str) -> Result<[f64; 3], ColorError> {
    let parts: Vec<&str> = args
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 {
        return Err(ColorError::Syntax(original.to_string()));
    }

    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .trim_end_matches('%')
            .trim_end_matches("deg")
            .parse()
            .map_err(|_| ColorError::Syntax(original.to_string()))?;
    }
    Ok(out)
}

fn parse_hex(hex: &str) -> Result<Rgb, ColorError> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|ch| ch.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()
        .ok_or_else(|| ColorError::Syntax(format!("#{hex}")))?;

    match digits.as_slice() {
        [r, g, b] => Ok(Rgb::new(r * 17, g * 17, b * 17)),
        [r1, r2, g1, g2, b1, b2] => Ok(Rgb::new(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
        _ => Err(ColorError::Syntax(format!("#{hex}"))),
    }
}

/// `saturation` and `lightness` are fractions in [0, 1]; channels are rounded.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let hue = hue.rem_euclid(360.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r1, g1, b1) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r1), channel(g1), channel(b1))
}

/// Text color chosen for legibility on a given background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    Black,
    White,
}

impl TextColor {
    pub fn as_css(self) -> &'static str {
        match self {
            TextColor::Black => "black",
            TextColor::White => "white",
        }
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

/// Rounded `0.299 R + 0.587 G + 0.114 B`.
pub fn luminance(rgb: Rgb) -> u8 {
    let luma = 0.299 * f64::from(rgb.r) + 0.587 * f64::from(rgb.g) + 0.114 * f64::from(rgb.b);
    luma.round() as u8
}

/// Black text when the rounded luma exceeds 125, white otherwise.
pub fn foreground_for(background: &Color) -> TextColor {
    if luminance(background.to_rgb()) > LUMA_THRESHOLD {
        TextColor::Black
    } else {
        TextColor::White
    }
}

/// Background generated for a populated card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentColor {
    /// Degrees, 0..360.
    pub hue: u16,
    /// Percent, 70..90.
    pub saturation: u8,
    /// Percent, 30..50.
    pub lightness: u8,
}

impl AccentColor {
    pub const HUE_RANGE: std::ops::Range<u16> = 0..360;
    pub const SATURATION_RANGE: std::ops::Range<u8> = 70..90;
    pub const LIGHTNESS_RANGE: std::ops::Range<u8> = 30..50;

    pub fn to_color(self) -> Color {
        Color::Hsl {
            hue: f64::from(self.hue),
            saturation: f64::from(self.saturation),
            lightness: f64::from(self.lightness),
        }
    }

    pub fn foreground(self) -> TextColor {
        foreground_for(&self.to_color())
    }

    /// CSS form, e.g. `hsl(210, 80%, 40%)`.
    pub fn to_css(self) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Range-bounded random accent colors over an injectable random source.
#[derive(Debug, Clone)]
pub struct AccentGenerator<R = StdRng> {
    rng: R,
}

impl AccentGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible sequence, used by tests and the JS bridge.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for AccentGenerator<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> AccentGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self) -> AccentColor {
        AccentColor {
            hue: self.rng.gen_range(AccentColor::HUE_RANGE),
            saturation: self.rng.gen_range(AccentColor::SATURATION_RANGE),
            lightness: self.rng.gen_range(AccentColor::LIGHTNESS_RANGE),
        }
    }
}
