//! Conversions between sRGB colors and their text representations,
//! plus the perceptual luminance used to pick readable text over a color.

use palette::Srgb;
use std::{
    error::Error,
    f64::consts::PI,
    fmt::{self, Display},
    str::FromStr,
};

/// Linear sRGB to LMS cone response
const LINEAR_TO_LMS: [[f64; 3]; 3] = [
    [0.4122214708, 0.5363325363, 0.0514459929],
    [0.2119034982, 0.6806995451, 0.1073969466],
    [0.0883024619, 0.2817188376, 0.6299787005],
];

/// Cube-rooted LMS to Oklab
const LMS_TO_OKLAB: [[f64; 3]; 3] = [
    [0.2104542553, 0.7936177850, -0.0040720468],
    [1.9779984951, -2.4285922050, 0.4505937099],
    [0.0259040371, 0.7827717662, -0.8086757660],
];

/// The luminance above which black text is more readable than white text
const CONTRAST_THRESHOLD: f64 = 0.5;

/// Error cases for parsing a color from text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    /// The text was empty or only whitespace
    Empty,
    /// The text started with `#` but was not a valid hex code
    InvalidHex(String),
    /// Fewer than three numeric components were found
    MissingComponents {
        /// The number of components that were found
        found: usize,
    },
    /// A numeric component did not fit in `0..=255`
    ComponentOutOfRange(String),
    /// An `oklch(...)` string did not start with a valid lightness
    InvalidLightness(String),
}

impl Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseColorError::Empty => write!(f, "Empty color text"),
            ParseColorError::InvalidHex(hex) => write!(f, "Invalid hex color: {hex}"),
            ParseColorError::MissingComponents { found } => {
                write!(f, "Expected 3 color components but found {found}")
            }
            ParseColorError::ComponentOutOfRange(component) => {
                write!(f, "Color component {component} is not in 0..=255")
            }
            ParseColorError::InvalidLightness(lightness) => {
                write!(f, "Invalid oklch lightness: {lightness}")
            }
        }
    }
}

impl Error for ParseColorError {}

/// Which text color reads better on top of a background color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastText {
    /// Black text, for light backgrounds
    Black,
    /// White text, for dark backgrounds
    White,
}

impl ContrastText {
    /// Pick the text color for a background with the given luminance in `0.0..=1.0`.
    ///
    /// A luminance of exactly `0.5` gives [`ContrastText::White`].
    #[must_use]
    pub fn from_luminance(luminance: f64) -> Self {
        if luminance > CONTRAST_THRESHOLD {
            ContrastText::Black
        } else {
            ContrastText::White
        }
    }

    /// The lowercase name of this text color
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContrastText::Black => "black",
            ContrastText::White => "white",
        }
    }

    /// The sRGB value of this text color
    #[must_use]
    pub const fn srgb(self) -> Srgb<u8> {
        match self {
            ContrastText::Black => Srgb::new(0, 0, 0),
            ContrastText::White => Srgb::new(255, 255, 255),
        }
    }
}

impl Display for ContrastText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `#rrggbb` (or `#rgb`) hex code or an `rgb(r, g, b)`-style string.
///
/// For non-hex text, the first three runs of ASCII digits are taken as the red, green, and blue components.
///
/// # Errors
/// Returns a [`ParseColorError`] if the text is empty, is a malformed hex code,
/// has fewer than three numeric components, or has a component above `255`.
pub fn to_rgb(text: &str) -> Result<Srgb<u8>, ParseColorError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseColorError::Empty);
    }

    if let Some(hex) = text.strip_prefix('#') {
        // palette slices by byte index, so reject anything but hex digits up front
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError::InvalidHex(text.to_owned()));
        }

        return Srgb::<u8>::from_str(hex).map_err(|_| ParseColorError::InvalidHex(text.to_owned()));
    }

    let mut components = [0u8; 3];
    let mut found = 0;
    for token in text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .take(components.len())
    {
        components[found] = token
            .parse()
            .map_err(|_| ParseColorError::ComponentOutOfRange(token.to_owned()))?;
        found += 1;
    }

    if found < components.len() {
        return Err(ParseColorError::MissingComponents { found });
    }

    let [red, green, blue] = components;
    Ok(Srgb::new(red, green, blue))
}

/// Parse a color like [`to_rgb`], but fall back to black for malformed text.
#[must_use]
pub fn to_rgb_or_black(text: &str) -> Srgb<u8> {
    to_rgb(text).unwrap_or(Srgb::new(0, 0, 0))
}

/// Format a color as a lowercase, zero-padded `#rrggbb` hex code.
#[must_use]
pub fn rgb_to_hex(color: Srgb<u8>) -> String {
    format!("#{color:x}")
}

/// Format a color as an `rgb(r, g, b)` string.
#[must_use]
pub fn rgb_to_rgb_string(color: Srgb<u8>) -> String {
    format!("rgb({}, {}, {})", color.red, color.green, color.blue)
}

/// Format a color as an `oklch(L% C H)` string.
///
/// Lightness is a percentage with 2 decimals, chroma has 4 decimals,
/// and hue is in degrees in `[0, 360)` with 2 decimals.
#[must_use]
pub fn rgb_to_oklch(color: Srgb<u8>) -> String {
    let [l, c, h] = oklch_components(color);
    format!("oklch({:.2}% {c:.4} {h:.2})", l * 100.0)
}

/// The sRGB electro-optical transfer function for a component in `0.0..=1.0`
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Multiply a 3x3 matrix and a vector
fn mul(matrix: [[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    matrix.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

/// Convert a color to its Oklch lightness (`0.0..=1.0`), chroma, and hue (degrees)
fn oklch_components(color: Srgb<u8>) -> [f64; 3] {
    let linear = [color.red, color.green, color.blue].map(|c| srgb_to_linear(f64::from(c) / 255.0));
    let lms = mul(LINEAR_TO_LMS, linear).map(f64::cbrt);
    let [l, a, b] = mul(LMS_TO_OKLAB, lms);

    let chroma = (a * a + b * b).sqrt();
    let mut hue = b.atan2(a) * 180.0 / PI;
    if hue < 0.0 {
        hue += 360.0;
    }

    [l, chroma, hue]
}

/// HSP brightness of a color, scaled to `0.0..=1.0`
#[must_use]
pub fn hsp_luminance(color: Srgb<u8>) -> f64 {
    let [r, g, b] = [color.red, color.green, color.blue].map(f64::from);
    ((0.299 * r * r + 0.587 * g * g + 0.114 * b * b).sqrt() / 255.0).min(1.0)
}

/// If `text` is an `oklch(...)` string, parse its lightness
fn oklch_lightness(text: &str) -> Option<Result<f64, ParseColorError>> {
    let prefix = "oklch(";
    let text = text.trim();
    if !text.get(..prefix.len())?.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let lightness = text
        .get(prefix.len()..)?
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | ')'))
        .find(|token| !token.is_empty())
        .unwrap_or_default();

    Some(parse_lightness(lightness))
}

/// Parse an Oklch lightness given as a percentage (`95%`) or a fraction (`0.95`)
fn parse_lightness(token: &str) -> Result<f64, ParseColorError> {
    let (number, scale) = match token.strip_suffix('%') {
        Some(number) => (number, 100.0),
        None => (token, 1.0),
    };

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok((value / scale).clamp(0.0, 1.0)),
        _ => Err(ParseColorError::InvalidLightness(token.to_owned())),
    }
}

/// The perceptual luminance of a color string in `0.0..=1.0`.
///
/// For `oklch(...)` strings this is the lightness channel as is.
/// Anything else is parsed with [`to_rgb`] and measured with [`hsp_luminance`].
///
/// # Errors
/// Returns a [`ParseColorError`] if the color text is malformed.
pub fn relative_luminance(text: &str) -> Result<f64, ParseColorError> {
    oklch_lightness(text).unwrap_or_else(|| to_rgb(text).map(hsp_luminance))
}

/// Choose black or white text for the given background color string.
///
/// # Errors
/// Returns a [`ParseColorError`] if the color text is malformed.
/// Callers that want the lenient behavior can treat the error as a black background,
/// i.e., `contrast_text(text).unwrap_or(ContrastText::White)`.
pub fn contrast_text(background: &str) -> Result<ContrastText, ParseColorError> {
    relative_luminance(background).map(ContrastText::from_luminance)
}

/// Choose black or white text for the given background color.
#[must_use]
pub fn contrast_text_for(background: Srgb<u8>) -> ContrastText {
    ContrastText::from_luminance(hsp_luminance(background))
}
