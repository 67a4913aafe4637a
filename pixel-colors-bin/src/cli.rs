//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use pixel_colors::{kmeans, ColorFormat, ALPHA_THRESHOLD, MAX_DIMENSION};
use std::{
    fmt::{Debug, Display},
    ops::RangeBounds,
    path::PathBuf,
    str::FromStr,
};

/// Supported output formats for the final colors
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatOutput {
    /// sRGB hexcode
    Hex,
    /// sRGB rgb(r, g, b) triple
    Rgb,
    /// Oklch lightness, chroma, and hue
    Oklch,
    /// Whitespace with true color background
    Swatch,
}

impl FormatOutput {
    /// The text format for this output, if it is a text format
    pub const fn color_format(self) -> Option<ColorFormat> {
        match self {
            FormatOutput::Hex => Some(ColorFormat::Hex),
            FormatOutput::Rgb => Some(ColorFormat::Rgb),
            FormatOutput::Oklch => Some(ColorFormat::Oklch),
            FormatOutput::Swatch => None,
        }
    }
}

/// Ways to colorize the output text
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorizeOutput {
    /// Foreground
    Fg,
    /// Background, with black or white text depending on the color
    Bg,
}

/// Generate a color palette for an image by performing k-means clustering on its pixels in RGB space.
///
/// Colors are printed from most to least frequent.
#[derive(Parser)]
#[command(version)]
pub struct Options {
    /// The path to the input image
    pub image: PathBuf,

    /// The format to print the colors in
    #[arg(short, long, default_value = "hex")]
    pub output: FormatOutput,

    /// Color the foreground or background for each printed color
    #[arg(short, long)]
    pub colorize: Option<ColorizeOutput>,

    /// Reverse the printed order of the colors
    #[arg(short, long)]
    pub reverse: bool,

    /// Print the colors as CSS custom properties (--color-1, --color-2, ...) on :root
    ///
    /// The swatch output format falls back to hex codes.
    #[arg(long)]
    pub css: bool,

    /// The number of colors to find
    ///
    /// Exactly this many colors are printed. If the image has fewer distinct pixels than this,
    /// then some colors will be repeated or black.
    #[arg(short, default_value_t = kmeans::DEFAULT_K, value_parser = parse_valid_k)]
    pub k: u8,

    /// The maximum number of k-means iterations
    ///
    /// k-means stops early once no color changes between iterations.
    /// You can use the --verbose option to see how many iterations were needed.
    #[arg(short = 'i', long, default_value_t = kmeans::DEFAULT_MAX_ITER)]
    pub max_iter: u32,

    /// The maximum width and height of the image before it is downscaled
    ///
    /// Larger values give more sample points, at the cost of a slower k-means.
    #[arg(long, default_value_t = MAX_DIMENSION, value_parser = parse_valid_max_dimension)]
    pub max_dimension: u32,

    /// Pixels with an alpha value below this are ignored
    #[arg(short, long, default_value_t = ALPHA_THRESHOLD)]
    pub alpha_threshold: u8,

    /// The number of threads to use
    ///
    /// A value of 0 indicates to use the default number of threads.
    #[cfg(feature = "threads")]
    #[arg(short, long, default_value_t = 0)]
    pub threads: u8,

    /// Print additional information, such as the number of k-means iterations
    #[arg(long)]
    pub verbose: bool,
}

/// Parse a value and ensure it is in the provided, valid range
fn parse_in_range<T>(s: &str, range: impl RangeBounds<T> + Debug) -> Result<T, String>
where
    T: FromStr + Display + PartialOrd,
    T::Err: Display,
{
    let value: T = s.parse().map_err(|e| format!("{e}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {range:?}"))
    }
}

/// Parse the number of colors and ensure it is >= `1`
fn parse_valid_k(s: &str) -> Result<u8, String> {
    parse_in_range(s, 1..)
}

/// Parse the max dimension and ensure it is >= `1`
fn parse_valid_max_dimension(s: &str) -> Result<u32, String> {
    parse_in_range(s, 1..)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_in_range_bounds() {
        assert_eq!(parse_valid_k("1"), Ok(1));
        assert_eq!(parse_valid_k("255"), Ok(255));
        assert!(parse_valid_k("0").is_err());
        assert!(parse_valid_k("256").is_err());
        assert!(parse_valid_k("-3").is_err());
        assert!(parse_valid_max_dimension("0").is_err());
        assert_eq!(parse_valid_max_dimension("640"), Ok(640));
    }

    #[test]
    fn defaults() {
        let options = Options::try_parse_from(["pixel-colors", "image.png"]).expect("valid args");
        assert!(options.output == FormatOutput::Hex);
        assert!(options.colorize.is_none());
        assert_eq!(options.k, 4);
        assert_eq!(options.max_iter, 10);
        assert_eq!(options.max_dimension, 100);
        assert_eq!(options.alpha_threshold, 128);
        assert!(!options.reverse && !options.css && !options.verbose);
    }

    #[test]
    fn rejects_zero_k() {
        assert!(Options::try_parse_from(["pixel-colors", "image.png", "-k", "0"]).is_err());
    }

    #[test]
    fn output_formats() {
        let options = Options::try_parse_from(["pixel-colors", "image.png", "-o", "oklch"]).expect("valid args");
        assert_eq!(options.output.color_format(), Some(ColorFormat::Oklch));

        let options = Options::try_parse_from(["pixel-colors", "image.png", "--output", "swatch"]).expect("valid args");
        assert_eq!(options.output.color_format(), None);
    }
}
