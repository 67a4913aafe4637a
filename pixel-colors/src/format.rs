//! Turns clustered colors into color strings.

use crate::{
    color::{rgb_to_hex, rgb_to_oklch, rgb_to_rgb_string},
    kmeans::ClusterResult,
};
use palette::Srgb;
use std::{
    error::Error,
    fmt::{self, Display},
    str::FromStr,
};

/// Supported text formats for palette colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    /// `#rrggbb` hex code
    #[default]
    Hex,
    /// `rgb(r, g, b)`
    Rgb,
    /// `oklch(L% C H)`
    Oklch,
}

impl ColorFormat {
    /// All supported formats
    pub const ALL: [ColorFormat; 3] = [ColorFormat::Hex, ColorFormat::Rgb, ColorFormat::Oklch];

    /// The lowercase name of this format
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ColorFormat::Hex => "hex",
            ColorFormat::Rgb => "rgb",
            ColorFormat::Oklch => "oklch",
        }
    }

    /// Format a single color
    #[must_use]
    pub fn format(self, color: Srgb<u8>) -> String {
        match self {
            ColorFormat::Hex => rgb_to_hex(color),
            ColorFormat::Rgb => rgb_to_rgb_string(color),
            ColorFormat::Oklch => rgb_to_oklch(color),
        }
    }
}

impl Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error for an unknown [`ColorFormat`] name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormatError(String);

impl Display for UnknownFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unknown color format {}, expected one of hex, rgb, or oklch", self.0)
    }
}

impl Error for UnknownFormatError {}

impl FromStr for ColorFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ColorFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFormatError(s.to_owned()))
    }
}

/// Format each color in order.
///
/// No colors are removed or reordered, so duplicate colors give duplicate strings.
#[must_use]
pub fn format_colors(colors: impl IntoIterator<Item = Srgb<u8>>, format: ColorFormat) -> Vec<String> {
    colors.into_iter().map(|color| format.format(color)).collect()
}

/// Format each centroid of a k-means result, most frequent first.
#[must_use]
pub fn format_palette(result: &ClusterResult, format: ColorFormat) -> Vec<String> {
    format_colors(result.colors(), format)
}

/// Render a palette as CSS custom properties on `:root`, named `--color-1`, `--color-2`, ...
#[must_use]
pub fn css_variables(palette: &[String]) -> String {
    let vars = palette
        .iter()
        .enumerate()
        .map(|(i, color)| format!("  --color-{}: {color};", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(":root {{\n{vars}\n}}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kmeans::{self, Centroid};

    fn test_result() -> ClusterResult {
        ClusterResult {
            centroids: vec![
                Centroid { color: Srgb::new(255, 0, 0), count: 3 },
                Centroid { color: Srgb::new(0, 0, 0), count: 0 },
                Centroid { color: Srgb::new(0, 0, 0), count: 0 },
            ],
            iterations: 1,
        }
    }

    #[test]
    fn formats_in_order_with_duplicates() {
        let result = test_result();

        assert_eq!(
            format_palette(&result, ColorFormat::Hex),
            vec!["#ff0000", "#000000", "#000000"]
        );
        assert_eq!(
            format_palette(&result, ColorFormat::Rgb),
            vec!["rgb(255, 0, 0)", "rgb(0, 0, 0)", "rgb(0, 0, 0)"]
        );
        assert_eq!(
            format_palette(&result, ColorFormat::Oklch),
            vec![
                "oklch(62.80% 0.2577 29.23)",
                "oklch(0.00% 0.0000 0.00)",
                "oklch(0.00% 0.0000 0.00)",
            ]
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let points = [Srgb::new(12, 200, 7), Srgb::new(90, 90, 90), Srgb::new(12, 190, 9)];
        let result = kmeans::run(&points, 2, 10).unwrap();

        for format in ColorFormat::ALL {
            assert_eq!(format_palette(&result, format), format_palette(&result, format));
        }
    }

    #[test]
    fn palette_has_k_entries() {
        let result = kmeans::run(&[], 5, 10).unwrap();
        for format in ColorFormat::ALL {
            assert_eq!(format_palette(&result, format).len(), 5);
        }
    }

    #[test]
    fn parse_format_names() {
        assert_eq!("hex".parse(), Ok(ColorFormat::Hex));
        assert_eq!(" RGB ".parse(), Ok(ColorFormat::Rgb));
        assert_eq!("Oklch".parse(), Ok(ColorFormat::Oklch));
        assert_eq!(
            "hsl".parse::<ColorFormat>(),
            Err(UnknownFormatError("hsl".to_owned()))
        );

        for format in ColorFormat::ALL {
            assert_eq!(format.to_string().parse(), Ok(format));
        }
    }

    #[test]
    fn css_variables_block() {
        let palette = format_palette(&test_result(), ColorFormat::Hex);
        assert_eq!(
            css_variables(&palette),
            ":root {\n  --color-1: #ff0000;\n  --color-2: #000000;\n  --color-3: #000000;\n}"
        );
        assert_eq!(css_variables(&[]), ":root {\n\n}");
    }
}
