//! Extract a small color palette from an image by running k-means clustering on its pixels in RGB space.
//!
//! # Examples
//!
//! ## Read an image file and get 4 hex colors.
//!
//! ```no_run
//! use pixel_colors::ColorFormat;
//!
//! let image = image::open("some image").unwrap().into_rgba8();
//! let palette = pixel_colors::palette_from_image(&image, 4, ColorFormat::Hex).unwrap();
//! ```
//!
//! ## Run each step separately.
//!
//! ```no_run
//! use pixel_colors::{kmeans, ColorFormat, Sampler};
//!
//! let image = image::open("some image").unwrap().into_rgba8();
//! let points = Sampler::new().with_alpha_threshold(200).sample(&image);
//!
//! let result = kmeans::run(&points, 6, 20).unwrap();
//! let oklch = pixel_colors::format_palette(&result, ColorFormat::Oklch);
//! let rgb = pixel_colors::format_palette(&result, ColorFormat::Rgb);
//! ```
//!
//! ## Pick readable text for a swatch.
//!
//! ```
//! use pixel_colors::{contrast_text, ContrastText};
//!
//! assert_eq!(contrast_text("#fafafa"), Ok(ContrastText::Black));
//! assert_eq!(contrast_text("oklch(20% 0.1 250)"), Ok(ContrastText::White));
//! ```
//!
//! # Steps
//!
//! ## Sampling
//!
//! An image wider or taller than the max dimension (`100` by default) is first resampled so that it fits,
//! keeping its aspect ratio. Then, every pixel with an alpha of at least the alpha threshold (`128` by default)
//! becomes a sample point. Translucent pixels are dropped, not blended.
//!
//! ## Clustering
//!
//! k-means starts from `k` evenly spaced sample points and runs for at most `max_iter` iterations
//! (`10` by default), stopping early once no centroid changes. Squared Euclidean distance in sRGB is used,
//! and centroids are rounded to whole sRGB values every iteration, rounding halves up.
//! The final centroids are sorted by descending number of points.
//!
//! There is no randomness involved, so the same image always gives the same palette.
//!
//! There are always exactly `k` colors in the result. If there are fewer sample points than `k`,
//! then the leftover centroids are black. If there are no sample points at all (e.g., a fully transparent image),
//! then all `k` colors are black. A `k` of `0` is an error.
//!
//! ## Formatting
//!
//! Each centroid is formatted as a `#rrggbb` hex code, an `rgb(r, g, b)` string,
//! or an `oklch(L% C H)` string, keeping the frequency order.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(clippy::module_name_repetitions, clippy::unreadable_literal)]

pub mod color;
mod format;
pub mod kmeans;
mod sample;

pub use color::{
    contrast_text, contrast_text_for, relative_luminance, rgb_to_hex, rgb_to_oklch, to_rgb,
    ContrastText, ParseColorError,
};
pub use format::{css_variables, format_colors, format_palette, ColorFormat, UnknownFormatError};
pub use kmeans::{Centroid, ClusterError, ClusterResult};
pub use palette::Srgb;
pub use sample::{pixel_buffer, BufferError, PixelBuffer, Sampler, ALPHA_THRESHOLD, MAX_DIMENSION};

use image::{ImageBuffer, Rgba};
use std::{
    error::Error,
    fmt::{self, Display},
    ops::Deref,
};

/// Error cases for generating a palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteError {
    /// The pixel data did not match the image dimensions
    Buffer(BufferError),
    /// The k-means arguments were invalid
    Cluster(ClusterError),
}

impl Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PaletteError::Buffer(e) => write!(f, "Invalid pixel buffer: {e}"),
            PaletteError::Cluster(e) => write!(f, "Invalid clustering arguments: {e}"),
        }
    }
}

impl Error for PaletteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PaletteError::Buffer(e) => Some(e),
            PaletteError::Cluster(e) => Some(e),
        }
    }
}

impl From<BufferError> for PaletteError {
    fn from(e: BufferError) -> Self {
        PaletteError::Buffer(e)
    }
}

impl From<ClusterError> for PaletteError {
    fn from(e: ClusterError) -> Self {
        PaletteError::Cluster(e)
    }
}

/// Generate `k` colors for an image using the default sampler and max iterations.
///
/// See the crate documentation for more information on each step.
///
/// # Errors
/// Returns [`PaletteError::Cluster`] if `k` is `0`.
pub fn palette_from_image<C>(
    image: &ImageBuffer<Rgba<u8>, C>,
    k: u8,
    format: ColorFormat,
) -> Result<Vec<String>, PaletteError>
where
    C: Deref<Target = [u8]>,
{
    palette_from_image_with(image, &Sampler::new(), k, kmeans::DEFAULT_MAX_ITER, format)
}

/// Generate `k` colors for an image using the given sampler and max iterations.
///
/// # Errors
/// Returns [`PaletteError::Cluster`] if `k` is `0`.
pub fn palette_from_image_with<C>(
    image: &ImageBuffer<Rgba<u8>, C>,
    sampler: &Sampler,
    k: u8,
    max_iter: u32,
    format: ColorFormat,
) -> Result<Vec<String>, PaletteError>
where
    C: Deref<Target = [u8]>,
{
    let points = sampler.sample(image);
    let result = kmeans::run(&points, k, max_iter)?;
    Ok(format_palette(&result, format))
}

/// Generate `k` colors for raw, row-major RGBA bytes using the default sampler and max iterations.
///
/// # Errors
/// Returns [`PaletteError::Buffer`] if `rgba` is not `width * height * 4` bytes long,
/// or [`PaletteError::Cluster`] if `k` is `0`.
pub fn palette_from_rgba(
    width: u32,
    height: u32,
    rgba: &[u8],
    k: u8,
    format: ColorFormat,
) -> Result<Vec<String>, PaletteError> {
    palette_from_image(&pixel_buffer(width, height, rgba)?, k, format)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::RgbaImage;

    /// Left three quarters red, right quarter blue
    fn red_blue_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width * 3 / 4 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn dominant_color_first() {
        let palette = palette_from_image(&red_blue_image(40, 10), 2, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#ff0000", "#0000ff"]);

        let palette = palette_from_image(&red_blue_image(40, 10), 2, ColorFormat::Rgb).unwrap();
        assert_eq!(palette, vec!["rgb(255, 0, 0)", "rgb(0, 0, 255)"]);
    }

    #[test]
    fn downscaled_image_keeps_order() {
        let palette = palette_from_image(&red_blue_image(800, 600), 2, ColorFormat::Hex).unwrap();
        assert_eq!(palette.len(), 2);

        let first = to_rgb(&palette[0]).unwrap();
        let second = to_rgb(&palette[1]).unwrap();
        assert!(first.red > 200 && first.blue < 50, "{palette:?}");
        assert!(second.blue > 200 && second.red < 50, "{palette:?}");
    }

    #[test]
    fn transparent_image_gives_black() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 10]));
        let palette = palette_from_image(&image, 4, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#000000"; 4]);
    }

    #[test]
    fn identical_pixels_give_duplicate_colors() {
        let image = RgbaImage::from_pixel(5, 5, Rgba([10, 20, 30, 255]));
        let palette = palette_from_image(&image, 3, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#0a141e", "#0a141e", "#0a141e"]);
    }

    #[test]
    fn translucent_pixels_are_ignored() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 8 {
                Rgba([0, 255, 0, 100])
            } else {
                Rgba([0, 0, 255, 200])
            }
        });
        let palette = palette_from_image(&image, 1, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#0000ff"]);
    }

    #[test]
    fn zero_k_is_rejected() {
        let image = red_blue_image(4, 4);
        assert_eq!(
            palette_from_image(&image, 0, ColorFormat::Hex),
            Err(PaletteError::Cluster(ClusterError::ZeroClusters))
        );
    }

    #[test]
    fn raw_bytes() {
        let rgba = [255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255];
        let palette = palette_from_rgba(3, 1, &rgba, 2, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#ffffff", "#000000"]);

        assert!(matches!(
            palette_from_rgba(2, 2, &rgba, 2, ColorFormat::Hex),
            Err(PaletteError::Buffer(_))
        ));
    }

    #[test]
    fn custom_sampler() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 8 {
                Rgba([0, 255, 0, 100])
            } else {
                Rgba([0, 0, 255, 200])
            }
        });
        let sampler = Sampler::new().with_alpha_threshold(50);
        let palette = palette_from_image_with(&image, &sampler, 2, 10, ColorFormat::Hex).unwrap();
        assert_eq!(palette, vec!["#00ff00", "#0000ff"]);
    }

    #[test]
    fn deterministic_palette() {
        let channel = |value: u32| u8::try_from(value % 256).unwrap();
        let image = RgbaImage::from_fn(250, 130, |x, y| {
            Rgba([channel(x * 7), channel(y * 13), channel(x + y), 255])
        });

        for format in ColorFormat::ALL {
            let a = palette_from_image(&image, 6, format).unwrap();
            let b = palette_from_image(&image, 6, format).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), 6);
        }
    }

    #[test]
    fn contrast_of_palette_colors() {
        let palette = palette_from_image(&red_blue_image(8, 8), 2, ColorFormat::Oklch).unwrap();
        let contrast = palette
            .iter()
            .map(|color| contrast_text(color).unwrap())
            .collect::<Vec<_>>();

        // red has an Oklch lightness of ~62.8%, blue ~45.2%
        assert_eq!(contrast, vec![ContrastText::Black, ContrastText::White]);
    }
}
