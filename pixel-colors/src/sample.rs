//! Reduces an RGBA image to a bounded set of opaque sRGB sample points.

use image::{
    imageops::{self, FilterType},
    ImageBuffer, Rgba,
};
use palette::Srgb;
use std::{
    error::Error,
    fmt::{self, Display},
    ops::Deref,
};

/// The default maximum width and height of the image that samples are taken from
pub const MAX_DIMENSION: u32 = 100;

/// The default minimum alpha value for a pixel to be sampled
pub const ALPHA_THRESHOLD: u8 = 128;

/// A borrowed, row-major RGBA image with one byte per channel
pub type PixelBuffer<'a> = ImageBuffer<Rgba<u8>, &'a [u8]>;

/// Error cases for viewing raw bytes as an RGBA image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The number of bytes is not `width * height * 4`
    SizeMismatch {
        /// The number of bytes needed for the given dimensions
        expected: u64,
        /// The number of bytes provided
        actual: usize,
    },
}

impl Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BufferError::SizeMismatch { expected, actual } => write!(
                f,
                "Expected {expected} bytes of RGBA pixel data but got {actual}"
            ),
        }
    }
}

impl Error for BufferError {}

/// View `rgba` as a `width` by `height` image.
///
/// # Errors
/// Returns [`BufferError::SizeMismatch`] if `rgba` does not hold exactly `width * height` RGBA pixels.
pub fn pixel_buffer(width: u32, height: u32, rgba: &[u8]) -> Result<PixelBuffer<'_>, BufferError> {
    let expected = u64::from(width) * u64::from(height) * 4;
    let mismatch = BufferError::SizeMismatch { expected, actual: rgba.len() };

    if u64::try_from(rgba.len()).map_or(true, |len| len != expected) {
        return Err(mismatch);
    }

    ImageBuffer::from_raw(width, height, rgba).ok_or(mismatch)
}

/// Takes sample points from an image, downscaling it first if it is too large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    /// Images wider or taller than this are downscaled to fit
    max_dimension: u32,
    /// Pixels with an alpha below this are dropped
    alpha_threshold: u8,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    /// Create a [`Sampler`] with a max dimension of [`MAX_DIMENSION`] and an alpha threshold of [`ALPHA_THRESHOLD`]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            alpha_threshold: ALPHA_THRESHOLD,
        }
    }

    /// Set the max width and height of the sampled image. A value of `0` is treated as `1`.
    #[must_use]
    pub const fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = if max_dimension == 0 { 1 } else { max_dimension };
        self
    }

    /// Set the minimum alpha value a pixel needs to be sampled.
    #[must_use]
    pub const fn with_alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    /// The max width and height of the sampled image
    #[must_use]
    pub const fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// The minimum alpha value a pixel needs to be sampled
    #[must_use]
    pub const fn alpha_threshold(&self) -> u8 {
        self.alpha_threshold
    }

    /// The dimensions an image is resampled to before taking samples.
    ///
    /// Both dimensions are scaled by the same factor so that neither exceeds the max dimension,
    /// and each is rounded to the nearest integer (but kept at least `1`).
    #[must_use]
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max = self.max_dimension;
        if width <= max && height <= max {
            return (width, height);
        }

        let max = f64::from(max);
        let scale = f64::min(max / f64::from(width), max / f64::from(height));

        // scale is positive and < 1, so the result is in 0.0..=max
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = |dimension: u32| ((f64::from(dimension) * scale).round() as u32).clamp(1, self.max_dimension);

        (scaled(width), scaled(height))
    }

    /// Collect the colors of the pixels that are at least as opaque as the alpha threshold.
    ///
    /// Pixels are visited in row-major order, so the same image always gives the same samples.
    #[must_use]
    pub fn sample<C>(&self, image: &ImageBuffer<Rgba<u8>, C>) -> Vec<Srgb<u8>>
    where
        C: Deref<Target = [u8]>,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let (scaled_width, scaled_height) = self.scaled_dimensions(width, height);
        if (scaled_width, scaled_height) == (width, height) {
            self.opaque_colors(image.pixels())
        } else {
            let thumbnail = imageops::resize(image, scaled_width, scaled_height, FilterType::Nearest);
            self.opaque_colors(thumbnail.pixels())
        }
    }

    /// Keep the RGB part of each pixel with a high enough alpha
    fn opaque_colors<'a>(&self, pixels: impl Iterator<Item = &'a Rgba<u8>>) -> Vec<Srgb<u8>> {
        pixels
            .filter(|pixel| pixel.0[3] >= self.alpha_threshold)
            .map(|&Rgba([r, g, b, _])| Srgb::new(r, g, b))
            .collect()
    }
}
