//! Generate a color palette from an image by performing k-means clustering on its pixels in RGB space.

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
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
    fmt::{self, Display},
    path::Path,
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, GenericImageView, RgbaImage};
use palette::Srgb;
use pixel_colors::{contrast_text_for, css_variables, format_colors, kmeans, ClusterError, ColorFormat, Sampler};

/// Record the running time of a function and print the elapsed time
macro_rules! time {
    ($name: literal, $verbose: expr, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        if $verbose {
            println!("{} took {}ms", $name, start.elapsed().as_millis());
        }
        result
    }};
}

/// Error cases for loading and decoding an image
#[derive(Debug)]
enum ImageLoadError {
    /// Failed to read or decode the image file
    ImageLoad(image::ImageError),
    /// Failed to read the avif file
    #[cfg(feature = "avif")]
    AvifRead(std::io::Error),
    /// Failed to decode the avif file
    #[cfg(feature = "avif")]
    AvifDecode(libavif_image::Error),
}

impl Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImageLoadError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
            #[cfg(feature = "avif")]
            ImageLoadError::AvifRead(e) => write!(f, "Failed to read the avif file: {e}"),
            #[cfg(feature = "avif")]
            ImageLoadError::AvifDecode(e) => write!(f, "Failed to decode the avif file: {e}"),
        }
    }
}

/// Error cases for a palette request
#[derive(Debug)]
enum RunError {
    /// The image could not be turned into pixels
    Load(ImageLoadError),
    /// The k-means arguments were invalid
    Cluster(ClusterError),
    /// The thread pool could not be created
    #[cfg(feature = "threads")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunError::Load(e) => write!(f, "{e}"),
            RunError::Cluster(e) => write!(f, "{e}"),
            #[cfg(feature = "threads")]
            RunError::ThreadPool(e) => write!(f, "Failed to create the thread pool: {e}"),
        }
    }
}

impl From<ImageLoadError> for RunError {
    fn from(e: ImageLoadError) -> Self {
        RunError::Load(e)
    }
}

impl From<ClusterError> for RunError {
    fn from(e: ClusterError) -> Self {
        RunError::Cluster(e)
    }
}

fn main() -> ExitCode {
    let options = Options::parse();

    let result = run_generate_and_print_palette(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Builds a thread pool and then runs `generate_and_print_palette`
#[cfg(feature = "threads")]
fn run_generate_and_print_palette(options: &Options) -> Result<(), RunError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .map_err(RunError::ThreadPool)?;

    pool.install(|| generate_and_print_palette(options))
}

/// Runs `generate_and_print_palette` on a single thread
#[cfg(not(feature = "threads"))]
fn run_generate_and_print_palette(options: &Options) -> Result<(), RunError> {
    generate_and_print_palette(options)
}

/// Load an image, generate its palette, and print the result using the given options
fn generate_and_print_palette(options: &Options) -> Result<(), RunError> {
    // Input
    let image = time!("Image loading", options.verbose, load_image(&options.image))?;
    if options.verbose {
        let (width, height) = image.dimensions();
        println!("Loaded a {width}x{height} image");
    }
    let image = image.into_rgba8();

    // Processing
    let colors = {
        let start = Instant::now();
        let result = palette_colors(&image, options);
        if options.verbose {
            println!(
                "Palette generation took {}ms in total",
                start.elapsed().as_millis()
            );
        }
        result?
    };

    // Output
    println!("{}", palette_text(&colors, options));

    Ok(())
}

/// Load the image at the given path
#[cfg(feature = "avif")]
fn load_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    if path.extension().map_or(false, |ext| ext == "avif") {
        let buf = std::fs::read(path).map_err(ImageLoadError::AvifRead)?;
        libavif_image::read(&buf).map_err(ImageLoadError::AvifDecode)
    } else {
        image::open(path).map_err(ImageLoadError::ImageLoad)
    }
}

/// Load the image at the given path
#[cfg(not(feature = "avif"))]
fn load_image(path: &Path) -> Result<DynamicImage, ImageLoadError> {
    image::open(path).map_err(ImageLoadError::ImageLoad)
}

/// Generate the palette colors for the given image and options, in print order
fn palette_colors(image: &RgbaImage, options: &Options) -> Result<Vec<Srgb<u8>>, ClusterError> {
    let Options {
        k,
        max_iter,
        max_dimension,
        alpha_threshold,
        verbose,
        reverse,
        ..
    } = *options;

    let sampler = Sampler::new()
        .with_max_dimension(max_dimension)
        .with_alpha_threshold(alpha_threshold);

    if verbose {
        let (width, height) = sampler.scaled_dimensions(image.width(), image.height());
        println!("Sampling from a {width}x{height} image");
    }

    let points = time!("Sampling", verbose, sampler.sample(image));

    if verbose {
        println!("Kept {} opaque sample points", points.len());
    }

    let result = time!("k-means", verbose, kmeans::run(&points, k, max_iter))?;

    if verbose {
        println!("k-means ran for {} iterations", result.iterations);
        let counts = result
            .centroids
            .iter()
            .map(|centroid| centroid.count.to_string())
            .collect::<Vec<_>>();
        println!("Points per color: {}", counts.join(" "));
    }

    let mut colors = result.colors().collect::<Vec<_>>();
    if reverse {
        colors.reverse();
    }

    Ok(colors)
}

/// Render the given colors based off the provided options
fn palette_text(colors: &[Srgb<u8>], options: &Options) -> String {
    let format = options.output.color_format();

    if options.css {
        let palette = format_colors(colors.iter().copied(), format.unwrap_or(ColorFormat::Hex));
        return css_variables(&palette);
    }

    match format {
        Some(format) => colorized_line(colors, options.colorize, |color| format.format(color)),
        None => line(colors, "", |color| {
            "   "
                .on_truecolor(color.red, color.green, color.blue)
                .to_string()
        }),
    }
}

/// Join the formatted colors into a single line
fn line(colors: &[Srgb<u8>], delimiter: &str, format: impl Fn(Srgb<u8>) -> String) -> String {
    colors
        .iter()
        .map(|&color| format(color))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Format and then colorize the text for all colors
fn colorized_line(
    colors: &[Srgb<u8>],
    colorize: Option<ColorizeOutput>,
    format: impl Fn(Srgb<u8>) -> String,
) -> String {
    match colorize {
        Some(ColorizeOutput::Fg) => line(colors, " ", |color| {
            format(color)
                .truecolor(color.red, color.green, color.blue)
                .to_string()
        }),

        Some(ColorizeOutput::Bg) => line(colors, " ", |color| {
            let text = contrast_text_for(color).srgb();
            format(color)
                .truecolor(text.red, text.green, text.blue)
                .on_truecolor(color.red, color.green, color.blue)
                .to_string()
        }),

        None => line(colors, " ", format),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::path::PathBuf;

    fn options(args: &[&str]) -> Options {
        Options::try_parse_from(["pixel-colors", "image.png"].iter().chain(args)).unwrap()
    }

    /// Left three quarters orange, right quarter teal, bottom row transparent
    fn test_image() -> RgbaImage {
        RgbaImage::from_fn(40, 11, |x, y| {
            if y == 10 {
                Rgba([255, 255, 255, 0])
            } else if x < 30 {
                Rgba([255, 128, 0, 255])
            } else {
                Rgba([0, 128, 128, 255])
            }
        })
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = load_image(&PathBuf::from("does/not/exist.png"));
        assert!(matches!(result, Err(ImageLoadError::ImageLoad(_))));
    }

    #[test]
    #[cfg(feature = "png")]
    fn load_png() {
        let path = std::env::temp_dir().join(format!("pixel-colors-test-{}.png", std::process::id()));
        test_image().save(&path).unwrap();
        let loaded = load_image(&path);
        std::fs::remove_file(&path).unwrap();

        let loaded = loaded.unwrap().into_rgba8();
        assert_eq!(loaded, test_image());

        let colors = palette_colors(&loaded, &options(&["-k", "2"])).unwrap();
        assert_eq!(colors, vec![Srgb::new(255, 128, 0), Srgb::new(0, 128, 128)]);
    }

    #[test]
    fn colors_in_frequency_order() {
        let colors = palette_colors(&test_image(), &options(&["-k", "3"])).unwrap();
        assert_eq!(
            colors,
            vec![Srgb::new(255, 128, 0), Srgb::new(0, 128, 128), Srgb::new(255, 128, 0)]
        );

        let reversed = palette_colors(&test_image(), &options(&["-k", "2", "-r"])).unwrap();
        assert_eq!(reversed, vec![Srgb::new(0, 128, 128), Srgb::new(255, 128, 0)]);
    }

    #[test]
    fn transparent_pixels_count_with_low_threshold() {
        let opaque = palette_colors(&test_image(), &options(&["-k", "1"])).unwrap();
        assert_eq!(opaque, vec![Srgb::new(191, 128, 32)]);

        let all = palette_colors(&test_image(), &options(&["-k", "1", "-a", "0"])).unwrap();
        assert_eq!(all, vec![Srgb::new(197, 140, 52)]);
    }

    #[test]
    fn text_formats() {
        let colors = [Srgb::new(255, 0, 0), Srgb::new(0, 0, 0)];

        assert_eq!(palette_text(&colors, &options(&[])), "#ff0000 #000000");
        assert_eq!(
            palette_text(&colors, &options(&["-o", "rgb"])),
            "rgb(255, 0, 0) rgb(0, 0, 0)"
        );
        assert_eq!(
            palette_text(&colors, &options(&["-o", "oklch"])),
            "oklch(62.80% 0.2577 29.23) oklch(0.00% 0.0000 0.00)"
        );
    }

    #[test]
    fn css_output() {
        let colors = [Srgb::new(255, 0, 0), Srgb::new(0, 0, 0)];

        assert_eq!(
            palette_text(&colors, &options(&["--css", "-o", "rgb"])),
            ":root {\n  --color-1: rgb(255, 0, 0);\n  --color-2: rgb(0, 0, 0);\n}"
        );
        assert_eq!(
            palette_text(&colors, &options(&["--css", "-o", "swatch"])),
            ":root {\n  --color-1: #ff0000;\n  --color-2: #000000;\n}"
        );
    }
}
