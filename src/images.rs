//! Raster helpers shared by the selection and card pipelines.
//!
//! Handles reading dimensions, rasterizing SVG, cropping to the thumbnail
//! size and encoding PNG / data URLs.

use anyhow::{Context, Result};
use base64::Engine;
use image::{imageops::FilterType, GenericImageView, ImageFormat, ImageReader, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::io::Cursor;

pub const THUMB_WIDTH: u32 = 200;
pub const THUMB_HEIGHT: u32 = 112;

/// SVGs are rendered at least this wide so crops stay sharp.
pub const SVG_RASTER_SIZE: u32 = 1200;

/// Longest side of any rasterized SVG, whatever size it declares.
pub const MAX_SVG_RASTER_SIDE: u32 = 4096;

const THUMB_BACKGROUND: Rgba<u8> = Rgba([0xf5, 0xf5, 0xf5, 255]);
const PLACEHOLDER_BACKGROUND: Rgba<u8> = Rgba([0xf5, 0xf5, 0xf7, 255]);

/// Check if bytes look like an HTML page rather than an image.
///
/// Servers answering image URLs with an error page is common enough that
/// this runs before any decoder.
pub fn is_html_content(bytes: &[u8]) -> bool {
    let check_len = bytes.len().min(512);
    let prefix = String::from_utf8_lossy(&bytes[..check_len]).to_lowercase();
    let trimmed = prefix.trim_start();

    trimmed.starts_with("<!doctype html") || trimmed.starts_with("<html") || trimmed.contains("<body")
}

pub fn is_svg_content(bytes: &[u8]) -> bool {
    let check_len = bytes.len().min(1024);
    let prefix = String::from_utf8_lossy(&bytes[..check_len]).to_lowercase();
    let trimmed = prefix.trim_start_matches('\u{feff}').trim_start();

    trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && prefix.contains("<svg"))
}

fn parse_svg(data: &[u8]) -> Result<usvg::Tree> {
    usvg::Tree::from_data(data, &usvg::Options::default()).context("Failed to parse SVG")
}

/// Get image dimensions without fully decoding
pub fn get_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if is_html_content(data) {
        anyhow::bail!("Got an HTML page instead of an image");
    }

    if is_svg_content(data) {
        let size = parse_svg(data)?.size();
        return Ok((size.width().round() as u32, size.height().round() as u32));
    }

    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to read image header")?
        .into_dimensions()
        .context("Failed to decode image for dimensions")
}

/// File extension for saving raw image bytes, `png` when unknown.
pub fn file_extension(data: &[u8]) -> &'static str {
    if is_svg_content(data) {
        return "svg";
    }
    infer::get(data)
        .map(|ftype| ftype.extension())
        .unwrap_or("png")
}

/// Render an SVG to RGBA, scaled up so the width is at least `min_width`.
///
/// The longest side is capped at [`MAX_SVG_RASTER_SIDE`], scaling down when
/// the declared size is larger.
pub fn rasterize_svg(data: &[u8], min_width: u32) -> Result<RgbaImage> {
    let tree = parse_svg(data)?;
    let size = tree.size();

    let longest = size.width().max(size.height());
    let scale = (min_width as f32 / size.width())
        .max(1.0)
        .min(MAX_SVG_RASTER_SIDE as f32 / longest);
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).context("SVG raster size is invalid")?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    Ok(pixmap_to_rgba(&pixmap))
}

pub fn pixmap_to_rgba(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Decode any supported raster or SVG into RGBA.
pub fn decode(data: &[u8]) -> Result<RgbaImage> {
    if is_html_content(data) {
        anyhow::bail!("Got an HTML page instead of an image");
    }

    if is_svg_content(data) {
        return rasterize_svg(data, SVG_RASTER_SIZE);
    }

    let img = image::load_from_memory(data).context("Failed to decode image")?;
    Ok(img.to_rgba8())
}

/// Center-crop to fill `THUMB_WIDTH` x `THUMB_HEIGHT`, over a light gray
/// background so transparent images stay readable.
pub fn crop_to_thumbnail(img: &RgbaImage) -> RgbaImage {
    let (source_width, source_height) = img.dimensions();

    let mut thumb = RgbaImage::from_pixel(THUMB_WIDTH, THUMB_HEIGHT, THUMB_BACKGROUND);
    if source_width == 0 || source_height == 0 {
        return thumb;
    }

    let scale = f64::max(
        THUMB_WIDTH as f64 / source_width as f64,
        THUMB_HEIGHT as f64 / source_height as f64,
    );
    let crop_width = ((THUMB_WIDTH as f64 / scale).round() as u32).clamp(1, source_width);
    let crop_height = ((THUMB_HEIGHT as f64 / scale).round() as u32).clamp(1, source_height);
    let crop_x = (source_width - crop_width) / 2;
    let crop_y = (source_height - crop_height) / 2;

    let cropped = img.view(crop_x, crop_y, crop_width, crop_height).to_image();
    let resized = image::imageops::resize(&cropped, THUMB_WIDTH, THUMB_HEIGHT, FilterType::Triangle);
    image::imageops::overlay(&mut thumb, &resized, 0, 0);

    thumb
}

/// Neutral thumbnail used when the chosen image cannot be loaded.
pub fn placeholder_thumbnail() -> RgbaImage {
    RgbaImage::from_pixel(THUMB_WIDTH, THUMB_HEIGHT, PLACEHOLDER_BACKGROUND)
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buf)
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Split a base64 `data:` URL into its mime type and decoded bytes.
pub fn decode_data_url(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.trim().strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;

    Some((mime.to_ascii_lowercase(), bytes))
}
