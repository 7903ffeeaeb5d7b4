//! Cards built from a site's icon.
//!
//! The icon's edge color becomes the card background, its dominant center
//! color decides the border, and the icon itself is drawn centered.

use super::border::MatBorder;
use super::{CARD_HEIGHT, CARD_WIDTH};
use crate::colors::{wcag_luminance, Rgb};
use crate::config::TieBreak;
use crate::images;
use crate::scrape::Fetcher;
use image::{imageops::FilterType, RgbaImage};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

/// Samples at or below this alpha are treated as transparent.
const OPAQUE_ALPHA: u8 = 200;

/// Summed channel difference under which two colors read as the same.
const SAME_COLOR_DISTANCE: u32 = 50;

const QUANTIZE_STEP: f64 = 32.0;

/// Share of each card dimension the icon may occupy.
const ICON_FILL: f64 = 0.65;

const LIGHT_NEUTRAL: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);
const DARK_NEUTRAL: Rgb = Rgb::new(0x44, 0x44, 0x44);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandPalette {
    pub background: String,
    pub logo: String,
    pub border: String,
}

/// Counts colors, remembering the order they were first seen in.
#[derive(Default)]
struct Histogram {
    counts: HashMap<Rgb, (usize, usize)>,
}

impl Histogram {
    fn add(&mut self, color: Rgb) {
        let next = self.counts.len();
        self.counts.entry(color).or_insert((next, 0)).1 += 1;
    }

    /// Most frequent colors, in first-seen order.
    fn dominant(&self) -> Vec<Rgb> {
        let Some(max) = self.counts.values().map(|(_, count)| *count).max() else {
            return Vec::new();
        };

        let mut tied: Vec<(usize, Rgb)> = self
            .counts
            .iter()
            .filter(|(_, (_, count))| *count == max)
            .map(|(color, (order, _))| (*order, *color))
            .collect();
        tied.sort_by_key(|(order, _)| *order);
        tied.into_iter().map(|(_, color)| color).collect()
    }
}

fn quantize(channel: u8) -> u8 {
    ((channel as f64 / QUANTIZE_STEP).round() * QUANTIZE_STEP).min(255.0) as u8
}

/// Most common opaque color among the four corners and four edge midpoints.
pub fn background_color(icon: &RgbaImage) -> Rgb {
    let (w, h) = icon.dimensions();
    if w == 0 || h == 0 {
        return Rgb::WHITE;
    }

    let positions = [
        (0, 0),
        (w - 1, 0),
        (0, h - 1),
        (w - 1, h - 1),
        (w / 2, 0),
        (w / 2, h - 1),
        (0, h / 2),
        (w - 1, h / 2),
    ];

    let mut histogram = Histogram::default();
    for (x, y) in positions {
        let [r, g, b, a] = icon.get_pixel(x, y).0;
        if a > OPAQUE_ALPHA {
            histogram.add(Rgb::new(r, g, b));
        }
    }

    histogram.dominant().first().copied().unwrap_or(Rgb::WHITE)
}

/// Dominant quantized color in the central half of the icon, ignoring
/// pixels close to `background`.
pub fn logo_color(icon: &RgbaImage, background: Rgb, tie_break: TieBreak) -> Rgb {
    let (w, h) = icon.dimensions();
    let x0 = (w as f64 * 0.25).floor() as u32;
    let y0 = (h as f64 * 0.25).floor() as u32;
    let region_w = (w as f64 * 0.5).floor() as u32;
    let region_h = (h as f64 * 0.5).floor() as u32;

    let mut histogram = Histogram::default();

    // every 4th pixel of the region, row-major
    let total = region_w as usize * region_h as usize;
    for i in (0..total).step_by(4) {
        let x = x0 + (i % region_w as usize) as u32;
        let y = y0 + (i / region_w as usize) as u32;
        let [r, g, b, a] = icon.get_pixel(x, y).0;
        if a <= OPAQUE_ALPHA {
            continue;
        }

        let sample = Rgb::new(r, g, b);
        if sample.channel_distance(background) < SAME_COLOR_DISTANCE {
            continue;
        }

        histogram.add(Rgb::new(quantize(r), quantize(g), quantize(b)));
    }

    let tied = histogram.dominant();
    let picked = match tie_break {
        TieBreak::First => tied.first(),
        TieBreak::Random if tied.is_empty() => None,
        TieBreak::Random => tied.get(rand::rng().random_range(0..tied.len())),
    };

    picked.copied().unwrap_or(Rgb::WHITE)
}

/// Logo color, unless it is indistinguishable from the background; then a
/// neutral gray picked by background brightness.
pub fn border_color(background: Rgb, logo: Rgb) -> Rgb {
    if background.channel_distance(logo) >= SAME_COLOR_DISTANCE {
        return logo;
    }

    if wcag_luminance(background) > 0.5 {
        LIGHT_NEUTRAL
    } else {
        DARK_NEUTRAL
    }
}

pub fn analyze_icon(icon: &RgbaImage, tie_break: TieBreak) -> BrandPalette {
    let background = background_color(icon);
    let logo = logo_color(icon, background, tie_break);
    let border = border_color(background, logo);

    log::debug!(
        "icon palette: background {}, logo {}, border {}",
        background.to_hex(),
        logo.to_hex(),
        border.to_hex()
    );

    BrandPalette {
        background: background.to_hex(),
        logo: logo.to_hex(),
        border: border.to_hex(),
    }
}

/// Icon centered on its background color, scaled to fill 65% of the card
/// in the tighter dimension.
pub fn compose(icon: &RgbaImage, background: Rgb) -> RgbaImage {
    let mut card = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, background.to_rgba());

    let (w, h) = icon.dimensions();
    if w == 0 || h == 0 {
        return card;
    }

    let max_w = CARD_WIDTH as f64 * ICON_FILL;
    let max_h = CARD_HEIGHT as f64 * ICON_FILL;
    let scale = f64::min(max_w / w as f64, max_h / h as f64);
    let draw_w = ((w as f64 * scale).round() as u32).max(1);
    let draw_h = ((h as f64 * scale).round() as u32).max(1);

    let scaled = image::imageops::resize(icon, draw_w, draw_h, FilterType::Lanczos3);
    let x = (CARD_WIDTH as i64 - draw_w as i64) / 2;
    let y = (CARD_HEIGHT as i64 - draw_h as i64) / 2;
    image::imageops::overlay(&mut card, &scaled, x, y);

    card
}

/// An unbordered brand card and the border color to frame it with.
#[derive(Debug, Clone)]
pub struct BrandCard {
    pub image: RgbaImage,
    pub palette: BrandPalette,
}

impl BrandCard {
    pub fn from_icon(icon: &RgbaImage, tie_break: TieBreak) -> Self {
        let palette = analyze_icon(icon, tie_break);
        let background = crate::colors::hex_to_rgb(&palette.background);
        Self {
            image: compose(icon, background),
            palette,
        }
    }

    pub fn border(&self) -> Rgb {
        crate::colors::hex_to_rgb(&self.palette.border)
    }

    /// Full-size card with the wide mat frame.
    pub fn framed(&self) -> RgbaImage {
        let mut framed = self.image.clone();
        MatBorder::FULL_SIZE.apply(&mut framed, self.border());
        framed
    }
}

/// Fetch and decode the site icon. `None` on any failure.
pub async fn fetch_icon(fetcher: &dyn Fetcher, icon_url: &str) -> Option<RgbaImage> {
    let bytes = match fetcher.fetch(icon_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            log::info!("icon fetch failed: {err}");
            return None;
        }
    };

    match images::decode(&bytes) {
        Ok(icon) => Some(icon),
        Err(err) => {
            log::info!("icon decode failed: {err:#}");
            None
        }
    }
}

pub async fn build_brand_card(
    fetcher: &dyn Fetcher,
    icon_url: &str,
    tie_break: TieBreak,
) -> Option<BrandCard> {
    let icon = fetch_icon(fetcher, icon_url).await?;
    Some(BrandCard::from_icon(&icon, tie_break))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn blue_with_red_square() -> RgbaImage {
        RgbaImage::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) {
                RED
            } else {
                BLUE
            }
        })
    }

    #[test]
    fn test_background_and_logo_separate() {
        let palette = analyze_icon(&blue_with_red_square(), TieBreak::First);
        assert_eq!(palette.background, "#0000ff");
        assert_eq!(palette.logo, "#ff0000");
        assert_eq!(palette.border, "#ff0000");
    }

    #[test]
    fn test_transparent_icon_defaults_to_white() {
        let icon = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
        let palette = analyze_icon(&icon, TieBreak::First);
        assert_eq!(palette.background, "#ffffff");
        assert_eq!(palette.logo, "#ffffff");
    }

    #[test]
    fn test_background_majority_wins() {
        let icon = RgbaImage::from_fn(10, 10, |x, _| if x == 0 { RED } else { BLUE });
        // left column: 3 red samples, remaining 5 blue
        assert_eq!(background_color(&icon), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_background_tie_prefers_first_seen() {
        // 4 red samples (top row plus left midpoint) vs 4 blue
        let icon = RgbaImage::from_fn(9, 9, |x, y| {
            if y == 0 || (x == 0 && y == 4) {
                RED
            } else {
                BLUE
            }
        });
        assert_eq!(background_color(&icon), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_logo_tie_first_is_deterministic() {
        let icon = RgbaImage::from_fn(64, 64, |x, _| if x < 32 { RED } else { BLUE });
        let white = Rgb::WHITE;
        let first = logo_color(&icon, white, TieBreak::First);
        for _ in 0..5 {
            assert_eq!(logo_color(&icon, white, TieBreak::First), first);
        }
    }

    #[test]
    fn test_logo_tie_random_picks_a_tied_color() {
        let icon = RgbaImage::from_fn(64, 64, |x, _| if x < 32 { RED } else { BLUE });
        let picked = logo_color(&icon, Rgb::WHITE, TieBreak::Random);
        assert!(picked == Rgb::new(255, 0, 0) || picked == Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(15), 0);
        assert_eq!(quantize(16), 32);
        assert_eq!(quantize(255), 255);
        assert_eq!(quantize(130), 128);
    }

    #[test]
    fn test_near_identical_colors_use_neutral() {
        let border = border_color(Rgb::new(0x80, 0x80, 0x80), Rgb::new(0x82, 0x82, 0x82));
        assert_eq!(border, DARK_NEUTRAL);

        let light = border_color(Rgb::new(0xf0, 0xf0, 0xf0), Rgb::new(0xf2, 0xf2, 0xf2));
        assert_eq!(light, LIGHT_NEUTRAL);
    }

    #[test]
    fn test_compose_centers_icon() {
        let card = compose(&blue_with_red_square(), Rgb::new(0, 0, 255));
        assert_eq!(card.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        let [r, g, b, _] = card.get_pixel(600, 315).0;
        assert!(r > 250 && g < 5 && b < 5);
        assert_eq!(card.get_pixel(5, 5), &BLUE);
    }

    #[test]
    fn test_framed_adds_border() {
        let card = BrandCard::from_icon(&blue_with_red_square(), TieBreak::First);
        let framed = card.framed();
        assert_eq!(framed.get_pixel(18, 18), &RED);
        assert_eq!(card.image.get_pixel(18, 18), &BLUE);
    }
}
