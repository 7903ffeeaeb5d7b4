//! The terminal fallback card: a frame, a photo glyph, the wordmark and
//! the site's domain. Everything is drawn locally so it cannot fail.

use super::text::{fill_text, measure, with_bold_face};
use super::{CARD_HEIGHT, CARD_WIDTH};
use crate::colors::{hex_to_rgb, Rgb};
use once_cell::sync::Lazy;
use regex::Regex;
use resvg::{
    tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform},
    usvg,
};

const TEAL: &str = "#225560";
const YELLOW: &str = "#fdca40";
const GREEN: &str = "#179355";

const FRAME_INSET: f32 = 8.0;
const FRAME_WIDTH: f32 = 16.0;

const ICON_POS: f32 = 60.0;
const ICON_SIZE: u32 = 140;

const WORDMARK_SIZE: f32 = 110.0;
const WORDMARK_TOP: f32 = 60.0;
const WORDMARK_RIGHT: f32 = CARD_WIDTH as f32 - 60.0;

const DOMAIN_TOP: f32 = 470.0;
const DOMAIN_MAX_WIDTH: f32 = 1080.0;
const DOMAIN_MIN_SIZE: f32 = 48.0;

static DOMAIN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(www\d*\.|m\.|mobile\.)").expect("static regex"));

fn photo_icon_svg() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{ICON_SIZE}" height="{ICON_SIZE}" viewBox="0 0 24 24" fill="none" stroke="{TEAL}" stroke-width="2.5" stroke-linecap="round" stroke-linejoin="round">
  <path d="M15 8h.01" />
  <path d="M3 6a3 3 0 0 1 3 -3h12a3 3 0 0 1 3 3v12a3 3 0 0 1 -3 3h-12a3 3 0 0 1 -3 -3v-12z" />
  <path d="M3 16l5 -5c.928 -.893 2.072 -.893 3 0l5 5" />
  <path d="M14 14l1 -1c.928 -.893 2.072 -.893 3 0l3 3" />
</svg>"#
    )
}

/// `www.`, `www2.`, `m.` and `mobile.` removed.
pub fn clean_domain(domain: &str) -> String {
    DOMAIN_PREFIX.replace(domain.trim(), "").to_string()
}

/// Starting size for the domain line, by character count.
pub fn domain_font_size(len: usize) -> f32 {
    match len {
        0..=10 => 120.0,
        11..=15 => 100.0,
        16..=20 => 80.0,
        _ => 64.0,
    }
}

/// Shrink `size` so text measuring `width` fits the line, never below 48px.
pub fn fit_font_size(size: f32, width: f32) -> f32 {
    if width <= DOMAIN_MAX_WIDTH {
        return size;
    }
    (size * DOMAIN_MAX_WIDTH / width).floor().max(DOMAIN_MIN_SIZE)
}

fn solid(hex: &str) -> Paint<'static> {
    let Rgb { r, g, b } = hex_to_rgb(hex);
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(r, g, b, 255));
    paint.anti_alias = true;
    paint
}

fn draw_frame(pixmap: &mut Pixmap) {
    let rect = Rect::from_xywh(
        FRAME_INSET,
        FRAME_INSET,
        CARD_WIDTH as f32 - FRAME_INSET * 2.0,
        CARD_HEIGHT as f32 - FRAME_INSET * 2.0,
    )
    .expect("fixed card frame is a valid rect");
    let path = PathBuilder::from_rect(rect);

    let stroke = Stroke {
        width: FRAME_WIDTH,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(TEAL), &stroke, Transform::identity(), None);
}

fn draw_photo_icon(pixmap: &mut Pixmap) {
    match usvg::Tree::from_str(&photo_icon_svg(), &usvg::Options::default()) {
        Ok(tree) => resvg::render(
            &tree,
            Transform::from_translate(ICON_POS, ICON_POS),
            &mut pixmap.as_mut(),
        ),
        Err(err) => log::warn!("photo icon skipped: {err}"),
    }
}

fn draw_text(pixmap: &mut Pixmap, domain_upper: &str) {
    let drawn = with_bold_face(|face| {
        let o_width = measure(face, "O", WORDMARK_SIZE);
        let g_width = measure(face, "G", WORDMARK_SIZE);
        let left = WORDMARK_RIGHT - (o_width + g_width);
        fill_text(pixmap, face, "O", WORDMARK_SIZE, left, WORDMARK_TOP, &solid(YELLOW));
        fill_text(pixmap, face, "G", WORDMARK_SIZE, left + o_width, WORDMARK_TOP, &solid(GREEN));

        let start = domain_font_size(domain_upper.chars().count());
        let size = fit_font_size(start, measure(face, domain_upper, start));
        let width = measure(face, domain_upper, size);
        let x = (CARD_WIDTH as f32 - width) / 2.0;
        fill_text(pixmap, face, domain_upper, size, x, DOMAIN_TOP, &solid(TEAL));
    });

    if drawn.is_none() {
        log::warn!("no system font available, domain card drawn without text");
    }
}

/// Draw the fallback card for `domain`.
pub fn render_domain_card(domain: &str) -> Pixmap {
    let mut pixmap = Pixmap::new(CARD_WIDTH, CARD_HEIGHT).expect("fixed card size is non-zero");
    pixmap.fill(Color::WHITE);

    draw_frame(&mut pixmap);
    draw_photo_icon(&mut pixmap);
    draw_text(&mut pixmap, &clean_domain(domain).to_uppercase());

    pixmap
}

pub fn build_domain_card(domain: &str) -> image::RgbaImage {
    crate::images::pixmap_to_rgba(&render_domain_card(domain))
}
