//! Minimal text drawing: system font lookup plus glyph outlines filled
//! with tiny-skia. No shaping or kerning; card text is short and uppercase.

use once_cell::sync::Lazy;
use resvg::tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

static FONT_DB: Lazy<fontdb::Database> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    log::debug!("loaded {} font faces", db.len());
    db
});

const PREFERRED_FAMILIES: [fontdb::Family<'static>; 2] =
    [fontdb::Family::Name("Outfit"), fontdb::Family::SansSerif];

/// Converts ttf-parser glyph outlines to tiny-skia paths, in font units.
struct GlyphOutlineBuilder(PathBuilder);

impl ttf_parser::OutlineBuilder for GlyphOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close();
    }
}

fn glyph_path(face: &ttf_parser::Face<'_>, glyph: ttf_parser::GlyphId) -> Option<Path> {
    let mut builder = GlyphOutlineBuilder(PathBuilder::new());
    face.outline_glyph(glyph, &mut builder)?;
    builder.0.finish()
}

/// Run `f` with the bold card face. `None` when the system has no usable
/// font; callers skip the text in that case.
pub fn with_bold_face<R>(f: impl FnOnce(&ttf_parser::Face<'_>) -> R) -> Option<R> {
    let query = fontdb::Query {
        families: &PREFERRED_FAMILIES,
        weight: fontdb::Weight::BOLD,
        ..fontdb::Query::default()
    };
    let id = FONT_DB.query(&query)?;

    FONT_DB
        .with_face_data(id, |data, index| {
            ttf_parser::Face::parse(data, index).ok().map(|face| f(&face))
        })
        .flatten()
}

fn scale_for(face: &ttf_parser::Face<'_>, size: f32) -> f32 {
    size / face.units_per_em() as f32
}

/// Advance width of `text` at `size` pixels.
pub fn measure(face: &ttf_parser::Face<'_>, text: &str, size: f32) -> f32 {
    let scale = scale_for(face, size);
    text.chars()
        .filter_map(|c| face.glyph_index(c))
        .map(|glyph| face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale)
        .sum()
}

/// Draw `text` with its left edge at `x` and the top of the ascender at `top`.
pub fn fill_text(
    pixmap: &mut Pixmap,
    face: &ttf_parser::Face<'_>,
    text: &str,
    size: f32,
    x: f32,
    top: f32,
    paint: &Paint<'_>,
) {
    let scale = scale_for(face, size);
    let baseline = top + face.ascender() as f32 * scale;
    let mut pen_x = x;

    for c in text.chars() {
        let Some(glyph) = face.glyph_index(c) else {
            continue;
        };

        if let Some(path) = glyph_path(face, glyph) {
            // font units are y-up
            let transform = Transform::from_row(scale, 0.0, 0.0, -scale, pen_x, baseline);
            pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
        }

        pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
    }
}
