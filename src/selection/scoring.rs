use super::trace::{TraceEvent, TraceSink};
use super::types::{Format, ImageCandidate, ImageSource, Origin, ScoreBreakdown, ScoredCandidate, Zone};
use crate::config::CompiledHeuristics;
use crate::metadata::normalize::filename_of;

/// Width/height ratio of a standard link preview card.
pub const IDEAL_ASPECT_RATIO: f64 = 1.91;

const AREA_DIVISOR: f64 = 2000.0;
const AREA_CAP: f64 = 1000.0;
const ASPECT_BASE: f64 = 1000.0;
const ASPECT_SLOPE: f64 = 500.0;

const NON_EDITORIAL_PENALTY: f64 = -2000.0;
const UI_ELEMENT_PENALTY: f64 = -1000.0;
const SECTION_PATH_PENALTY: f64 = -1500.0;

const MINIMAL_POOL_BONUS: f64 = 1500.0;
const LARGEST_BONUS: f64 = 300.0;
const MINIMAL_POOL_SIZE: usize = 3;

fn format_weight(format: Format) -> f64 {
    match format {
        Format::Svg => 2000.0,
        Format::Png => 1000.0,
        Format::Jpg => 500.0,
    }
}

fn zone_weight(zone: Zone) -> f64 {
    match zone {
        Zone::ArticleMain => 3000.0,
        Zone::Content => 2000.0,
        Zone::None => 0.0,
    }
}

fn origin_weight(origin: Origin) -> f64 {
    match origin {
        Origin::DomainMatch => 200.0,
        Origin::PageScan | Origin::DeclaredPreview => 0.0,
    }
}

/// At most one penalty, checked in severity order. Declared previews and
/// inline images have no filename to judge.
fn filename_penalty(candidate: &ImageCandidate, heuristics: &CompiledHeuristics) -> f64 {
    if candidate.origin == Origin::DeclaredPreview {
        return 0.0;
    }
    let ImageSource::Url(url) = &candidate.source else {
        return 0.0;
    };

    let filename = filename_of(url);
    if heuristics.non_editorial.is_match(&filename) {
        NON_EDITORIAL_PENALTY
    } else if heuristics.ui_element.is_match(&filename) {
        UI_ELEMENT_PENALTY
    } else if heuristics.section_path.is_match(&url.to_lowercase()) {
        SECTION_PATH_PENALTY
    } else {
        0.0
    }
}

/// Score one candidate against the whole pool it competes in.
pub fn score(
    candidate: &ImageCandidate,
    pool: &[ImageCandidate],
    heuristics: &CompiledHeuristics,
) -> ScoreBreakdown {
    let area = (candidate.area() as f64 / AREA_DIVISOR).min(AREA_CAP);
    let aspect =
        (ASPECT_BASE - ASPECT_SLOPE * (candidate.aspect_ratio() - IDEAL_ASPECT_RATIO).abs()).max(0.0);

    let mut prominence = 0.0;
    if (1..=MINIMAL_POOL_SIZE).contains(&pool.len()) {
        prominence += MINIMAL_POOL_BONUS;
    }
    let max_area = pool.iter().map(ImageCandidate::area).max().unwrap_or(0);
    if candidate.area() == max_area {
        prominence += LARGEST_BONUS;
    }

    ScoreBreakdown {
        area,
        aspect,
        format: format_weight(candidate.format),
        zone: zone_weight(candidate.zone),
        origin: origin_weight(candidate.origin),
        filename_penalty: filename_penalty(candidate, heuristics),
        prominence,
    }
}

/// Score every candidate and order best first. The sort is stable, so
/// equal scores keep pool order.
pub fn rank(
    pool: &[ImageCandidate],
    heuristics: &CompiledHeuristics,
    sink: &dyn TraceSink,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = pool
        .iter()
        .map(|candidate| {
            let breakdown = score(candidate, pool, heuristics);
            sink.record(TraceEvent::Scored {
                source: candidate.source.label(),
                breakdown,
                total: breakdown.total(),
            });
            ScoredCandidate {
                candidate: candidate.clone(),
                breakdown,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::trace::LogSink;

    fn candidate(url: &str, width: u32, height: u32, origin: Origin) -> ImageCandidate {
        ImageCandidate {
            source: ImageSource::Url(url.into()),
            width,
            height,
            format: Format::from_reference(url),
            origin,
            zone: Zone::None,
        }
    }

    fn h() -> CompiledHeuristics {
        CompiledHeuristics::default()
    }

    #[test]
    fn test_terms_for_ideal_image() {
        let c = candidate("https://a.com/photo.jpg", 1910, 1000, Origin::PageScan);
        let b = score(&c, std::slice::from_ref(&c), &h());
        assert_eq!(b.area, 955.0);
        assert!((b.aspect - 1000.0).abs() < 1e-9);
        assert_eq!(b.format, 500.0);
        assert_eq!(b.zone, 0.0);
        assert_eq!(b.origin, 0.0);
        assert_eq!(b.filename_penalty, 0.0);
        assert_eq!(b.prominence, 1800.0);
    }

    #[test]
    fn test_area_term_capped() {
        let c = candidate("https://a.com/photo.jpg", 4000, 2000, Origin::PageScan);
        assert_eq!(score(&c, &[], &h()).area, 1000.0);
    }

    #[test]
    fn test_aspect_term_floored() {
        let wide = candidate("https://a.com/photo.jpg", 300, 100, Origin::PageScan);
        assert!((score(&wide, &[], &h()).aspect - 455.0).abs() < 1e-6);

        // never reachable through validation, but the term must not go negative
        let extreme = candidate("https://a.com/photo.jpg", 1000, 100, Origin::PageScan);
        assert_eq!(score(&extreme, &[], &h()).aspect, 0.0);
    }

    #[test]
    fn test_penalty_priority() {
        let penalty = |url: &str| score(&candidate(url, 800, 400, Origin::PageScan), &[], &h()).filename_penalty;

        assert_eq!(penalty("https://a.com/img/author-photo.jpg"), -2000.0);
        assert_eq!(penalty("https://a.com/img/logo-banner.jpg"), -2000.0);
        assert_eq!(penalty("https://a.com/img/promo-banner.jpg"), -1000.0);
        assert_eq!(penalty("https://a.com/img/square480.jpg"), -1000.0);
        assert_eq!(penalty("https://a.com/podcasts/cover.jpg"), -1500.0);
        assert_eq!(penalty("https://a.com/img/story.jpg"), 0.0);
    }

    #[test]
    fn test_no_penalty_for_declared_preview() {
        let c = candidate("https://a.com/logo.png", 800, 400, Origin::DeclaredPreview);
        assert_eq!(score(&c, &[], &h()).filename_penalty, 0.0);
    }

    #[test]
    fn test_prominence_pool_relative() {
        let pool: Vec<_> = (0..4)
            .map(|i| candidate(&format!("https://a.com/{i}.jpg"), 400 + i * 10, 200, Origin::PageScan))
            .collect();
        let largest = score(&pool[3], &pool, &h());
        let smaller = score(&pool[0], &pool, &h());
        assert_eq!(largest.prominence, 300.0);
        assert_eq!(smaller.prominence, 0.0);
    }

    #[test]
    fn test_weights_by_variant() {
        let mut c = candidate("https://a.com/x.svg", 800, 400, Origin::DomainMatch);
        c.zone = Zone::Content;
        let b = score(&c, &[], &h());
        assert_eq!(b.format, 2000.0);
        assert_eq!(b.zone, 2000.0);
        assert_eq!(b.origin, 200.0);
    }

    #[test]
    fn test_rank_is_stable() {
        let pool = vec![
            candidate("https://a.com/first.jpg", 800, 400, Origin::PageScan),
            candidate("https://a.com/second.jpg", 800, 400, Origin::PageScan),
        ];
        let ranked = rank(&pool, &h(), &LogSink);
        assert_eq!(ranked[0].score(), ranked[1].score());
        assert_eq!(ranked[0].candidate.source.key(), "https://a.com/first.jpg");
    }
}
