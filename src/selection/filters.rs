//! Cheap checks that run before an image is loaded.

use super::trace::RejectReason;
use super::types::Zone;
use crate::config::CompiledHeuristics;
use crate::metadata::Ancestor;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Pages with at most this many images are treated as minimal sites.
pub const MINIMAL_SITE_IMAGES: usize = 3;

static WWW_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^www\.").expect("static regex"));
static TLD_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.[a-z]{2,}$").expect("static regex"));

pub fn is_minimal_site(image_count: usize) -> bool {
    image_count <= MINIMAL_SITE_IMAGES
}

/// First denylisted keyword contained in `filename`.
pub fn excluded_keyword<'h>(filename: &str, heuristics: &'h CompiledHeuristics) -> Option<&'h str> {
    heuristics
        .excluded_keywords
        .iter()
        .find(|keyword| filename.contains(keyword.as_str()))
        .map(String::as_str)
}

/// Walk the ancestors nearest first.
///
/// Article/main tags set the zone at any depth. Id/class text is only
/// consulted while no zone has been found yet, so a content match never
/// overrides an inner article and an excluded id/class above a content area
/// does not reject the image.
pub fn classify_zone(
    ancestors: &[Ancestor],
    heuristics: &CompiledHeuristics,
) -> Result<Zone, RejectReason> {
    let mut zone = Zone::None;

    for ancestor in ancestors {
        if heuristics.excluded_tags.contains(&ancestor.tag) {
            return Err(RejectReason::ExcludedTag {
                tag: ancestor.tag.clone(),
            });
        }

        if heuristics.article_tags.contains(&ancestor.tag) {
            zone = Zone::ArticleMain;
        } else if zone == Zone::None {
            if heuristics.excluded_zone.is_match(&ancestor.id_class) {
                return Err(RejectReason::ExcludedZone {
                    id_class: ancestor.id_class.trim().to_string(),
                });
            }
            if heuristics.content_zone.is_match(&ancestor.id_class) {
                zone = Zone::Content;
            }
        }
    }

    Ok(zone)
}

/// Bare site name used for filename matching: `www.` and the last label
/// removed, lowercased. `www.example.co.uk` gives `example.co`.
pub fn domain_token(page_url: &Url) -> String {
    let host = page_url.host_str().unwrap_or_default();
    let host = WWW_PREFIX.replace(host, "");
    TLD_SUFFIX.replace(&host, "").to_lowercase()
}
