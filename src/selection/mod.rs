//! Picks the page image that best represents a link.
//!
//! Two scanners run per relaxation tier: one looks for images named after
//! the site, the other walks every image on the page. The first tier that
//! produces anything ends the search. The page's declared preview image is
//! then checked on its own and everything is scored as one pool.

pub mod domain_match;
pub mod filters;
pub mod page_scan;
pub mod scoring;
pub mod trace;
pub mod types;
pub mod validator;

use crate::config::CompiledHeuristics;
use crate::images::decode_data_url;
use crate::metadata::normalize::to_absolute_url;
use crate::metadata::PageDocument;
use trace::{RejectReason, TraceEvent};
use types::{
    Format, ImageCandidate, ImageSource, Origin, Selection, Zone, DECLARED_PREVIEW_TIER, TIERS,
};
use url::Url;
use validator::ValidationContext;

/// Source for a declared preview reference: a `data:` URL or a link
/// resolved against the page.
pub fn declared_source(declared: &str, page_url: &Url) -> Option<ImageSource> {
    if declared.trim_start().starts_with("data:") {
        let (mime, bytes) = decode_data_url(declared)?;
        return Some(ImageSource::Inline {
            mime,
            bytes,
            data_url: declared.trim().to_string(),
        });
    }
    to_absolute_url(declared, page_url).map(ImageSource::Url)
}

/// One selection run over one parsed page.
pub struct Scanner<'a> {
    pub document: &'a PageDocument,
    pub page_url: &'a Url,
    pub heuristics: &'a CompiledHeuristics,
    pub validation: ValidationContext<'a>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        document: &'a PageDocument,
        page_url: &'a Url,
        heuristics: &'a CompiledHeuristics,
        validation: ValidationContext<'a>,
    ) -> Self {
        Self {
            document,
            page_url,
            heuristics,
            validation,
        }
    }

    /// Run tiers in order until one yields a candidate.
    ///
    /// Returns the pool for that tier and its index, or an empty pool if
    /// every tier came up empty.
    pub async fn collect_tiered(&self) -> (Vec<ImageCandidate>, Option<usize>) {
        let mut pool = Vec::new();

        for (index, tier) in TIERS.iter().enumerate() {
            self.validation.sink.record(TraceEvent::TierStarted {
                index,
                label: tier.label.to_string(),
                min_width: tier.min_width,
                min_height: tier.min_height,
            });

            pool.extend(self.scan_domain(tier).await);
            pool.extend(self.scan_page(tier).await);

            if !pool.is_empty() {
                log::debug!("tier {index} ({}) produced {} candidates", tier.label, pool.len());
                return (pool, Some(index));
            }
        }

        (pool, None)
    }

    /// The page's declared preview image, checked against the strictest tier.
    pub async fn declared_candidate(&self, declared: &str) -> Option<ImageCandidate> {
        let Some(source) = declared_source(declared, self.page_url) else {
            self.validation.reject(
                &ImageSource::Url(declared.to_string()),
                Origin::DeclaredPreview,
                RejectReason::Unresolvable,
            );
            return None;
        };

        let (width, height) = self
            .validation
            .validate(
                &source,
                Origin::DeclaredPreview,
                DECLARED_PREVIEW_TIER.min_width,
                DECLARED_PREVIEW_TIER.min_height,
            )
            .await?;

        let format = match &source {
            ImageSource::Inline { mime, .. } => Format::from_mime(mime),
            ImageSource::Url(url) => Format::from_reference(url),
        };

        Some(ImageCandidate {
            source,
            width,
            height,
            format,
            origin: Origin::DeclaredPreview,
            zone: Zone::None,
        })
    }

    /// Full selection: tiered scan, declared preview, scoring.
    pub async fn select(&self, declared: Option<&str>) -> Selection {
        let (mut pool, tier) = self.collect_tiered().await;

        if let Some(declared) = declared {
            if let Some(candidate) = self.declared_candidate(declared).await {
                pool.push(candidate);
            }
        }

        let sink = self.validation.sink;

        let ranked = scoring::rank(&pool, self.heuristics, sink);
        let Some(winner) = ranked.first().cloned() else {
            log::info!("no usable image found on {}", self.page_url);
            sink.record(TraceEvent::Exhausted);
            return Selection::Exhausted;
        };

        log::info!(
            "selected {} (score {:.0}, tier {:?})",
            winner.candidate.source.label(),
            winner.score(),
            tier
        );
        sink.record(TraceEvent::Winner {
            source: winner.candidate.source.label(),
            score: winner.score(),
            tier,
        });

        Selection::Winner {
            winner,
            tier,
            ranked,
        }
    }
}
