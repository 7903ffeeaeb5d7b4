use super::filters::{classify_zone, domain_token, excluded_keyword, is_minimal_site};
use super::trace::RejectReason;
use super::types::{Format, ImageCandidate, ImageSource, Origin, RelaxationTier};
use super::Scanner;
use crate::metadata::normalize::{filename_of, to_absolute_url};
use std::collections::HashSet;

/// Shorter site names match too many unrelated filenames.
pub const MIN_DOMAIN_TOKEN: usize = 3;

impl Scanner<'_> {
    /// Images whose filename contains a prefix of the site name.
    ///
    /// Prefixes run from three characters up to the whole token. Each
    /// resolved URL is considered once, at the first prefix that matches it.
    /// The zone is recorded for scoring but never excludes a match.
    pub async fn scan_domain(&self, tier: &RelaxationTier) -> Vec<ImageCandidate> {
        let token: Vec<char> = domain_token(self.page_url).chars().collect();
        if token.len() < MIN_DOMAIN_TOKEN {
            log::debug!("domain match: token too short ({} chars)", token.len());
            return Vec::new();
        }

        let minimal_site = is_minimal_site(self.document.image_count());
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for prefix_len in MIN_DOMAIN_TOKEN..=token.len() {
            let prefix: String = token[..prefix_len].iter().collect();

            for image in &self.document.images {
                if image.is_inline() {
                    continue;
                }
                let Some(url) = to_absolute_url(&image.src, self.page_url) else {
                    continue;
                };
                if seen.contains(&url) {
                    continue;
                }

                let filename = filename_of(&url);
                if !filename.contains(&prefix) {
                    continue;
                }
                seen.insert(url.clone());

                let source = ImageSource::Url(url);

                if !minimal_site {
                    if let Some(keyword) = excluded_keyword(&filename, self.heuristics) {
                        self.validation.reject(
                            &source,
                            Origin::DomainMatch,
                            RejectReason::Keyword {
                                keyword: keyword.to_string(),
                            },
                        );
                        continue;
                    }
                }

                let Some((width, height)) = self
                    .validation
                    .validate(&source, Origin::DomainMatch, tier.min_width, tier.min_height)
                    .await
                else {
                    continue;
                };

                let zone = classify_zone(&image.ancestors, self.heuristics).unwrap_or_default();
                let format = Format::from_reference(source.key());

                matches.push(ImageCandidate {
                    source,
                    width,
                    height,
                    format,
                    origin: Origin::DomainMatch,
                    zone,
                });
            }
        }

        log::debug!(
            "domain match ({}): {} candidates for {:?}",
            tier.label,
            matches.len(),
            token.iter().collect::<String>()
        );
        matches
    }
}
