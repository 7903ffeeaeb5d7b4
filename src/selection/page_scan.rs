use super::filters::{classify_zone, excluded_keyword, is_minimal_site};
use super::trace::RejectReason;
use super::types::{Format, ImageCandidate, ImageSource, Origin, RelaxationTier};
use super::Scanner;
use crate::images::decode_data_url;
use crate::metadata::normalize::{filename_of, to_absolute_url};
use crate::metadata::PageImage;

/// Scanning stops once this many images have been accepted.
pub const MAX_PAGE_CANDIDATES: usize = 10;

/// Inline images estimated below this many decoded bytes are tracking pixels.
pub const MIN_INLINE_BYTES: usize = 1000;

/// Ratio of base64 text length to decoded size.
const BASE64_OVERHEAD: f64 = 1.37;

const INLINE_MIME_PREFIXES: [&str; 2] = ["data:image/png", "data:image/jpeg"];

impl Scanner<'_> {
    /// Resolve an inline image, if this page allows them at all.
    fn inline_source(&self, src: &str) -> Result<ImageSource, RejectReason> {
        if !is_minimal_site(self.document.image_count()) {
            return Err(RejectReason::InlineOnRichPage);
        }

        if !INLINE_MIME_PREFIXES.iter().any(|prefix| src.starts_with(prefix)) {
            return Err(RejectReason::InlineUnsupported);
        }

        let estimated_bytes = (src.len() as f64 / BASE64_OVERHEAD) as usize;
        if estimated_bytes < MIN_INLINE_BYTES {
            return Err(RejectReason::InlineTooSmall { estimated_bytes });
        }

        let (mime, bytes) = decode_data_url(src).ok_or(RejectReason::InlineUndecodable)?;
        Ok(ImageSource::Inline {
            mime,
            bytes,
            data_url: src.to_string(),
        })
    }

    /// Pre-load checks for one page image, in the order they are applied.
    fn page_source(&self, image: &PageImage) -> Result<ImageSource, RejectReason> {
        let src = image.src.trim();

        if image.is_inline() {
            return self.inline_source(src);
        }

        let url = to_absolute_url(src, self.page_url).ok_or(RejectReason::Unresolvable)?;

        if !is_minimal_site(self.document.image_count()) {
            if let Some(keyword) = excluded_keyword(&filename_of(&url), self.heuristics) {
                return Err(RejectReason::Keyword {
                    keyword: keyword.to_string(),
                });
            }
        }

        Ok(ImageSource::Url(url))
    }

    /// Every `img[src]` in document order, filtered and validated against
    /// `tier`. Returns at most [`MAX_PAGE_CANDIDATES`] candidates.
    pub async fn scan_page(&self, tier: &RelaxationTier) -> Vec<ImageCandidate> {
        let mut candidates = Vec::new();

        for image in &self.document.images {
            let source = match self.page_source(image) {
                Ok(source) => source,
                Err(reason) => {
                    self.validation.reject(
                        &ImageSource::Url(image.src.clone()),
                        Origin::PageScan,
                        reason,
                    );
                    continue;
                }
            };

            let zone = match classify_zone(&image.ancestors, self.heuristics) {
                Ok(zone) => zone,
                Err(reason) => {
                    self.validation.reject(&source, Origin::PageScan, reason);
                    continue;
                }
            };

            let Some((width, height)) = self
                .validation
                .validate(&source, Origin::PageScan, tier.min_width, tier.min_height)
                .await
            else {
                continue;
            };

            let format = match &source {
                ImageSource::Inline { mime, .. } => Format::from_mime(mime),
                ImageSource::Url(url) => Format::from_reference(url),
            };

            candidates.push(ImageCandidate {
                source,
                width,
                height,
                format,
                origin: Origin::PageScan,
                zone,
            });

            if candidates.len() >= MAX_PAGE_CANDIDATES {
                log::debug!("page scan: candidate cap reached");
                break;
            }
        }

        log::debug!(
            "page scan ({}): {} candidates",
            tier.label,
            candidates.len()
        );
        candidates
    }
}
