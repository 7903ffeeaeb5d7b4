use super::trace::{RejectReason, TraceEvent, TraceSink};
use super::types::{ImageSource, Origin, MAX_ASPECT_RATIO, MIN_ASPECT_RATIO};
use crate::images;
use crate::scrape::{FetchError, Fetcher};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, sync::Mutex, time::Duration};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("not a decodable image: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Reads the natural size of an image.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn dimensions(&self, source: &ImageSource) -> Result<(u32, u32), LoadError>;
}

/// Fetches remote images over a [`Fetcher`] and reads their headers.
pub struct FetchingImageLoader {
    fetcher: Arc<dyn Fetcher>,
}

impl FetchingImageLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

fn dimensions_of(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    images::get_dimensions(bytes).map_err(|e| LoadError::Decode(format!("{e:#}")))
}

#[async_trait]
impl ImageLoader for FetchingImageLoader {
    async fn dimensions(&self, source: &ImageSource) -> Result<(u32, u32), LoadError> {
        match source {
            ImageSource::Url(url) => {
                let bytes = self.fetcher.fetch(url).await?;
                dimensions_of(&bytes)
            }
            ImageSource::Inline { bytes, .. } => dimensions_of(bytes),
        }
    }
}

/// Remembers each result so the same image is never loaded twice in one run.
///
/// Tiers re-scan the same page with lower thresholds; without this every
/// tier would refetch every image.
pub struct CachedImageLoader<L> {
    inner: L,
    cache: Mutex<HashMap<String, Result<(u32, u32), LoadError>>>,
}

impl<L: ImageLoader> CachedImageLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &str) -> Option<Result<(u32, u32), LoadError>> {
        self.cache.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl<L: ImageLoader> ImageLoader for CachedImageLoader<L> {
    async fn dimensions(&self, source: &ImageSource) -> Result<(u32, u32), LoadError> {
        if let Some(result) = self.cached(source.key()) {
            return result;
        }

        let result = self.inner.dimensions(source).await;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(source.key().to_string(), result.clone());
        }
        result
    }
}

pub fn aspect_ratio_fits(width: u32, height: u32) -> bool {
    let ratio = width as f64 / height as f64;
    (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio)
}

/// Everything a validation pass needs besides the image itself.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub loader: &'a dyn ImageLoader,
    pub timeout: Duration,
    pub sink: &'a dyn TraceSink,
}

impl ValidationContext<'_> {
    pub fn reject(&self, source: &ImageSource, origin: Origin, reason: RejectReason) {
        self.sink.record(TraceEvent::CandidateRejected {
            source: source.label(),
            origin,
            reason,
        });
    }

    /// Load `source` and check it against the thresholds.
    ///
    /// `None` means "not a fit": load failures, timeouts, undersized images
    /// and extreme aspect ratios are all reported to the sink and swallowed.
    pub async fn validate(
        &self,
        source: &ImageSource,
        origin: Origin,
        min_width: u32,
        min_height: u32,
    ) -> Option<(u32, u32)> {
        let loaded = tokio::time::timeout(self.timeout, self.loader.dimensions(source))
            .await
            .unwrap_or(Err(LoadError::Timeout(self.timeout)));

        let (width, height) = match loaded {
            Ok((w, h)) if h > 0 => (w, h),
            Ok(_) => {
                self.reject(
                    source,
                    origin,
                    RejectReason::LoadFailed {
                        error: "zero height".to_string(),
                    },
                );
                return None;
            }
            Err(err) => {
                log::debug!("{}: {err}", source.label());
                self.reject(
                    source,
                    origin,
                    RejectReason::LoadFailed {
                        error: err.to_string(),
                    },
                );
                return None;
            }
        };

        if width < min_width || height < min_height {
            self.reject(source, origin, RejectReason::TooSmall { width, height });
            return None;
        }

        if !aspect_ratio_fits(width, height) {
            self.reject(
                source,
                origin,
                RejectReason::AspectRatio {
                    ratio: width as f64 / height as f64,
                },
            );
            return None;
        }

        self.sink.record(TraceEvent::CandidateAccepted {
            source: source.label(),
            origin,
            width,
            height,
        });

        Some((width, height))
    }
}
