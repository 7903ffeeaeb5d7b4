//! The card generation flow: page fetch, metadata, image choice, thumbnail,
//! history.

use super::errors::AppError;
use crate::{
    cards::{
        self,
        brand::{self, BrandPalette},
        domain::build_domain_card,
        SyntheticCard,
    },
    config::{CompiledHeuristics, Config, ImageMode},
    history::CardHistory,
    images,
    metadata::{
        document::truncate_description,
        normalize::{display_domain, history_key, normalize_input_url},
        PageDocument,
    },
    scrape::Fetcher,
    selection::{
        declared_source,
        trace::TraceSink,
        types::{ImageSource, Origin, Selection},
        validator::{CachedImageLoader, FetchingImageLoader, ValidationContext},
        Scanner,
    },
    templates::{CardDescriptor, ImageKind},
};
use image::RgbaImage;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub mode: ImageMode,
    /// Reuse a stored card for the same page and store the new one.
    pub use_history: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedCard {
    pub descriptor: CardDescriptor,
    pub thumbnail_png: Vec<u8>,
    /// 1200x630 export, synthetic cards only.
    pub full_size_png: Option<Vec<u8>>,
    /// Raw bytes of the chosen page image.
    pub source_image: Option<Vec<u8>>,
    /// Relaxation tier the winner came from.
    pub tier: Option<usize>,
    pub canonical_url: Option<String>,
    pub from_history: bool,
}

struct CardImage {
    thumbnail: RgbaImage,
    full_size: Option<RgbaImage>,
    kind: ImageKind,
    source: Option<String>,
    source_bytes: Option<Vec<u8>>,
    border_color: Option<String>,
    tier: Option<usize>,
}

impl CardImage {
    fn synthetic(card: SyntheticCard) -> Self {
        log::info!("using generated {} card", card.kind());
        let kind = match card {
            SyntheticCard::Brand(_) => ImageKind::BrandCard,
            SyntheticCard::Domain(_) => ImageKind::DomainCard,
        };
        Self {
            thumbnail: card.thumbnail(),
            full_size: Some(card.full_size()),
            kind,
            source: None,
            source_bytes: None,
            border_color: card.border_color().map(str::to_string),
            tier: None,
        }
    }

    fn placeholder(source: Option<String>) -> Self {
        Self {
            thumbnail: images::placeholder_thumbnail(),
            full_size: None,
            kind: ImageKind::Placeholder,
            source,
            source_bytes: None,
            border_color: None,
            tier: None,
        }
    }
}

pub struct CardGenerator {
    config: Config,
    heuristics: CompiledHeuristics,
    fetcher: Arc<dyn Fetcher>,
    history: CardHistory,
}

impl CardGenerator {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        history: CardHistory,
    ) -> Result<Self, AppError> {
        let heuristics = config.heuristics.compile()?;
        Ok(Self {
            config,
            heuristics,
            fetcher,
            history,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &CardHistory {
        &self.history
    }

    pub async fn generate(
        &self,
        input: &str,
        options: &GenerateOptions,
        sink: &dyn TraceSink,
    ) -> Result<GeneratedCard, AppError> {
        let url = normalize_input_url(input).ok_or_else(|| AppError::InvalidUrl(input.to_string()))?;
        let key = history_key(&url);

        if options.use_history {
            match self.history.find(&key) {
                Ok(Some(entry)) => {
                    log::info!("{key}: using card from history ({})", entry.created_at);
                    return Ok(Self::from_history(entry.card));
                }
                Ok(None) => {}
                Err(err) => log::warn!("history lookup failed: {err}"),
            }
        }

        log::info!("{url}: fetching page");
        let html = self.fetcher.fetch(url.as_str()).await?;
        let document = PageDocument::parse(&String::from_utf8_lossy(&html));
        let metadata = &document.metadata;

        let host = url.host_str().unwrap_or_default().to_string();
        let image = match options.mode {
            ImageMode::DomainCard => {
                log::debug!("domain card forced");
                CardImage::synthetic(SyntheticCard::Domain(build_domain_card(&host)))
            }
            ImageMode::BrandCards => {
                let icon_url = self.config.favicon_url(&host);
                let card = cards::synthesize(
                    &host,
                    Some(&icon_url),
                    self.fetcher.as_ref(),
                    self.config.logo_color_tie_break,
                )
                .await;
                CardImage::synthetic(card)
            }
            ImageMode::DeclaredOnly => match metadata.declared_image.as_deref() {
                Some(declared) => match declared_source(declared, &url) {
                    Some(source) => self.load_card_image(&source, ImageKind::DeclaredPreview, None).await,
                    None => CardImage::placeholder(Some(declared.to_string())),
                },
                None => {
                    log::info!("{url}: no declared preview image");
                    CardImage::placeholder(None)
                }
            },
            ImageMode::SmartSelect => self.smart_select(&document, &url, &host, sink).await,
        };

        let description = metadata
            .description
            .as_deref()
            .map(|d| truncate_description(d, self.config.max_description_length))
            .unwrap_or_default();

        let thumbnail_png = images::encode_png(&image.thumbnail)?;
        let full_size_png = image.full_size.as_ref().map(images::encode_png).transpose()?;

        let descriptor = CardDescriptor {
            title: metadata.title.clone().unwrap_or_default(),
            description,
            domain: display_domain(&url),
            link_url: url.to_string(),
            thumbnail: images::png_data_url(&thumbnail_png),
            image_source: image.source,
            image_kind: image.kind,
            border_color: image.border_color,
        };

        if options.use_history {
            if let Err(err) = self.history.record(&key, descriptor.clone()) {
                log::warn!("could not store card in history: {err}");
            }
        }

        Ok(GeneratedCard {
            descriptor,
            thumbnail_png,
            full_size_png,
            source_image: image.source_bytes,
            tier: image.tier,
            canonical_url: metadata.canonical_url.clone(),
            from_history: false,
        })
    }

    async fn smart_select(
        &self,
        document: &PageDocument,
        url: &Url,
        host: &str,
        sink: &dyn TraceSink,
    ) -> CardImage {
        let loader = CachedImageLoader::new(FetchingImageLoader::new(self.fetcher.clone()));
        let validation = ValidationContext {
            loader: &loader,
            timeout: self.config.load_timeout(),
            sink,
        };
        let scanner = Scanner::new(document, url, &self.heuristics, validation);

        match scanner.select(document.metadata.declared_image.as_deref()).await {
            Selection::Winner { winner, tier, .. } => {
                let kind = match winner.candidate.origin {
                    Origin::DeclaredPreview => ImageKind::DeclaredPreview,
                    Origin::PageScan | Origin::DomainMatch => ImageKind::PageImage,
                };
                self.load_card_image(&winner.candidate.source, kind, tier).await
            }
            Selection::Exhausted => {
                log::info!("{url}: no page image fits, generating domain card");
                CardImage::synthetic(SyntheticCard::Domain(build_domain_card(host)))
            }
        }
    }

    /// Fetch and crop the chosen image; the placeholder stands in when that
    /// fails.
    async fn load_card_image(
        &self,
        source: &ImageSource,
        kind: ImageKind,
        tier: Option<usize>,
    ) -> CardImage {
        let label = source.label();

        let bytes = match source {
            ImageSource::Url(url) => match self.fetcher.fetch(url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("{label}: image fetch failed: {err}");
                    return CardImage::placeholder(Some(label));
                }
            },
            ImageSource::Inline { bytes, .. } => bytes.clone(),
        };

        match images::decode(&bytes) {
            Ok(decoded) => CardImage {
                thumbnail: images::crop_to_thumbnail(&decoded),
                full_size: None,
                kind,
                source: Some(label),
                source_bytes: Some(bytes),
                border_color: None,
                tier,
            },
            Err(err) => {
                log::warn!("{label}: {err:#}");
                CardImage::placeholder(Some(label))
            }
        }
    }

    /// Palette the brand card for `host` would use.
    pub async fn brand_palette(&self, host: &str) -> Option<BrandPalette> {
        let icon_url = self.config.favicon_url(host);
        let icon = brand::fetch_icon(self.fetcher.as_ref(), &icon_url).await?;
        Some(brand::analyze_icon(&icon, self.config.logo_color_tie_break))
    }

    fn from_history(card: CardDescriptor) -> GeneratedCard {
        let thumbnail_png = images::decode_data_url(&card.thumbnail)
            .map(|(_, bytes)| bytes)
            .unwrap_or_default();

        GeneratedCard {
            descriptor: card,
            thumbnail_png,
            full_size_png: None,
            source_image: None,
            tier: None,
            canonical_url: None,
            from_history: true,
        }
    }
}
