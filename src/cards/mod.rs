//! Synthetic card images, used when a page offers no usable image.

pub mod border;
pub mod brand;
pub mod domain;
pub mod text;

use crate::images::crop_to_thumbnail;
use crate::scrape::Fetcher;
use border::MatBorder;
use brand::BrandCard;
use image::RgbaImage;

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

#[derive(Debug, Clone)]
pub enum SyntheticCard {
    Brand(BrandCard),
    Domain(RgbaImage),
}

impl SyntheticCard {
    /// 1200x630 image, framed for brand cards.
    pub fn full_size(&self) -> RgbaImage {
        match self {
            SyntheticCard::Brand(card) => card.framed(),
            SyntheticCard::Domain(image) => image.clone(),
        }
    }

    /// Thumbnail cropped from the unframed image, then given its own thin
    /// frame so the border survives the downscale.
    pub fn thumbnail(&self) -> RgbaImage {
        match self {
            SyntheticCard::Brand(card) => {
                let mut thumb = crop_to_thumbnail(&card.image);
                MatBorder::THUMBNAIL.apply(&mut thumb, card.border());
                thumb
            }
            SyntheticCard::Domain(image) => crop_to_thumbnail(image),
        }
    }

    pub fn border_color(&self) -> Option<&str> {
        match self {
            SyntheticCard::Brand(card) => Some(&card.palette.border),
            SyntheticCard::Domain(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyntheticCard::Brand(_) => "brand",
            SyntheticCard::Domain(_) => "domain",
        }
    }
}

/// Brand card from the site icon when `icon_url` is given and works,
/// otherwise the domain card.
pub async fn synthesize(
    domain: &str,
    icon_url: Option<&str>,
    fetcher: &dyn Fetcher,
    tie_break: crate::config::TieBreak,
) -> SyntheticCard {
    if let Some(icon_url) = icon_url {
        if let Some(card) = brand::build_brand_card(fetcher, icon_url, tie_break).await {
            log::info!("using brand card for {domain} (border {})", card.palette.border);
            return SyntheticCard::Brand(card);
        }
        log::info!("brand card unavailable for {domain}, falling back to domain card");
    }

    SyntheticCard::Domain(domain::build_domain_card(domain))
}
