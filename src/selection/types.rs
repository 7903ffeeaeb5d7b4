use crate::metadata::normalize::is_svg_reference;
use serde::Serialize;

/// Smallest accepted width/height ratio; the largest is its inverse.
pub const MIN_ASPECT_RATIO: f64 = 1.0 / 3.0;
pub const MAX_ASPECT_RATIO: f64 = 3.0;

/// Where the bytes of a candidate live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    /// A `data:` image decoded from the page itself.
    Inline {
        mime: String,
        bytes: Vec<u8>,
        data_url: String,
    },
}

impl ImageSource {
    /// Stable identity used for deduplication and reporting.
    pub fn key(&self) -> &str {
        match self {
            ImageSource::Url(url) => url,
            ImageSource::Inline { data_url, .. } => data_url,
        }
    }

    /// Short form for logs; data URLs are cut after the mime type.
    pub fn label(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline { mime, bytes, .. } => format!("data:{mime} ({} bytes)", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Svg,
    Png,
    Jpg,
}

impl Format {
    pub fn from_reference(src: &str) -> Self {
        if is_svg_reference(src) {
            Format::Svg
        } else if src.to_ascii_lowercase().ends_with(".png") {
            Format::Png
        } else {
            Format::Jpg
        }
    }

    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "image/svg+xml" => Format::Svg,
            "image/png" => Format::Png,
            _ => Format::Jpg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    PageScan,
    DomainMatch,
    DeclaredPreview,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Zone {
    #[default]
    None,
    Content,
    ArticleMain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub origin: Origin,
    pub zone: Zone,
}

impl ImageCandidate {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaxationTier {
    pub min_width: u32,
    pub min_height: u32,
    pub label: &'static str,
}

/// Searched in order; the first tier that yields a candidate ends the search.
pub const TIERS: [RelaxationTier; 5] = [
    RelaxationTier {
        min_width: 400,
        min_height: 200,
        label: "strict",
    },
    RelaxationTier {
        min_width: 400,
        min_height: 200,
        label: "lenient",
    },
    RelaxationTier {
        min_width: 200,
        min_height: 80,
        label: "medium",
    },
    RelaxationTier {
        min_width: 100,
        min_height: 50,
        label: "small",
    },
    RelaxationTier {
        min_width: 0,
        min_height: 0,
        label: "any",
    },
];

/// Thresholds the declared preview image is always checked against.
pub const DECLARED_PREVIEW_TIER: RelaxationTier = TIERS[0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub area: f64,
    pub aspect: f64,
    pub format: f64,
    pub zone: f64,
    pub origin: f64,
    pub filename_penalty: f64,
    pub prominence: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.area
            + self.aspect
            + self.format
            + self.zone
            + self.origin
            + self.filename_penalty
            + self.prominence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: ImageCandidate,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Winner {
        winner: ScoredCandidate,
        /// Index into `TIERS`; `None` when only the declared preview qualified.
        tier: Option<usize>,
        /// Every scored candidate, best first.
        ranked: Vec<ScoredCandidate>,
    },
    /// Nothing qualified at any tier.
    Exhausted,
}
