use crate::storage::{self, StorageManager};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONFIG_FILE: &str = "config.yaml";

const LOAD_TIMEOUT_MS: u64 = 5_000;
const FETCH_TIMEOUT_MS: u64 = 10_000;
const FETCH_RETRIES: u8 = 3;
const MAX_DESCRIPTION_LENGTH: usize = 130;
const HISTORY_LENGTH: usize = 5;
const FAVICON_SERVICE: &str = "https://t0.gstatic.com/faviconV2?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL&url=http://{domain}&size=256";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("config file is not valid utf8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Where the card image comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    /// Use the page's declared preview image without checking it.
    DeclaredOnly,
    /// Scan and score the page's images.
    #[default]
    SmartSelect,
    /// Build a card from the site icon instead of scanning.
    BrandCards,
    /// Always draw the domain card.
    DomainCard,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First-encountered color wins; output is reproducible.
    #[default]
    First,
    /// Uniformly random among tied colors.
    Random,
}

/// Keyword lists and patterns used by the scanners and the scorer.
///
/// These are tuned by hand against real pages, so they live in config rather
/// than in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Filename substrings that reject an image on image-rich pages.
    pub excluded_keywords: Vec<String>,
    /// Ancestor tags that put an image in page chrome.
    pub excluded_tags: Vec<String>,
    /// Ancestor tags that mark the main content.
    pub article_tags: Vec<String>,
    /// Ancestor id/class pattern that puts an image in page chrome.
    pub excluded_zone_pattern: String,
    /// Ancestor id/class pattern that marks a content area.
    pub content_zone_pattern: String,
    /// Filenames that are almost never editorial images.
    pub non_editorial_pattern: String,
    /// Filenames of interface elements.
    pub ui_element_pattern: String,
    /// Paths of section branding images.
    pub section_path_pattern: String,
}

impl Default for Heuristics {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            excluded_keywords: strings(&[
                "icon", "avatar", "logo", "badge", "button", "sprite", "pixel", "tracking", "ad",
                "banner", "widget", "thumb", "nav", "social", "comment", "sidebar", "footer",
                "header", "menu", "spacer", "dot", "arrow", "bullet", "bg", "background",
            ]),
            excluded_tags: strings(&["nav", "header", "footer", "aside"]),
            article_tags: strings(&["article", "main"]),
            excluded_zone_pattern: "sidebar|comment|widget|footer|header|nav".into(),
            content_zone_pattern: "content|post|entry".into(),
            non_editorial_pattern:
                r"(?i)icon|newsletter|subscribe|author|avatar|profile|logo|-rev\b|albumart|album-art|thumblarge"
                    .into(),
            ui_element_pattern: r"(?i)button|badge|widget|ad-|banner|thumb|square\d+".into(),
            section_path_pattern: r"(?i)/newsletters/|/sections/|/podcasts?/|/shows?/|/series/"
                .into(),
        }
    }
}

/// Heuristics with their patterns compiled.
#[derive(Clone, Debug)]
pub struct CompiledHeuristics {
    pub excluded_keywords: Vec<String>,
    pub excluded_tags: Vec<String>,
    pub article_tags: Vec<String>,
    pub excluded_zone: Regex,
    pub content_zone: Regex,
    pub non_editorial: Regex,
    pub ui_element: Regex,
    pub section_path: Regex,
}

impl Heuristics {
    pub fn compile(&self) -> Result<CompiledHeuristics, ConfigError> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::invalid(field, e.to_string()))
        };
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect();

        Ok(CompiledHeuristics {
            excluded_keywords: lower(&self.excluded_keywords),
            excluded_tags: lower(&self.excluded_tags),
            article_tags: lower(&self.article_tags),
            excluded_zone: compile("heuristics.excluded_zone_pattern", &self.excluded_zone_pattern)?,
            content_zone: compile("heuristics.content_zone_pattern", &self.content_zone_pattern)?,
            non_editorial: compile("heuristics.non_editorial_pattern", &self.non_editorial_pattern)?,
            ui_element: compile("heuristics.ui_element_pattern", &self.ui_element_pattern)?,
            section_path: compile("heuristics.section_path_pattern", &self.section_path_pattern)?,
        })
    }
}

impl Default for CompiledHeuristics {
    fn default() -> Self {
        Heuristics::default()
            .compile()
            .expect("default heuristics compile")
    }
}

/// Styling applied by the HTML templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStyle {
    pub title_font_size: String,
    pub desc_font_size: String,
    pub title_font: String,
    pub desc_font: String,
    pub title_color: String,
    pub desc_color: String,
    pub domain_color: String,
    pub border_color: String,
    pub border_style: String,
    pub border_weight: String,
    pub border_radius: String,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            title_font_size: "18px".into(),
            desc_font_size: "12px".into(),
            title_font: "'Outfit', sans-serif".into(),
            desc_font: "'Open Sans', sans-serif".into(),
            title_color: "#225560".into(),
            desc_color: "#225560".into(),
            domain_color: "#225560".into(),
            border_color: "#e0e0e0".into(),
            border_style: "solid".into(),
            border_weight: "1px".into(),
            border_radius: "5px".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub image_mode: ImageMode,
    #[serde(default = "load_timeout_ms")]
    pub load_timeout_ms: u64,
    #[serde(default = "fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "fetch_retries")]
    pub fetch_retries: u8,
    #[serde(default = "max_description_length")]
    pub max_description_length: usize,
    #[serde(default = "history_length")]
    pub history_length: usize,
    #[serde(default)]
    pub logo_color_tie_break: TieBreak,
    #[serde(default = "favicon_service")]
    pub favicon_service: String,
    #[serde(default)]
    pub heuristics: Heuristics,
    #[serde(default)]
    pub style: CardStyle,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

fn load_timeout_ms() -> u64 {
    LOAD_TIMEOUT_MS
}

fn fetch_timeout_ms() -> u64 {
    FETCH_TIMEOUT_MS
}

fn fetch_retries() -> u8 {
    FETCH_RETRIES
}

fn max_description_length() -> usize {
    MAX_DESCRIPTION_LENGTH
}

fn history_length() -> usize {
    HISTORY_LENGTH
}

fn favicon_service() -> String {
    FAVICON_SERVICE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_mode: ImageMode::default(),
            load_timeout_ms: LOAD_TIMEOUT_MS,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            fetch_retries: FETCH_RETRIES,
            max_description_length: MAX_DESCRIPTION_LENGTH,
            history_length: HISTORY_LENGTH,
            logo_color_tie_break: TieBreak::default(),
            favicon_service: favicon_service(),
            heuristics: Heuristics::default(),
            style: CardStyle::default(),
            base_path: String::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::invalid("load_timeout_ms", "must be greater than 0"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::invalid("fetch_timeout_ms", "must be greater than 0"));
        }
        if !self.favicon_service.contains("{domain}") {
            return Err(ConfigError::invalid(
                "favicon_service",
                format!("'{}' has no {{domain}} placeholder", self.favicon_service),
            ));
        }
        self.heuristics.compile()?;
        Ok(())
    }

    pub fn load_with(base_path: &str) -> Result<Self, ConfigError> {
        let store = storage::BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn favicon_url(&self, domain: &str) -> String {
        self.favicon_service.replace("{domain}", domain)
    }
}
