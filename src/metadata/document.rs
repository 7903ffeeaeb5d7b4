//! Parsed view of a fetched page.
//!
//! `scraper::Html` is not `Send`, so parsing happens once up front and the
//! scanners work on this owned snapshot instead of holding element references
//! across image loads.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// How many ancestors are kept per image for zone classification.
pub const ANCESTOR_DEPTH: usize = 5;

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("static selector"));
static HEAD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("head").expect("static selector"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("static selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link").expect("static selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector"));

/// One ancestor element of an image, nearest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    /// Lowercase tag name.
    pub tag: String,
    /// `id` and `class` joined by a space, lowercased.
    pub id_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Raw `src` attribute as written in the page.
    pub src: String,
    pub ancestors: Vec<Ancestor>,
}

impl PageImage {
    pub fn is_inline(&self) -> bool {
        self.src.trim_start().starts_with("data:")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub declared_image: Option<String>,
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    pub images: Vec<PageImage>,
    pub metadata: PageMetadata,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let images = document
            .select(&IMG_SELECTOR)
            .filter_map(|element| {
                let src = element.value().attr("src")?;
                Some(PageImage {
                    src: src.to_string(),
                    ancestors: collect_ancestors(element),
                })
            })
            .collect::<Vec<_>>();

        let metadata = extract_metadata(&document);
        log::debug!(
            "parsed page: {} images, declared image: {:?}",
            images.len(),
            metadata.declared_image
        );

        Self { images, metadata }
    }

    /// Number of `img[src]` elements; drives the minimal-site heuristics.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

fn collect_ancestors(element: ElementRef<'_>) -> Vec<Ancestor> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(ANCESTOR_DEPTH)
        .map(|parent| {
            let value = parent.value();
            let id = value.id().unwrap_or_default();
            let class = value.attr("class").unwrap_or_default();
            Ancestor {
                tag: value.name().to_ascii_lowercase(),
                id_class: format!("{id} {class}").to_lowercase(),
            }
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn extract_metadata(document: &Html) -> PageMetadata {
    let mut title = None;
    let mut description = None;
    let mut declared_image = None;
    let mut twitter_image = None;
    let mut canonical_url = None;

    let head = document.select(&HEAD_SELECTOR).next();

    if let Some(head) = head {
        for element in head.select(&META_SELECTOR) {
            let meta_prop = element.attr("property").unwrap_or_default();
            let meta_key = element.attr("name").unwrap_or(meta_prop);
            let meta_value = element.attr("content").unwrap_or_default();

            match meta_key {
                "og:title" | "twitter:title" if title.is_none() => {
                    title = non_empty(meta_value);
                }
                "og:description" | "description" | "Description" | "twitter:description"
                    if description.is_none() =>
                {
                    description = non_empty(meta_value);
                }
                "og:image" if declared_image.is_none() => {
                    declared_image = non_empty(meta_value);
                }
                "twitter:image" if twitter_image.is_none() => {
                    twitter_image = non_empty(meta_value);
                }
                "og:url" if canonical_url.is_none() => {
                    canonical_url = non_empty(meta_value);
                }
                _ => {}
            }
        }

        if canonical_url.is_none() {
            canonical_url = head
                .select(&LINK_SELECTOR)
                .find(|link| link.attr("rel") == Some("canonical"))
                .and_then(|link| link.attr("href"))
                .and_then(non_empty);
        }
    }

    if title.is_none() {
        title = document
            .select(&TITLE_SELECTOR)
            .next()
            .and_then(|el| non_empty(&el.text().collect::<String>()));
    }

    PageMetadata {
        title,
        description,
        declared_image: declared_image.or(twitter_image),
        canonical_url,
    }
}

/// Cut a description to `max_chars` characters, appending `...` when cut.
pub fn truncate_description(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }
    let cut: String = description.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <title> Fallback Title </title>
  <meta property="og:title" content="OG Title">
  <meta name="description" content="Plain description">
  <meta property="og:image" content="/img/preview.jpg">
  <meta name="twitter:image" content="/img/twitter.jpg">
  <link rel="canonical" href="https://example.com/canonical">
</head>
<body>
  <nav><img src="/nav.png"></nav>
  <main id="Primary" class="Layout Wide">
    <article><div class="post-body"><p><img src="hero.jpg"></p></div></article>
  </main>
  <img alt="no source">
</body></html>"#;

    #[test]
    fn test_images_in_document_order() {
        let doc = PageDocument::parse(PAGE);
        let srcs: Vec<_> = doc.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["/nav.png", "hero.jpg"]);
        assert_eq!(doc.image_count(), 2);
    }

    #[test]
    fn test_ancestors_nearest_first_and_capped() {
        let doc = PageDocument::parse(PAGE);
        let hero = &doc.images[1];
        let tags: Vec<_> = hero.ancestors.iter().map(|a| a.tag.as_str()).collect();
        assert_eq!(tags, vec!["p", "div", "article", "main", "body"]);
        assert_eq!(hero.ancestors[1].id_class, " post-body");
        assert_eq!(hero.ancestors[3].id_class, "primary layout wide");
    }

    #[test]
    fn test_metadata_prefers_og() {
        let doc = PageDocument::parse(PAGE);
        assert_eq!(doc.metadata.title.as_deref(), Some("OG Title"));
        assert_eq!(doc.metadata.description.as_deref(), Some("Plain description"));
        assert_eq!(doc.metadata.declared_image.as_deref(), Some("/img/preview.jpg"));
        assert_eq!(
            doc.metadata.canonical_url.as_deref(),
            Some("https://example.com/canonical")
        );
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let doc = PageDocument::parse(
            "<html><head><title> Only Title </title>\
             <meta name=\"twitter:image\" content=\"https://a.com/t.png\"></head></html>",
        );
        assert_eq!(doc.metadata.title.as_deref(), Some("Only Title"));
        assert_eq!(
            doc.metadata.declared_image.as_deref(),
            Some("https://a.com/t.png")
        );
    }

    #[test]
    fn test_inline_detection() {
        let image = PageImage {
            src: "data:image/png;base64,AAAA".into(),
            ancestors: vec![],
        };
        assert!(image.is_inline());
    }

    #[test]
    fn test_truncate_description() {
        assert_eq!(truncate_description("short", 130), "short");
        assert_eq!(truncate_description("abcdef", 3), "abc...");
        assert_eq!(truncate_description("ééééé", 2), "éé...");
    }
}
