//! Text renderings of a finished card: email HTML, document HTML, Markdown.
//!
//! Every renderer takes the style explicitly; there is no shared mutable
//! settings object.

use crate::config::CardStyle;
use serde::{Deserialize, Serialize};

pub const FALLBACK_TITLE: &str = "Untitled Page";
pub const FALLBACK_DESCRIPTION: &str = "Check out this link for more details.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    PageImage,
    DeclaredPreview,
    BrandCard,
    DomainCard,
    Placeholder,
}

/// Everything the renderers need for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDescriptor {
    pub title: String,
    pub description: String,
    /// Display domain, `www.` already removed.
    pub domain: String,
    pub link_url: String,
    /// Thumbnail as a `data:image/png;base64,` URL.
    pub thumbnail: String,
    /// Source of the chosen page image, when one was chosen.
    pub image_source: Option<String>,
    pub image_kind: ImageKind,
    /// Border color of brand cards.
    pub border_color: Option<String>,
}

impl CardDescriptor {
    fn title_or_default(&self) -> &str {
        non_empty_or(&self.title, FALLBACK_TITLE)
    }

    fn description_or_default(&self) -> &str {
        non_empty_or(&self.description, FALLBACK_DESCRIPTION)
    }

    fn domain_or_default(&self) -> &str {
        non_empty_or(&self.domain, "unknown.com")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct Escaped {
    title: String,
    description: String,
    domain: String,
    link: String,
    image: String,
}

fn escaped(card: &CardDescriptor) -> Escaped {
    Escaped {
        title: escape_html(card.title_or_default()),
        description: escape_html(card.description_or_default()).replace('\n', "<br>"),
        domain: escape_html(card.domain_or_default()).to_uppercase(),
        link: escape_html(&card.link_url),
        image: escape_html(&card.thumbnail),
    }
}

/// Nested-table layout that survives email clients.
pub fn email_html(card: &CardDescriptor, style: &CardStyle) -> String {
    let Escaped {
        title,
        description,
        domain,
        link,
        image,
    } = escaped(card);
    let CardStyle {
        title_font_size,
        desc_font_size,
        title_font,
        desc_font,
        title_color,
        desc_color,
        domain_color,
        border_color,
        border_style,
        border_weight,
        border_radius,
    } = style;

    format!(
        r#"<table border="0" cellpadding="0" cellspacing="0" style="width:580px">
  <tr>
    <td style="border:{border_weight} {border_style} {border_color};border-radius:{border_radius};padding:8px">
      <table border="0" cellpadding="0" cellspacing="0" style="width:100%">
        <tr>
          <th rowspan="2" style="width:134px;vertical-align:middle;text-align:left;font-weight:400">
            <a href="{link}" target="_blank"><img src="{image}" width="120" style="width:120px;max-width:100%;display:block" alt="{title}"></a>
          </th>
          <th style="font-weight:400;text-align:left;vertical-align:top">
            <p style="font-family:{title_font};margin:0 0 2px 0;line-height:22px;font-weight:600;font-size:{title_font_size}"><a href="{link}" target="_blank" style="color:{title_color};text-decoration:none">{title}</a></p>
            <p style="font-family:{desc_font};margin:0 0 2px 0;line-height:17px;font-size:{desc_font_size}"><a href="{link}" target="_blank" style="color:{desc_color};text-decoration:none">{description}</a></p>
          </th>
        </tr>
        <tr>
          <td style="vertical-align:bottom;font-family:{desc_font};line-height:11px;text-align:left;padding-top:8px">
            <a style="font-size:11px;letter-spacing:1px;text-decoration:none;text-transform:uppercase;font-weight:normal;color:{domain_color}" href="{link}" target="_blank">{domain}</a>
          </td>
        </tr>
      </table>
    </td>
  </tr>
</table>"#
    )
}

/// Flat two-cell table for pasting into documents.
pub fn document_html(card: &CardDescriptor, style: &CardStyle) -> String {
    let Escaped {
        title,
        description,
        domain,
        link,
        image,
    } = escaped(card);
    let CardStyle {
        title_font_size,
        desc_font_size,
        title_font,
        desc_font,
        title_color,
        desc_color,
        domain_color,
        border_color,
        border_style,
        border_weight,
        border_radius,
    } = style;

    format!(
        r#"<table border="0" cellpadding="0" cellspacing="0" style="width:580px;border:{border_weight} {border_style} {border_color};border-radius:{border_radius};border-collapse:collapse">
  <tr>
    <td style="width:134px;padding:8px;vertical-align:middle;border:none">
      <a href="{link}" target="_blank"><img src="{image}" width="120" style="width:120px;display:block" alt="{title}"></a>
    </td>
    <td style="padding:8px;vertical-align:top;border:none">
      <div>
        <p style="font-family:{title_font};margin:0 0 2px 0;line-height:1.2;font-weight:600;font-size:{title_font_size}"><a href="{link}" target="_blank" style="color:{title_color};text-decoration:none">{title}</a></p>
        <p style="font-family:{desc_font};margin:0;line-height:17px;font-size:{desc_font_size}"><a href="{link}" target="_blank" style="color:{desc_color};text-decoration:none">{description}</a></p>
      </div>
      <div style="font-family:{desc_font};line-height:11px;padding-top:8px">
        <a style="font-size:11px;letter-spacing:1px;text-decoration:none;text-transform:uppercase;font-weight:normal;color:{domain_color}" href="{link}" target="_blank">{domain}</a>
      </div>
    </td>
  </tr>
</table>"#
    )
}

/// Chat-friendly Markdown: bold title, italic description, link line.
pub fn markdown(card: &CardDescriptor) -> String {
    format!(
        "*{}*\n_{}_\n\u{1F517} {}",
        card.title_or_default(),
        card.description_or_default(),
        card.link_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardDescriptor {
        CardDescriptor {
            title: "Tom & Jerry <3".into(),
            description: "line one\nline \"two\"".into(),
            domain: "example.com".into(),
            link_url: "https://example.com/a?b=1&c=2".into(),
            thumbnail: "data:image/png;base64,AAAA".into(),
            image_source: None,
            image_kind: ImageKind::DomainCard,
            border_color: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_email_html_escapes_and_styles() {
        let html = email_html(&card(), &CardStyle::default());
        assert!(html.contains("Tom &amp; Jerry &lt;3"));
        assert!(html.contains("line one<br>line &quot;two&quot;"));
        assert!(html.contains("href=\"https://example.com/a?b=1&amp;c=2\""));
        assert!(html.contains(">EXAMPLE.COM</a>"));
        assert!(html.contains("border:1px solid #e0e0e0"));
        assert!(!html.contains("Tom & Jerry"));
    }

    #[test]
    fn test_document_html_uses_style() {
        let style = CardStyle {
            title_color: "#123456".into(),
            ..CardStyle::default()
        };
        let html = document_html(&card(), &style);
        assert!(html.contains("color:#123456"));
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn test_markdown() {
        let md = markdown(&card());
        assert_eq!(
            md,
            "*Tom & Jerry <3*\n_line one\nline \"two\"_\n\u{1F517} https://example.com/a?b=1&c=2"
        );
    }

    #[test]
    fn test_fallback_text() {
        let empty = CardDescriptor {
            title: String::new(),
            description: "  ".into(),
            ..card()
        };
        let md = markdown(&empty);
        assert!(md.starts_with("*Untitled Page*\n_Check out this link for more details._"));
    }
}
