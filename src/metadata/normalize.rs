use url::Url;

/// Query parameters that never change what a page shows.
const TRACKING_PARAMS: [&str; 10] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "mc_cid",
    "mc_eid",
];

/// Turn user input into a fetchable URL.
///
/// Bare domains get an `https://` prefix. Returns `None` if the result still
/// does not parse or has no host.
pub fn normalize_input_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    parsed.host_str()?;
    Some(parsed)
}

/// Key used to identify a page in the card history: lowercased host, no
/// tracking parameters, no trailing slash.
pub fn history_key(url: &Url) -> String {
    let mut parsed = url.clone();

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    parsed.set_query(None);
    if !kept.is_empty() {
        parsed.query_pairs_mut().extend_pairs(kept);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// Resolve an image `src` against the page URL.
///
/// Handles absolute, protocol-relative (`//host/x`), root-relative (`/x`) and
/// document-relative forms. `None` means "skip this image": the source could
/// not be resolved or resolves to something other than http(s).
pub fn to_absolute_url(src: &str, page_url: &Url) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    if src.starts_with("http://") || src.starts_with("https://") {
        return Url::parse(src).ok().map(|_| src.to_string());
    }

    let resolved = if let Some(rest) = src.strip_prefix("//") {
        Url::parse(&format!("{}://{rest}", page_url.scheme())).ok()?
    } else {
        page_url.join(src).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        other => {
            log::debug!("{src}: unsupported scheme {other}");
            None
        }
    }
}

pub fn is_svg_reference(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(".svg") || lower.contains(".svg?")
}

/// Last path segment of a URL, query and fragment stripped, lowercased.
pub fn filename_of(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or_default();
    let end = last.find(['?', '#']).unwrap_or(last.len());
    last[..end].to_lowercase()
}

/// Host as shown on the card: `www.` removed.
pub fn display_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://www.example.com/blog/post.html").unwrap()
    }

    #[test]
    fn test_bare_domain_gets_https() {
        let url = normalize_input_url("example.com/page").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_existing_scheme_kept() {
        let url = normalize_input_url("  HTTP://example.com  ").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(normalize_input_url("   ").is_none());
    }

    #[test]
    fn test_history_key_strips_tracking() {
        let url = Url::parse("https://EXAMPLE.com/page/?utm_source=x&id=4&fbclid=y").unwrap();
        assert_eq!(history_key(&url), "https://example.com/page?id=4");
    }

    #[test]
    fn test_history_key_keeps_root_slash() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(history_key(&url), "https://example.com/");
    }

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(
            to_absolute_url("https://cdn.example.com/a.png", &page()).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            to_absolute_url("//cdn.example.com/a.png", &page()).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(
            to_absolute_url("/img/a.png", &page()).as_deref(),
            Some("https://www.example.com/img/a.png")
        );
    }

    #[test]
    fn test_document_relative() {
        assert_eq!(
            to_absolute_url("images/a.png", &page()).as_deref(),
            Some("https://www.example.com/blog/images/a.png")
        );
        assert_eq!(
            to_absolute_url("../a.png", &page()).as_deref(),
            Some("https://www.example.com/a.png")
        );
    }

    #[test]
    fn test_unresolvable_is_none() {
        assert!(to_absolute_url("", &page()).is_none());
        assert!(to_absolute_url("javascript:void(0)", &page()).is_none());
        assert!(to_absolute_url("http://[::1", &page()).is_none());
    }

    #[test]
    fn test_svg_detection() {
        assert!(is_svg_reference("https://a.com/logo.svg"));
        assert!(is_svg_reference("https://a.com/logo.SVG?v=2"));
        assert!(!is_svg_reference("https://a.com/logo.svg.png"));
        assert!(!is_svg_reference("https://a.com/svg/logo.png"));
    }

    #[test]
    fn test_filename_of() {
        assert_eq!(filename_of("https://a.com/x/Hero-Image.JPG?w=1200"), "hero-image.jpg");
        assert_eq!(filename_of("https://a.com/x/photo.png#frag"), "photo.png");
        assert_eq!(filename_of("https://a.com/"), "");
    }

    #[test]
    fn test_display_domain() {
        assert_eq!(display_domain(&page()), "example.com");
        let plain = Url::parse("https://news.example.org").unwrap();
        assert_eq!(display_domain(&plain), "news.example.org");
    }
}
