use super::{gray_png, page, png, FakeFetcher};
use crate::app::{errors::AppError, CardGenerator, GenerateOptions};
use crate::config::{Config, ImageMode};
use crate::history::CardHistory;
use crate::scrape::{FetchError, Fetcher};
use crate::selection::trace::{LogSink, RecordingSink, TraceEvent};
use crate::storage::BackendLocal;
use crate::templates::ImageKind;
use std::sync::Arc;

const PAGE_URL: &str = "https://example.com/post";
const HERO_URL: &str = "https://example.com/img/example-hero.jpg";

fn article_page() -> String {
    let description = "word ".repeat(40);
    page(
        &format!(
            r#"<title>Tag title</title>
               <meta property="og:title" content="Hero &amp; Friends">
               <meta name="description" content="{description}">"#
        ),
        r#"<nav><img src="/img/menu.png"></nav>
           <article><p><img src="/img/example-hero.jpg"></p></article>"#,
    )
}

/// Generator over `fetcher` with history stored in a fresh temp dir.
fn create_generator(
    fetcher: Arc<FakeFetcher>,
    config: Config,
) -> (CardGenerator, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let storage = BackendLocal::new(tmp.path().to_str().unwrap()).expect("failed to create storage");
    let history = CardHistory::new(Arc::new(storage), config.history_length);
    let shared: Arc<dyn Fetcher> = fetcher;

    let generator = CardGenerator::new(config, shared, history).expect("failed to create generator");
    (generator, tmp)
}

fn options(mode: ImageMode) -> GenerateOptions {
    GenerateOptions {
        mode,
        use_history: false,
    }
}

fn decoded_size(png: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(png).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn test_smart_select_uses_page_image() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_page(PAGE_URL, &article_page())
            .with(HERO_URL, gray_png(1200, 630))
            .with("https://example.com/img/menu.png", gray_png(1200, 630)),
    );
    let (generator, _tmp) = create_generator(fetcher, Config::default());
    let sink = RecordingSink::default();

    let card = generator
        .generate("example.com/post", &options(ImageMode::SmartSelect), &sink)
        .await
        .unwrap();

    let d = &card.descriptor;
    assert_eq!(d.title, "Hero & Friends");
    assert_eq!(d.description.chars().count(), 133);
    assert!(d.description.ends_with("..."));
    assert_eq!(d.domain, "example.com");
    assert_eq!(d.link_url, PAGE_URL);
    assert_eq!(d.image_kind, ImageKind::PageImage);
    assert_eq!(d.image_source.as_deref(), Some(HERO_URL));
    assert!(d.thumbnail.starts_with("data:image/png;base64,"));

    assert_eq!(card.tier, Some(0));
    assert_eq!(decoded_size(&card.thumbnail_png), (200, 112));
    assert!(card.full_size_png.is_none());
    assert!(card.source_image.is_some());
    assert!(!card.from_history);

    assert!(sink
        .events()
        .iter()
        .any(|event| matches!(event, TraceEvent::Winner { source, .. } if source == HERO_URL)));
}

#[tokio::test]
async fn test_no_usable_image_generates_domain_card() {
    let fetcher = Arc::new(
        FakeFetcher::new().with_page(PAGE_URL, &page("<title>Bare</title>", "<p>no images</p>")),
    );
    let (generator, _tmp) = create_generator(fetcher, Config::default());

    let card = generator
        .generate(PAGE_URL, &options(ImageMode::SmartSelect), &LogSink)
        .await
        .unwrap();

    assert_eq!(card.descriptor.image_kind, ImageKind::DomainCard);
    assert_eq!(card.descriptor.title, "Bare");
    assert_eq!(card.descriptor.description, "");
    assert_eq!(card.tier, None);
    assert_eq!(decoded_size(card.full_size_png.as_ref().unwrap()), (1200, 630));
    assert_eq!(decoded_size(&card.thumbnail_png), (200, 112));
}

#[tokio::test]
async fn test_brand_mode_skips_page_scan() {
    let config = Config::default();
    let icon_url = config.favicon_url("example.com");
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_page(PAGE_URL, &article_page())
            .with(HERO_URL, gray_png(1200, 630))
            .with(&icon_url, png(32, 32, [200, 30, 30, 255])),
    );
    let (generator, _tmp) = create_generator(fetcher.clone(), config);

    let card = generator
        .generate(PAGE_URL, &options(ImageMode::BrandCards), &LogSink)
        .await
        .unwrap();

    assert_eq!(card.descriptor.image_kind, ImageKind::BrandCard);
    assert!(card.descriptor.border_color.is_some());
    assert!(card.full_size_png.is_some());
    assert_eq!(fetcher.request_count(HERO_URL), 0);
    assert_eq!(fetcher.request_count(&icon_url), 1);
}

#[tokio::test]
async fn test_declared_only_skips_validation() {
    let html = page(r#"<meta property="og:image" content="/small.png">"#, "");
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_page(PAGE_URL, &html)
            .with("https://example.com/small.png", gray_png(120, 60)),
    );
    let (generator, _tmp) = create_generator(fetcher, Config::default());

    let card = generator
        .generate(PAGE_URL, &options(ImageMode::DeclaredOnly), &LogSink)
        .await
        .unwrap();

    assert_eq!(card.descriptor.image_kind, ImageKind::DeclaredPreview);
    assert_eq!(
        card.descriptor.image_source.as_deref(),
        Some("https://example.com/small.png")
    );
}

#[tokio::test]
async fn test_declared_only_without_image_uses_placeholder() {
    let fetcher = Arc::new(FakeFetcher::new().with_page(PAGE_URL, &page("", "")));
    let (generator, _tmp) = create_generator(fetcher, Config::default());

    let card = generator
        .generate(PAGE_URL, &options(ImageMode::DeclaredOnly), &LogSink)
        .await
        .unwrap();

    assert_eq!(card.descriptor.image_kind, ImageKind::Placeholder);
    assert!(card.full_size_png.is_none());
    let thumb = image::load_from_memory(&card.thumbnail_png).unwrap().to_rgba8();
    assert_eq!(thumb.get_pixel(100, 56).0, [0xf5, 0xf5, 0xf7, 255]);
}

#[tokio::test]
async fn test_forced_domain_card() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_page(PAGE_URL, &article_page())
            .with(HERO_URL, gray_png(1200, 630)),
    );
    let (generator, _tmp) = create_generator(fetcher.clone(), Config::default());

    let card = generator
        .generate(PAGE_URL, &options(ImageMode::DomainCard), &LogSink)
        .await
        .unwrap();

    assert_eq!(card.descriptor.image_kind, ImageKind::DomainCard);
    assert_eq!(fetcher.request_count(HERO_URL), 0);
}

#[tokio::test]
async fn test_invalid_url_is_hard_failure() {
    let fetcher = Arc::new(FakeFetcher::new());
    let (generator, _tmp) = create_generator(fetcher.clone(), Config::default());

    let err = generator
        .generate("http://", &options(ImageMode::SmartSelect), &LogSink)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidUrl(_)));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_page_fetch_error_carries_user_message() {
    let fetcher = Arc::new(FakeFetcher::new().with_error(PAGE_URL, FetchError::Status(403)));
    let (generator, _tmp) = create_generator(fetcher, Config::default());

    let err = generator
        .generate(PAGE_URL, &options(ImageMode::SmartSelect), &LogSink)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Fetch(FetchError::Status(403))));
    assert!(err.user_message().contains("403"));
}

#[tokio::test]
async fn test_history_reuses_card() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .with_page(PAGE_URL, &article_page())
            .with(HERO_URL, gray_png(1200, 630)),
    );
    let (generator, _tmp) = create_generator(fetcher.clone(), Config::default());
    let with_history = GenerateOptions {
        mode: ImageMode::SmartSelect,
        use_history: true,
    };

    let first = generator.generate(PAGE_URL, &with_history, &LogSink).await.unwrap();
    let second = generator
        .generate("https://example.com/post/?utm_source=feed", &with_history, &LogSink)
        .await
        .unwrap();

    assert!(!first.from_history);
    assert!(second.from_history);
    assert_eq!(second.descriptor, first.descriptor);
    assert_eq!(second.thumbnail_png, first.thumbnail_png);
    assert_eq!(fetcher.request_count(PAGE_URL), 1);
    assert_eq!(generator.history().list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_history_neither_reads_nor_records() {
    let fetcher = Arc::new(FakeFetcher::new().with_page(PAGE_URL, &page("", "")));
    let (generator, _tmp) = create_generator(fetcher.clone(), Config::default());

    generator
        .generate(PAGE_URL, &options(ImageMode::DomainCard), &LogSink)
        .await
        .unwrap();
    generator
        .generate(PAGE_URL, &options(ImageMode::DomainCard), &LogSink)
        .await
        .unwrap();

    assert_eq!(fetcher.request_count(PAGE_URL), 2);
    assert!(generator.history().list().unwrap().is_empty());
}
