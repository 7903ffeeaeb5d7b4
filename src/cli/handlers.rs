use super::types::{GenerateArgs, HistoryArgs, OutputFormat};
use crate::{
    app::{CardGenerator, GenerateOptions, GeneratedCard},
    cards::brand::BrandPalette,
    colors::contrast_ratio,
    config::CardStyle,
    images,
    metadata::normalize::{history_key, normalize_input_url},
    selection::trace::{LogSink, RecordingSink, Tee},
    templates::{self, CardDescriptor},
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;

const THUMBNAIL_FILE: &str = "og-card-thumbnail.png";
const FULL_SIZE_FILE: &str = "og-card.png";

#[derive(Serialize)]
struct GenerateReport<'a> {
    card: &'a CardDescriptor,
    tier: Option<usize>,
    canonical_url: Option<&'a str>,
    from_history: bool,
    files: Vec<String>,
}

#[derive(Serialize)]
struct PaletteReport<'a> {
    host: &'a str,
    #[serde(flatten)]
    palette: &'a BrandPalette,
    /// Logo against background, 1 to 21.
    contrast: f64,
}

fn render(card: &CardDescriptor, format: OutputFormat, style: &CardStyle) -> Result<String> {
    Ok(match format {
        OutputFormat::Markdown => templates::markdown(card),
        OutputFormat::Email => templates::email_html(card, style),
        OutputFormat::Document => templates::document_html(card, style),
        OutputFormat::Json => serde_json::to_string_pretty(card)?,
    })
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<String> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_string_lossy().to_string())
}

/// Write the card images to `dir`, returning the written paths.
pub fn write_card_files(card: &GeneratedCard, dir: &Path) -> Result<Vec<String>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut files = vec![write_file(dir, THUMBNAIL_FILE, &card.thumbnail_png)?];

    if let Some(full_size) = &card.full_size_png {
        files.push(write_file(dir, FULL_SIZE_FILE, full_size)?);
    }

    if let Some(source) = &card.source_image {
        let name = format!("og-source.{}", images::file_extension(source));
        files.push(write_file(dir, &name, source)?);
    }

    Ok(files)
}

pub async fn handle_generate(generator: &CardGenerator, args: GenerateArgs) -> Result<()> {
    let options = GenerateOptions {
        mode: args.mode.unwrap_or(generator.config().image_mode),
        use_history: !args.no_history,
    };

    let recorder = RecordingSink::default();
    let sink = Tee(&LogSink, &recorder);

    let card = match generator.generate(&args.url, &options, &sink).await {
        Ok(card) => card,
        Err(err) => {
            log::error!("{err:?}");
            bail!(err.user_message());
        }
    };

    if args.trace {
        for event in recorder.events() {
            eprintln!("{}", serde_json::to_string(&event)?);
        }
    }

    let files = write_card_files(&card, &args.out)?;
    for file in &files {
        log::info!("wrote {file}");
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&GenerateReport {
            card: &card.descriptor,
            tier: card.tier,
            canonical_url: card.canonical_url.as_deref(),
            from_history: card.from_history,
            files,
        })?,
        format => render(&card.descriptor, format, &generator.config().style)?,
    };
    println!("{output}");

    Ok(())
}

pub fn handle_history(generator: &CardGenerator, action: HistoryArgs) -> Result<()> {
    let history = generator.history();

    match action {
        HistoryArgs::List => {
            let entries = history.list()?;
            if entries.is_empty() {
                println!("history is empty");
            }
            for entry in entries {
                println!(
                    "{}  {}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.key,
                    entry.card.title
                );
            }
        }
        HistoryArgs::Show { url, format } => {
            let Some(parsed) = normalize_input_url(&url) else {
                bail!("'{url}' does not look like a valid URL.");
            };
            match history.find(&history_key(&parsed))? {
                Some(entry) => {
                    println!("{}", render(&entry.card, format, &generator.config().style)?)
                }
                None => bail!("no card stored for {url}"),
            }
        }
        HistoryArgs::Clear => {
            history.clear()?;
            println!("history cleared");
        }
    }

    Ok(())
}

pub async fn handle_palette(generator: &CardGenerator, domain: String) -> Result<()> {
    let host = normalize_input_url(&domain)
        .and_then(|url| url.host_str().map(str::to_string))
        .with_context(|| format!("'{domain}' does not look like a domain"))?;

    match generator.brand_palette(&host).await {
        Some(palette) => {
            let report = PaletteReport {
                host: &host,
                contrast: contrast_ratio(&palette.background, &palette.logo),
                palette: &palette,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => bail!("could not load an icon for {host}"),
    }

    Ok(())
}
