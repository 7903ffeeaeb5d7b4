use crate::config::ImageMode;
use clap::{Args as ClapArgs, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Chat-friendly Markdown
    #[default]
    Markdown,
    /// HTML with inline styles for email clients
    Email,
    /// HTML table for pasting into documents
    Document,
    /// Card descriptor and selection details as JSON
    Json,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// Page url, `https://` is assumed when missing
    #[clap(allow_hyphen_values = true)]
    pub url: String,

    /// Where the card image comes from. Defaults to the configured mode.
    #[clap(short, long, value_enum)]
    pub mode: Option<ImageMode>,

    /// Directory the PNG files are written to
    #[clap(short, long, default_value = ".")]
    pub out: PathBuf,

    /// What to print
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Neither reuse nor store cards in history
    #[clap(long, default_value = "false")]
    pub no_history: bool,

    /// Print every selection decision as JSON lines on stderr
    #[clap(long, default_value = "false")]
    pub trace: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryArgs {
    /// List stored cards, oldest first
    List,
    /// Print the stored card for a url
    Show {
        #[clap(allow_hyphen_values = true)]
        url: String,

        #[clap(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Remove all stored cards
    Clear,
}
