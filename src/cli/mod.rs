use clap::{Parser, Subcommand};

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a link preview card for a page
    Generate {
        #[clap(flatten)]
        args: GenerateArgs,
    },
    /// Inspect or clear recently generated cards
    History {
        #[clap(subcommand)]
        action: HistoryArgs,
    },
    /// Print the brand palette derived from a site's icon
    Palette {
        /// Domain or url of the site
        #[clap(allow_hyphen_values = true)]
        domain: String,
    },
}
