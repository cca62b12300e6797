use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "ytdigest", about = "YouTube video summaries and recipes", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// LLM model for this run, overriding the config file
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Show config and pipeline details on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8080
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Summarize a video from its title and description
    Summarize {
        /// YouTube video URL (reads one per line from stdin if omitted)
        url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Extract a recipe with timestamped steps from a cooking video
    Recipe {
        /// YouTube video URL (reads one per line from stdin if omitted)
        url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
