mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumora_core::Paths;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lumora")]
#[command(about = "Anchor, persist and restore text highlights in HTML pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (default: ~/.lumora)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Highlight the first occurrence of a text on a page
    Highlight {
        /// HTML file treated as the page
        file: PathBuf,

        /// The selected text to wrap
        text: String,

        /// Palette color: yellow, green, blue, pink, orange, purple
        #[arg(short, long)]
        color: Option<String>,

        /// Write the annotated page here instead of in place
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-apply saved highlights to a page
    Restore {
        file: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List saved highlights for a page
    List { file: PathBuf },

    /// Remove one highlight by id
    Remove {
        file: PathBuf,
        id: String,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Remove every highlight on a page
    Clear {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Flash one highlight and report whether it is rendered
    Jump {
        file: PathBuf,
        id: String,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace the stored text of one highlight
    Edit {
        file: PathBuf,
        id: String,
        text: String,
    },

    /// Print every highlight text, clipboard-ready
    Copy { file: PathBuf },

    /// Export highlights as JSON or plain text
    Export {
        file: PathBuf,

        /// json or text
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write here instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Drop highlights older than the retention window, across all pages
    Prune {
        /// Retention window in days (default: config retentionDays)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show or change user settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Interactive session on one page, wired through the message bus
    Session { file: PathBuf },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print current settings
    Show,

    /// Update settings
    Set {
        /// Default highlight color
        #[arg(long)]
        color: Option<String>,

        /// Persist highlights automatically after each change
        #[arg(long)]
        auto_save: Option<bool>,

        /// Show outcome notifications
        #[arg(long)]
        notifications: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let paths = cli
        .data_dir
        .map(Paths::with_base)
        .unwrap_or_default();

    match cli.command {
        Commands::Highlight {
            file,
            text,
            color,
            out,
        } => commands::highlight(&paths, &file, &text, color.as_deref(), out.as_deref()).await,
        Commands::Restore { file, out } => commands::restore(&paths, &file, out.as_deref()).await,
        Commands::List { file } => commands::list(&paths, &file).await,
        Commands::Remove { file, id, out } => {
            commands::remove(&paths, &file, &id, out.as_deref()).await
        }
        Commands::Clear { file, yes, out } => {
            commands::clear(&paths, &file, yes, out.as_deref()).await
        }
        Commands::Jump { file, id, out } => {
            commands::jump(&paths, &file, &id, out.as_deref()).await
        }
        Commands::Edit { file, id, text } => commands::edit(&paths, &file, &id, &text).await,
        Commands::Copy { file } => commands::copy(&paths, &file).await,
        Commands::Export {
            file,
            format,
            output,
        } => commands::export(&paths, &file, &format, output.as_deref()).await,
        Commands::Prune { days } => commands::prune(&paths, days).await,
        Commands::Settings { command } => match command {
            SettingsCommands::Show => commands::settings_show(&paths),
            SettingsCommands::Set {
                color,
                auto_save,
                notifications,
            } => commands::settings_set(&paths, color.as_deref(), auto_save, notifications),
        },
        Commands::Session { file } => commands::session(&paths, &file).await,
    }
}
