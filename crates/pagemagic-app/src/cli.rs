use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// PageMagic: restyle web pages by describing the change in plain words.
#[derive(Parser, Debug)]
#[command(name = "pagemagic", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the storage files.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// The page a command acts on.
#[derive(ClapArgs, Debug, Clone)]
pub struct PageArgs {
    /// Page URL; selects the history scope.
    #[arg(long)]
    pub url: String,

    /// Saved HTML of the page. An empty document is used when omitted.
    #[arg(long)]
    pub html: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate CSS for a request and apply it to the page.
    Apply {
        #[command(flatten)]
        page: PageArgs,
        /// Write the styled page here.
        #[arg(long)]
        out: Option<PathBuf>,
        /// What to change, e.g. "make the text bigger".
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Print the page with its stored CSS applied.
    Render {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the changes stored for the page.
    History {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Enable or disable one change.
    Toggle {
        #[command(flatten)]
        page: PageArgs,
        id: String,
    },
    /// Remove one change and print its request for rewording.
    Edit {
        #[command(flatten)]
        page: PageArgs,
        id: String,
    },
    /// Permanently remove one change.
    Remove {
        #[command(flatten)]
        page: PageArgs,
        id: String,
    },
    /// Disable every change, or enable them all when all are disabled.
    ToggleAll {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Remove every change for the page.
    RemoveAll {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Apply changes to this page only or to the entire domain.
    Scope {
        #[command(flatten)]
        page: PageArgs,
        #[arg(value_enum)]
        scope: ScopeArg,
    },
    /// API key and model.
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Cost and request counts.
    Usage {
        /// Day to report (YYYY-MM-DD, UTC). Defaults to today.
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Storage statistics.
    Stats,
    /// Customized pages and domains.
    Sites {
        #[command(subcommand)]
        action: SitesCommand,
    },
    /// Delete stored data.
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    SetKey { key: String },
    SetModel { model: String },
    /// List the free models available to the saved key.
    Models,
    /// Check a key and model with a small request. Saved values are kept.
    Test {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SitesCommand {
    List,
    Toggle {
        url: String,
        #[arg(long)]
        domain: bool,
    },
    Delete {
        url: String,
        #[arg(long)]
        domain: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    Page,
    Domain,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    /// History and applied CSS of every site.
    Css,
    /// Usage records and the model lookup.
    Usage,
    /// Everything, including the API key.
    All,
}

pub fn parse() -> Args {
    Args::parse()
}
