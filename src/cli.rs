use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// authtoken: dry-run admission and selection for OAuth authorize tokens
#[derive(Parser)]
#[command(name = "authtoken", version, about)]
pub struct Cli {
    /// OAuth clients file (YAML or JSON). Overrides AUTHTOKEN_CLIENTS_FILE.
    #[arg(long, global = true)]
    pub clients: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the create path against a token
    Validate {
        /// Token file (YAML or JSON)
        token: PathBuf,
    },

    /// Run the update path, replacing OLD with NEW
    ValidateUpdate {
        old: PathBuf,
        new: PathBuf,
    },

    /// Print the label and field sets selectors see for a token
    Attrs { token: PathBuf },

    /// Print the tokens matching the given selectors
    Match {
        /// Token files (YAML or JSON)
        #[arg(required = true)]
        tokens: Vec<PathBuf>,
        /// Label selector, e.g. "app=console,env in (prod)"
        #[arg(short = 'l', long, default_value = "")]
        selector: String,
        /// Field selector, e.g. "clientName=console"
        #[arg(long, default_value = "")]
        field_selector: String,
    },
}
