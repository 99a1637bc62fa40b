use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::db::RecordKey;
use crate::importers::ImportMode;

pub mod formatters;

#[derive(Parser)]
#[command(name = "quotedesk")]
#[command(
    version,
    about = "Import quotation spreadsheets from suppliers into a local database"
)]
#[command(
    long_about = "Ingest supplier quotation sheets (CSV or Excel), normalize their headers, validate and deduplicate the rows by reference code, and keep the resulting quotation records with derived volumes, weights and amounts."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Database file (overrides QUOTEDESK_DB and the config file)
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (overrides QUOTEDESK_CONFIG)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import one or more quotation sheets (CSV or Excel)
    Import {
        /// Sheet files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Header row convention (default from config, else standard)
        #[arg(short, long, value_enum)]
        mode: Option<ImportMode>,

        /// Shop number stamped on every record
        #[arg(long)]
        shop: Option<String>,

        /// Supplier contact name
        #[arg(long)]
        contact_name: Option<String>,

        /// Supplier contact phone
        #[arg(long)]
        contact_phone: Option<String>,

        /// Quotation date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long)]
        date: Option<String>,

        /// Product segment
        #[arg(long)]
        segment: Option<String>,

        /// Worksheet name for Excel files (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,

        /// Store the new records even when some rows are invalid or duplicated
        #[arg(long, conflicts_with = "dry_run")]
        apply_new: bool,
    },

    /// List stored quotations
    List,

    /// Edit one field of a stored quotation (derived fields are recomputed)
    Update {
        /// Record key (see `list`)
        key: RecordKey,

        /// Field name (camelCase, e.g. unitPriceRmb)
        field: String,

        /// New value
        value: String,
    },

    /// Delete a stored quotation and its comments
    Delete {
        /// Record key (see `list`)
        key: RecordKey,
    },

    /// Quotation comments
    Comment {
        #[command(subcommand)]
        action: CommentCommands,
    },

    /// Export all stored quotations to CSV
    Export {
        /// Output CSV path
        path: PathBuf,
    },

    /// Show how a sheet's header row maps onto quotation fields
    Inspect {
        /// Path to the Excel or CSV file
        file: PathBuf,

        /// Header row convention
        #[arg(short, long, value_enum, default_value_t = ImportMode::Standard)]
        mode: ImportMode,

        /// Worksheet name for Excel files
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CommentCommands {
    /// Add a comment to a quotation
    Add {
        key: RecordKey,

        text: String,

        /// Comment author
        #[arg(long, default_value = "quotedesk")]
        author: String,
    },

    /// List the comments of a quotation
    List { key: RecordKey },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import_with_options() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "--json",
            "import",
            "a.csv",
            "b.xlsx",
            "--mode",
            "header-at-row2",
            "--shop",
            "S1",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Import {
                files,
                mode,
                shop,
                dry_run,
                apply_new,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(mode, Some(ImportMode::HeaderAtRow2));
                assert_eq!(shop.as_deref(), Some("S1"));
                assert!(dry_run);
                assert!(!apply_new);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_dry_run_conflicts_with_apply_new() {
        let result = Cli::try_parse_from(["quotedesk", "import", "a.csv", "--dry-run", "--apply-new"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["quotedesk", "list", "--db", "/tmp/q.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/q.db")));
    }
}
