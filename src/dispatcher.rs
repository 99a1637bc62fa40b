//! Command dispatcher that routes parsed CLI commands to their handlers.

mod imports;
mod inspect;
mod records;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::{Cli, Commands, CommentCommands};
use crate::config::Config;

/// Settings every handler needs, resolved once per invocation
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub db_path: PathBuf,
    pub json_output: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let db_path = config.db_path(cli.db.as_deref())?;
        debug!("Using database {:?}", db_path);
        Ok(Self {
            config,
            db_path,
            json_output: cli.json,
        })
    }
}

/// Route a parsed command to its handler
pub async fn dispatch(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_cli(&cli)?;

    match cli.command {
        Commands::Import {
            files,
            mode,
            shop,
            contact_name,
            contact_phone,
            date,
            segment,
            sheet,
            dry_run,
            apply_new,
        } => {
            let args = imports::ImportArgs {
                files,
                mode,
                shop,
                contact_name,
                contact_phone,
                date,
                segment,
                sheet,
                dry_run,
                apply_new,
            };
            imports::dispatch_import(args, &ctx).await
        }
        Commands::List => records::dispatch_list(&ctx).await,
        Commands::Update { key, field, value } => {
            records::dispatch_update(key, &field, value, &ctx).await
        }
        Commands::Delete { key } => records::dispatch_delete(key, &ctx).await,
        Commands::Comment { action } => match action {
            CommentCommands::Add { key, text, author } => {
                records::dispatch_comment_add(key, &author, &text, &ctx).await
            }
            CommentCommands::List { key } => records::dispatch_comment_list(key, &ctx).await,
        },
        Commands::Export { path } => records::dispatch_export(&path, &ctx).await,
        Commands::Inspect { file, mode, sheet } => {
            inspect::dispatch_inspect(&file, mode, sheet.as_deref(), ctx.json_output).await
        }
    }
}
