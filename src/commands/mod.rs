//! CLI commands
//!
//! `credcache save | load | delete | list`. Each command resolves its key from
//! the arguments, falling back to the current identity and the default context.

pub mod delete;
pub mod list;
pub mod load;
pub mod save;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::StoreConfig;
use crate::error::CommandResult;
use crate::identity::Identity;
use crate::models::RecordKey;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::secrets::{CredentialStore, DataProtector};

#[derive(Parser, Debug)]
#[command(name = "credcache", version, about = "Encrypted per-context credential cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Store root (overrides CREDCACHE_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prompt for a password and save it encrypted
    Save(save::SaveArgs),
    /// Decrypt a saved credential
    Load(load::LoadArgs),
    /// Remove one saved credential, or all of them with --all
    Delete(delete::DeleteArgs),
    /// List saved credentials
    List(list::ListArgs),
}

/// Everything a command needs, injected so commands run without a terminal
pub struct CommandContext<P> {
    pub store: CredentialStore<P>,
    pub prompter: Box<dyn Prompter>,
    pub identity: Identity,
    pub default_context: String,
}

impl<P> CommandContext<P> {
    /// Key for the given arguments, defaulting user and context
    pub fn key(&self, user: Option<String>, context: Option<String>) -> CommandResult<RecordKey> {
        let user = user.unwrap_or_else(|| self.identity.user_name());
        let context = context.unwrap_or_else(|| self.default_context.clone());
        Ok(RecordKey::new(context, user)?)
    }
}

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Build the keychain-backed store from the environment and run `cli`
pub fn run(cli: Cli) -> CommandResult<()> {
    let mut config = StoreConfig::from_env()?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }

    let mut ctx = CommandContext {
        store: CredentialStore::open(&config),
        prompter: Box::new(TerminalPrompter::new()),
        identity: Identity::current(),
        default_context: config.default_context.clone(),
    };
    dispatch(cli.command, &mut ctx, cli.json)
}

pub fn dispatch<P: DataProtector>(
    command: Commands,
    ctx: &mut CommandContext<P>,
    json_mode: bool,
) -> CommandResult<()> {
    match command {
        Commands::Save(args) => output(&save::execute(args, ctx)?, json_mode),
        Commands::Load(args) => output(&load::execute(args, ctx)?, json_mode),
        Commands::Delete(args) => output(&delete::execute(args, ctx)?, json_mode),
        Commands::List(args) => output(&list::execute(args, ctx)?, json_mode),
    }
    Ok(())
}
