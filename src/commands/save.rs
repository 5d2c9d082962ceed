//! `credcache save [USER] [CONTEXT] [--verify PROGRAM]`

use clap::Args;
use serde::Serialize;

use crate::commands::{CommandContext, CommandOutput};
use crate::error::CommandResult;
use crate::secrets::DataProtector;
use crate::verify::{CommandVerifier, Verifier};

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// User name, `DOMAIN\user` for domain accounts (defaults to the current user)
    pub user: Option<String>,

    /// Context to save under (defaults to CREDCACHE_CONTEXT or `default`)
    pub context: Option<String>,

    /// Program that must accept the credential before it is saved.
    /// Receives the user name in CREDCACHE_USER and the password on stdin.
    #[arg(long, value_name = "PROGRAM")]
    pub verify: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutput {
    pub saved: bool,
    pub context: String,
    pub user_name: String,
}

impl CommandOutput for SaveOutput {
    fn to_human(&self) -> String {
        if self.saved {
            format!(
                "Saved credential '{}' in context '{}'",
                self.user_name, self.context
            )
        } else {
            "Cancelled, nothing saved".to_string()
        }
    }
}

pub fn execute<P: DataProtector>(
    args: SaveArgs,
    ctx: &mut CommandContext<P>,
) -> CommandResult<SaveOutput> {
    let key = ctx.key(args.user, args.context)?;
    let mut verifier = args
        .verify
        .as_deref()
        .map(CommandVerifier::from_command_line)
        .transpose()?;

    let saved = ctx.store.save(
        &key,
        ctx.prompter.as_mut(),
        verifier.as_mut().map(|v| v as &mut dyn Verifier),
    )?;

    Ok(SaveOutput {
        saved: saved.is_some(),
        context: key.context().to_string(),
        user_name: key.user_name().to_string(),
    })
}
