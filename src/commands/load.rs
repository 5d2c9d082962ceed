//! `credcache load [USER] [CONTEXT] [--reveal]`

use clap::Args;
use serde::Serialize;
use zeroize::Zeroize;

use crate::commands::{CommandContext, CommandOutput};
use crate::error::CommandResult;
use crate::secrets::DataProtector;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// User name (defaults to the current user)
    pub user: Option<String>,

    /// Context to read from (defaults to CREDCACHE_CONTEXT or `default`)
    pub context: Option<String>,

    /// Print the decrypted secret on stdout
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOutput {
    pub context: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Drop for LoadOutput {
    fn drop(&mut self) {
        if let Some(secret) = self.secret.as_mut() {
            secret.zeroize();
        }
    }
}

impl CommandOutput for LoadOutput {
    fn to_human(&self) -> String {
        match &self.secret {
            // bare value so `$(credcache load --reveal ...)` works
            Some(secret) => secret.clone(),
            None => format!(
                "Credential '{}' in context '{}' is available",
                self.user_name, self.context
            ),
        }
    }
}

pub fn execute<P: DataProtector>(
    args: LoadArgs,
    ctx: &mut CommandContext<P>,
) -> CommandResult<LoadOutput> {
    let key = ctx.key(args.user, args.context)?;
    let credential = ctx.store.load(&key)?;

    Ok(LoadOutput {
        context: key.context().to_string(),
        user_name: credential.user_name().to_string(),
        secret: args.reveal.then(|| credential.secret().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::prompt::ScriptedPrompter;
    use crate::models::RecordKey;
    use tempfile::tempdir;

    fn args(user: &str, reveal: bool) -> LoadArgs {
        LoadArgs {
            user: Some(user.to_string()),
            context: Some("chat".to_string()),
            reveal,
        }
    }

    #[test]
    fn test_load_hides_secret_unless_revealed() {
        let dir = tempdir().unwrap();
        let mut ctx = test_support::context(dir.path(), ScriptedPrompter::new().with_secrets(["tok"]));
        let key = RecordKey::new("chat", "bot").unwrap();
        ctx.store.save(&key, ctx.prompter.as_mut(), None).unwrap();

        let hidden = execute(args("bot", false), &mut ctx).unwrap();
        assert!(hidden.secret.is_none());
        assert!(!hidden.to_human().contains("tok"));
        assert!(hidden.to_json().get("secret").is_none());

        let shown = execute(args("bot", true), &mut ctx).unwrap();
        assert_eq!(shown.to_human(), "tok");
    }

    #[test]
    fn test_load_missing_reports_not_found() {
        let dir = tempdir().unwrap();
        let mut ctx = test_support::context(dir.path(), ScriptedPrompter::new());
        let err = execute(args("nobody", false), &mut ctx).unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.message.contains("credcache save"));
    }
}
