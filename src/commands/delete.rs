//! `credcache delete [USER] [CONTEXT] [--yes]` / `credcache delete --all [--yes]`

use clap::Args;
use serde::Serialize;

use crate::commands::{CommandContext, CommandOutput};
use crate::error::CommandResult;
use crate::secrets::{DataProtector, DeleteOutcome};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// User name (defaults to the current user)
    pub user: Option<String>,

    /// Context to delete from (defaults to CREDCACHE_CONTEXT or `default`)
    pub context: Option<String>,

    /// Remove every saved credential in every context
    #[arg(long, conflicts_with_all = ["user", "context"])]
    pub all: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutput {
    pub outcome: DeleteOutcome,
    pub target: String,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        match self.outcome {
            DeleteOutcome::Removed => format!("Removed {}", self.target),
            DeleteOutcome::Missing => format!("Nothing to remove: {} does not exist", self.target),
            DeleteOutcome::Declined => format!("Kept {}", self.target),
            DeleteOutcome::NotConfirmed => {
                format!("Not removed: {} requires --all", self.target)
            }
        }
    }
}

pub fn execute<P: DataProtector>(
    args: DeleteArgs,
    ctx: &mut CommandContext<P>,
) -> CommandResult<DeleteOutput> {
    if args.all {
        let outcome = ctx
            .store
            .delete_all(true, ctx.prompter.as_mut(), args.yes)?;
        return Ok(DeleteOutput {
            outcome,
            target: "all saved credentials".to_string(),
        });
    }

    let key = ctx.key(args.user, args.context)?;
    let outcome = ctx.store.delete(&key, ctx.prompter.as_mut(), args.yes)?;
    Ok(DeleteOutput {
        outcome,
        target: format!("credential {}", key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::models::RecordKey;
    use crate::prompt::ScriptedPrompter;
    use tempfile::tempdir;

    #[test]
    fn test_delete_missing_succeeds_with_notice() {
        let dir = tempdir().unwrap();
        let mut ctx = test_support::context(dir.path(), ScriptedPrompter::new());
        let out = execute(
            DeleteArgs {
                user: Some("ghost".into()),
                context: Some("chat".into()),
                all: false,
                yes: false,
            },
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out.outcome, DeleteOutcome::Missing);
        assert!(out.to_human().starts_with("Nothing to remove"));
    }

    #[test]
    fn test_delete_all_with_yes_skips_prompt() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let mut ctx = test_support::context(&root, ScriptedPrompter::new().with_secrets(["a", "b"]));
        for user in ["one", "two"] {
            let key = RecordKey::new("chat", user).unwrap();
            ctx.store.save(&key, ctx.prompter.as_mut(), None).unwrap();
        }

        let out = execute(
            DeleteArgs {
                user: None,
                context: None,
                all: true,
                yes: true,
            },
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out.outcome, DeleteOutcome::Removed);
        assert!(!root.exists());
    }

    #[test]
    fn test_delete_all_refuses_root_with_other_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a credential").unwrap();
        let mut ctx = test_support::context(dir.path(), ScriptedPrompter::new());

        let err = execute(
            DeleteArgs {
                user: None,
                context: None,
                all: true,
                yes: true,
            },
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(err.code, "NOT_A_STORE");
        assert!(dir.path().join("notes.txt").is_file());
    }
}
