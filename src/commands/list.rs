//! `credcache list [CONTEXT]`

use clap::Args;
use serde::Serialize;

use crate::commands::{CommandContext, CommandOutput};
use crate::error::CommandResult;
use crate::models::RecordKey;
use crate::secrets::DataProtector;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list this context
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub entries: Vec<RecordKey>,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No saved credentials".to_string();
        }

        let mut lines = Vec::new();
        let mut current: Option<&str> = None;
        for key in &self.entries {
            if current != Some(key.context()) {
                lines.push(key.context().to_string());
                current = Some(key.context());
            }
            lines.push(format!("  {}", key.user_name()));
        }
        lines.join("\n")
    }
}

pub fn execute<P: DataProtector>(
    args: ListArgs,
    ctx: &mut CommandContext<P>,
) -> CommandResult<ListOutput> {
    let entries = ctx.store.list(args.context.as_deref())?;
    Ok(ListOutput { entries })
}
