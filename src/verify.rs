//! Credential verification
//!
//! A verifier tries a freshly entered credential before it is saved, for
//! example by opening a real connection with it.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{CredError, CredResult};
use crate::models::Credential;

/// Environment variable carrying the user name to a verification program
pub const VERIFY_USER_ENV: &str = "CREDCACHE_USER";

/// Accepts or rejects a candidate credential
pub trait Verifier {
    /// `Ok(false)` rejects the credential and lets the user try again.
    /// `Err` means verification itself could not run.
    fn verify(&mut self, credential: &Credential) -> CredResult<bool>;
}

impl<F> Verifier for F
where
    F: FnMut(&Credential) -> bool,
{
    fn verify(&mut self, credential: &Credential) -> CredResult<bool> {
        Ok(self(credential))
    }
}

/// Runs an external program; exit status 0 accepts the credential
///
/// The user name is passed in `CREDCACHE_USER`, the secret on stdin followed
/// by a newline. The secret never appears on the command line.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
}

impl CommandVerifier {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command line. No shell quoting is applied.
    pub fn from_command_line(line: &str) -> CredResult<Self> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CredError::Verification("empty verification command".to_string()))?;
        Ok(Self::new(program, parts))
    }
}

impl Verifier for CommandVerifier {
    fn verify(&mut self, credential: &Credential) -> CredResult<bool> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(VERIFY_USER_ENV, credential.user_name())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CredError::Verification(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin
                .write_all(credential.secret().as_bytes())
                .and_then(|_| stdin.write_all(b"\n"));
            match written {
                Ok(()) => {}
                // the program may exit without reading its input
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(CredError::Verification(e.to_string())),
            }
        }

        let status = child
            .wait()
            .map_err(|e| CredError::Verification(e.to_string()))?;
        debug!(program = %self.program, %status, "verification program finished");
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn credential(user: &str, secret: &str) -> Credential {
        Credential::new(user, Zeroizing::new(secret.to_string()))
    }

    #[test]
    fn test_closure_verifier() {
        let mut calls = 0;
        let mut verifier = |c: &Credential| {
            calls += 1;
            c.secret() == "ok"
        };
        assert!(!verifier.verify(&credential("u", "nope")).unwrap());
        assert!(verifier.verify(&credential("u", "ok")).unwrap());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_command_line_parsing() {
        assert!(matches!(
            CommandVerifier::from_command_line("   "),
            Err(CredError::Verification(_))
        ));
        let verifier = CommandVerifier::from_command_line("check-login --host db01").unwrap();
        assert_eq!(verifier.program, "check-login");
        assert_eq!(verifier.args, vec!["--host", "db01"]);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let mut verifier = CommandVerifier::new("credcache-no-such-program-xyz", Vec::<String>::new());
        assert!(matches!(
            verifier.verify(&credential("u", "s")),
            Err(CredError::Verification(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_verifier_reads_secret_from_stdin() {
        let script = r#"read s; [ "$s" = good ] && [ "$CREDCACHE_USER" = jdoe ]"#;
        let mut verifier = CommandVerifier::new("sh", ["-c", script]);

        assert!(verifier.verify(&credential("jdoe", "good")).unwrap());
        assert!(!verifier.verify(&credential("jdoe", "bad")).unwrap());
        assert!(!verifier.verify(&credential("other", "good")).unwrap());
    }
}
