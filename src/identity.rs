//! Current OS identity
//!
//! Used only to compute default user names; the store itself never reads it.

use crate::models::DOMAIN_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub domain: Option<String>,
    pub user: String,
}

impl Identity {
    pub fn new(domain: Option<String>, user: impl Into<String>) -> Self {
        Self {
            domain: domain.filter(|d| !d.trim().is_empty()),
            user: user.into(),
        }
    }

    /// Identity of the user running this process
    pub fn current() -> Self {
        Self::new(current_domain(), whoami::username())
    }

    /// `DOMAIN\user` when a domain is known, otherwise `user`
    pub fn user_name(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}{}{}", domain, DOMAIN_SEPARATOR, self.user),
            None => self.user.clone(),
        }
    }
}

#[cfg(windows)]
fn current_domain() -> Option<String> {
    std::env::var("USERDOMAIN").ok()
}

#[cfg(not(windows))]
fn current_domain() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_with_and_without_domain() {
        assert_eq!(Identity::new(Some("ACME".into()), "jdoe").user_name(), "ACME\\jdoe");
        assert_eq!(Identity::new(None, "jdoe").user_name(), "jdoe");
        assert_eq!(Identity::new(Some("  ".into()), "jdoe").user_name(), "jdoe");
    }

    #[test]
    fn test_current_has_a_user() {
        assert!(!Identity::current().user.is_empty());
    }
}
