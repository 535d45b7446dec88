use std::collections::BTreeSet;
use std::path::Path;

use crate::error::StatsError;
use crate::models::{Repository, TimeWindow};

/// How the owner set affects approver credit on pull requests authored by an owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerApprovalPolicy {
    /// Owners are not treated specially.
    #[default]
    Ignore,
    /// An owner never earns approver credit on their own pull request.
    SuppressSelfApproval,
    /// An owner's own pull request counts as approved by them.
    CreditAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    pub repository: Repository,
    pub window: TimeWindow,
    pub owners: BTreeSet<String>,
    pub owner_approval: OwnerApprovalPolicy,
}

impl StatsConfig {
    pub fn new(repository: Repository, window: TimeWindow) -> Self {
        Self {
            repository,
            window,
            owners: BTreeSet::new(),
            owner_approval: OwnerApprovalPolicy::default(),
        }
    }

    pub fn with_owners<I, T>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_owner_approval(mut self, policy: OwnerApprovalPolicy) -> Self {
        self.owner_approval = policy;
        self
    }

    pub fn is_owner(&self, login: &str) -> bool {
        self.owners.contains(login)
    }
}

/// Reads the API token from `path`, trimming surrounding whitespace.
pub fn load_token(path: &Path) -> Result<String, StatsError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        StatsError::configuration(format!("error reading {}: {err}", path.display()))
    })?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(StatsError::configuration(format!(
            "token file {} is empty",
            path.display()
        )));
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::load_token;
    use crate::error::StatsError;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "review-stats-{}-{name}",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn trims_token_file() {
        let path = temp_file("token", "  ghp_secret\n");
        let token = load_token(&path).expect("token should load");
        std::fs::remove_file(&path).ok();

        assert_eq!(token, "ghp_secret");
    }

    #[test]
    fn empty_token_is_configuration_error() {
        let path = temp_file("empty", "\n\n");
        let result = load_token(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(StatsError::Configuration { .. })));
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let path = std::env::temp_dir().join("review-stats-does-not-exist.token");
        let err = load_token(&path).expect_err("missing file should fail");

        assert!(matches!(err, StatsError::Configuration { .. }));
        assert!(err.to_string().contains("review-stats-does-not-exist.token"));
    }
}
