//! Reconciler configuration.

use serde::{Deserialize, Serialize};

use petsync_core::DuplicatePolicy;
use petsync_types::{EntityKind, SortDescriptor};

/// Configuration for [`Reconciler`](crate::Reconciler).
///
/// Deserializes from the `[sync]` table of `petsync.toml`; every key is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Entity kinds pushed and pulled by a full sync pass, in order.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<EntityKind>,
    /// How push treats two entities with the same record identity.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Sort order requested from the store when pulling.
    #[serde(default)]
    pub pull_sort: Option<SortDescriptor>,
}

fn default_kinds() -> Vec<EntityKind> {
    vec![EntityKind::Pet]
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            duplicate_policy: DuplicatePolicy::default(),
            pull_sort: None,
        }
    }
}

impl ReconcilerConfig {
    /// Set the kinds synced by a full pass.
    pub fn with_kinds(mut self, kinds: impl Into<Vec<EntityKind>>) -> Self {
        self.kinds = kinds.into();
        self
    }

    /// Set the duplicate policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the pull sort order.
    pub fn with_pull_sort(mut self, sort: SortDescriptor) -> Self {
        self.pull_sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_syncs_pets_keeping_first() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.kinds, vec![EntityKind::Pet]);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert!(config.pull_sort.is_none());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: ReconcilerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReconcilerConfig::default());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
kinds = ["pet", "shelter"]
duplicate_policy = "reject"

[pull_sort]
field = "name"
ascending = false
"#;

        let config: ReconcilerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.kinds, vec![EntityKind::Pet, EntityKind::Shelter]);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        let sort = config.pull_sort.unwrap();
        assert_eq!(sort.field, "name");
        assert!(!sort.ascending);
    }

    #[test]
    fn builder_methods_chain() {
        let config = ReconcilerConfig::default()
            .with_kinds(EntityKind::ALL)
            .with_duplicate_policy(DuplicatePolicy::KeepLast)
            .with_pull_sort(SortDescriptor {
                field: "name".into(),
                ascending: true,
            });

        assert_eq!(config.kinds.len(), 2);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepLast);
        assert!(config.pull_sort.is_some());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result: Result<ReconcilerConfig, _> = toml::from_str(r#"kinds = ["ferret"]"#);
        assert!(result.is_err());
    }
}
