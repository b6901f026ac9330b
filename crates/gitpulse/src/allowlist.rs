//! The static allow-list of repositories this pipeline may query or store.
//!
//! Every fetch, store, and query path checks this list before doing any work.
//! Repositories outside the list are rejected with a `Forbidden` error before
//! any I/O happens.

/// A repository the dashboard is allowed to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRepo {
    /// Owner login (user or organization).
    pub owner: &'static str,
    /// Repository name.
    pub name: &'static str,
    /// Human-readable name shown in dashboard series.
    pub display_name: &'static str,
}

impl TrackedRepo {
    /// Compute the full name (owner/name).
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// The fixed set of repositories the dashboard tracks.
pub const TRACKED_REPOSITORIES: &[TrackedRepo] = &[
    TrackedRepo {
        owner: "gitpulse",
        name: "core",
        display_name: "GitPulse Core",
    },
    TrackedRepo {
        owner: "gitpulse",
        name: "dashboard",
        display_name: "GitPulse Dashboard",
    },
    TrackedRepo {
        owner: "gitpulse",
        name: "docs",
        display_name: "GitPulse Docs",
    },
];

/// All tracked repositories.
pub fn all() -> &'static [TrackedRepo] {
    TRACKED_REPOSITORIES
}

/// Look up a repository in the allow-list.
pub fn find(owner: &str, name: &str) -> Option<&'static TrackedRepo> {
    TRACKED_REPOSITORIES
        .iter()
        .find(|r| r.owner == owner && r.name == name)
}

/// Whether the repository may be fetched, stored, or queried.
pub fn is_allowed(owner: &str, name: &str) -> bool {
    find(owner, name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_entry_for_tracked_repo() {
        let repo = find("gitpulse", "core").expect("tracked repo should be found");
        assert_eq!(repo.display_name, "GitPulse Core");
        assert_eq!(repo.full_name(), "gitpulse/core");
    }

    #[test]
    fn find_returns_none_for_unknown_repo() {
        assert!(find("unknown", "repo").is_none());
        assert!(!is_allowed("gitpulse", "not-tracked"));
    }

    #[test]
    fn allow_list_has_unique_entries() {
        for (i, a) in TRACKED_REPOSITORIES.iter().enumerate() {
            for b in &TRACKED_REPOSITORIES[i + 1..] {
                assert!(
                    a.owner != b.owner || a.name != b.name,
                    "duplicate allow-list entry {}/{}",
                    a.owner,
                    a.name
                );
            }
        }
    }
}
