//! External parameter validation.
//!
//! Every check here runs before any I/O: an invalid request never touches the
//! store, the cache, or the network.

use crate::allowlist::{self, TrackedRepo};
use crate::timeline::TimeRange;

use super::error::ApiError;

/// Maximum raw length of the repository-list parameter.
pub const MAX_REPOS_PARAM_LEN: usize = 1024;

/// Maximum number of repositories per request.
pub const MAX_REPOS: usize = 20;

/// Maximum search query length (a full SHA).
pub const MAX_SEARCH_LEN: usize = 40;

/// Parse the `range` parameter against the closed enum.
pub fn parse_range(value: &str) -> Result<TimeRange, ApiError> {
    TimeRange::parse(value).ok_or_else(|| ApiError::invalid_range(value))
}

/// Parse the optional `repos` parameter.
///
/// An omitted parameter intentionally defaults to all allow-listed
/// repositories. A present parameter must be a JSON array of `"owner/name"`
/// strings, length- and count-bounded, where every entry is allow-listed.
pub fn parse_repos(param: Option<&str>) -> Result<Vec<&'static TrackedRepo>, ApiError> {
    let Some(raw) = param else {
        return Ok(allowlist::all().iter().collect());
    };

    if raw.len() > MAX_REPOS_PARAM_LEN {
        return Err(ApiError::invalid_repos(format!(
            "Repository list exceeds {MAX_REPOS_PARAM_LEN} bytes"
        )));
    }

    let names: Vec<String> = serde_json::from_str(raw)
        .map_err(|_| ApiError::invalid_repos("Repository list must be a JSON array of strings"))?;

    if names.is_empty() {
        return Err(ApiError::invalid_repos("Repository list must not be empty"));
    }
    if names.len() > MAX_REPOS {
        return Err(ApiError::invalid_repos(format!(
            "Repository list exceeds {MAX_REPOS} entries"
        )));
    }

    let mut repos: Vec<&'static TrackedRepo> = Vec::with_capacity(names.len());
    for full_name in &names {
        let Some((owner, name)) = full_name.split_once('/') else {
            return Err(ApiError::invalid_repos(format!(
                "Repository entry must be \"owner/name\": {full_name:?}"
            )));
        };
        let tracked =
            allowlist::find(owner, name).ok_or_else(|| ApiError::forbidden(owner, name))?;
        if !repos.iter().any(|r| std::ptr::eq(*r, tracked)) {
            repos.push(tracked);
        }
    }

    Ok(repos)
}

/// Parse a commit SHA or SHA prefix: 7 to 40 hex characters, lowercased.
pub fn parse_sha(value: &str) -> Result<String, ApiError> {
    let normalized = value.to_lowercase();
    let valid_len = (7..=40).contains(&normalized.len());
    let valid_chars = normalized.chars().all(|c| c.is_ascii_hexdigit());
    if valid_len && valid_chars {
        Ok(normalized)
    } else {
        Err(ApiError::invalid_sha(value))
    }
}

/// Normalize a search query: non-empty, bounded, lowercased.
pub fn parse_search(value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_params("Search query must not be empty"));
    }
    if trimmed.len() > MAX_SEARCH_LEN {
        return Err(ApiError::invalid_params(format!(
            "Search query exceeds {MAX_SEARCH_LEN} characters"
        )));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use crate::query::ErrorCode;

    use super::*;

    #[test]
    fn parse_range_accepts_known_values_only() {
        assert_eq!(parse_range("7d").expect("valid"), TimeRange::Days7);
        assert_eq!(parse_range("12m").expect("valid"), TimeRange::Months12);

        let err = parse_range("1y").expect_err("unknown range");
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }

    #[test]
    fn omitted_repos_defaults_to_full_allow_list() {
        let repos = parse_repos(None).expect("default");
        assert_eq!(repos.len(), allowlist::all().len());
    }

    #[test]
    fn explicit_repos_are_validated_and_deduplicated() {
        let repos = parse_repos(Some(
            r#"["gitpulse/core", "gitpulse/docs", "gitpulse/core"]"#,
        ))
        .expect("valid list");
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "core");
        assert_eq!(repos[1].name, "docs");
    }

    #[test]
    fn malformed_repo_lists_fail_with_invalid_repos() {
        for raw in [
            "not json",
            "{\"a\": 1}",
            "[]",
            "[\"missing-slash\"]",
            "[1, 2]",
        ] {
            let err = parse_repos(Some(raw)).expect_err("should fail");
            assert_eq!(err.code, ErrorCode::InvalidRepos, "input: {raw}");
        }
    }

    #[test]
    fn non_allow_listed_repo_fails_with_forbidden() {
        let err = parse_repos(Some(r#"["evil/repo"]"#)).expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn oversized_repo_lists_are_rejected() {
        let big = format!("[{}]", "\"gitpulse/core\",".repeat(200).trim_end_matches(','));
        let err = parse_repos(Some(&big)).expect_err("should fail");
        assert_eq!(err.code, ErrorCode::InvalidRepos);

        let many: Vec<String> = (0..MAX_REPOS + 1).map(|i| format!("o/{i}")).collect();
        let raw = serde_json::to_string(&many).expect("serialize");
        if raw.len() <= MAX_REPOS_PARAM_LEN {
            let err = parse_repos(Some(&raw)).expect_err("should fail");
            assert_eq!(err.code, ErrorCode::InvalidRepos);
        }
    }

    #[test]
    fn parse_sha_bounds_and_lowercases() {
        assert_eq!(parse_sha("AB12CD3").expect("valid"), "ab12cd3");
        assert_eq!(
            parse_sha("ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12").expect("valid full"),
            "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12"
        );

        for bad in ["", "abc", "xyzxyzz", &"a".repeat(41)] {
            let err = parse_sha(bad).expect_err("should fail");
            assert_eq!(err.code, ErrorCode::InvalidSha, "input: {bad}");
        }
    }

    #[test]
    fn parse_search_normalizes() {
        assert_eq!(parse_search(" AB12 ").expect("valid"), "ab12");
        assert_eq!(
            parse_search("").expect_err("empty").code,
            ErrorCode::InvalidParams
        );
        assert_eq!(
            parse_search(&"a".repeat(41)).expect_err("long").code,
            ErrorCode::InvalidParams
        );
    }
}
