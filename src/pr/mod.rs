pub mod diff;
pub mod github;
pub mod types;

pub use github::GithubClient;
pub use types::{ChangeFile, ChangeStatus, PrUrl, PullRequest, Repository};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use github::{RawFileChange, RawPull, RawRepo};
use types::{hex_id, DiffContent};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),

    #[error("Content hash is not valid hex: {0}")]
    InvalidHash(String),
}

/// Parse a GitHub PR URL into its component parts.
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Fetch a complete PullRequest (metadata + normalized change files) from the
/// GitHub API.
#[instrument(skip(client), fields(owner = %pr_url.owner, repo = %pr_url.repo, pr = pr_url.pr_number))]
pub async fn fetch_pull_request(
    client: &GithubClient,
    pr_url: &PrUrl,
) -> Result<PullRequest, PrError> {
    let raw_pull = client
        .get_pull(&pr_url.owner, &pr_url.repo, pr_url.pr_number)
        .await?;
    let raw_files = client
        .list_pull_files(&pr_url.owner, &pr_url.repo, pr_url.pr_number)
        .await?;

    Ok(assemble_pull_request(&raw_pull, &raw_files))
}

/// Build the canonical PullRequest from raw API records.
///
/// Per-file failures are isolated: a file with a non-hex content hash is
/// skipped with a warning, and a file whose patch cannot be parsed keeps its
/// identity with an empty diff. Neither aborts the rest of the list.
pub fn assemble_pull_request(raw_pull: &RawPull, raw_files: &[RawFileChange]) -> PullRequest {
    let base_repository = build_repository(&raw_pull.base.repo);
    // Source repo is rebuilt from the head side only for forks; otherwise it
    // is the very same snapshot as the base.
    let source_repository = if raw_pull.head.repo.id != raw_pull.base.repo.id {
        build_repository(&raw_pull.head.repo)
    } else {
        base_repository.clone()
    };

    let mut change_files = Vec::with_capacity(raw_files.len());
    for raw_file in raw_files {
        match build_change_file(raw_file, raw_pull) {
            Ok(change_file) => change_files.push(change_file),
            Err(err) => {
                warn!(file = %raw_file.filename, error = %err, "skipping change file");
            }
        }
    }
    debug!(
        files = change_files.len(),
        skipped = raw_files.len() - change_files.len(),
        "assembled change files"
    );

    PullRequest {
        id: raw_pull.id,
        repository_id: raw_pull.head.repo.id,
        number: raw_pull.number,
        title: raw_pull.title.clone(),
        body: raw_pull.body.clone().unwrap_or_default(),
        url: raw_pull.html_url.clone(),
        repository_name: raw_pull.head.repo.full_name.clone(),
        change_files,
        base_repository,
        source_repository,
    }
}

fn build_repository(raw: &RawRepo) -> Repository {
    Repository {
        id: raw.id,
        name: raw.name.clone(),
        full_name: raw.full_name.clone(),
        url: raw.html_url.clone(),
    }
}

/// Build one ChangeFile from a raw file-change record and its owning PR.
///
/// Fails only on a non-hex hash (blob or commit). A patch that does not parse
/// degrades to an empty diff instead: the file keeps its identity and loses
/// its diff detail.
pub fn build_change_file(
    raw_file: &RawFileChange,
    raw_pull: &RawPull,
) -> Result<ChangeFile, PrError> {
    let full_name = raw_file.filename.clone();
    let name = full_name
        .rsplit('/')
        .next()
        .unwrap_or(full_name.as_str())
        .to_string();
    // Last dot-separated piece. A dotless name yields the whole name.
    let suffix = name.rsplit('.').next().unwrap_or(name.as_str()).to_string();
    let source_full_name = match raw_file.previous_filename.as_deref() {
        Some(prev) if !prev.is_empty() => prev.to_string(),
        _ => full_name.clone(),
    };

    Ok(ChangeFile {
        blob_id: hex_id(&raw_file.sha)?,
        sha: raw_file.sha.clone(),
        diff_url: build_change_file_diff_url(raw_file, raw_pull),
        blob_url: raw_file.blob_url.clone(),
        full_name,
        source_full_name,
        name,
        suffix,
        status: ChangeStatus::from_token(&raw_file.status),
        pull_request_id: raw_pull.id,
        start_commit_id: hex_id(&raw_pull.base.sha)?,
        end_commit_id: hex_id(&raw_pull.head.sha)?,
        diff_content: parse_and_build_diff_content(raw_file),
    })
}

/// Deep link into the PR's "Files changed" tab, anchored by the file's hash.
/// Reconstructible from data already in hand — no extra API call.
fn build_change_file_diff_url(raw_file: &RawFileChange, raw_pull: &RawPull) -> String {
    format!("{}/files#diff-{}", raw_pull.html_url, raw_file.sha)
}

fn parse_and_build_diff_content(raw_file: &RawFileChange) -> DiffContent {
    let patch = raw_file.patch.as_deref().unwrap_or("");
    match diff::parse_patch(patch) {
        Ok(diff_segments) => DiffContent {
            add_count: raw_file.additions,
            remove_count: raw_file.deletions,
            content: patch.to_string(),
            diff_segments,
        },
        Err(err) => {
            warn!(file = %raw_file.filename, error = %err, "patch did not parse, keeping file with empty diff");
            DiffContent::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::github::RawRef;

    fn raw_repo(id: u64, full_name: &str) -> RawRepo {
        let name = full_name.rsplit('/').next().unwrap().to_string();
        RawRepo {
            id,
            name,
            full_name: full_name.to_string(),
            html_url: format!("https://github.com/{}", full_name),
        }
    }

    fn raw_pull(base_repo_id: u64, head_repo_id: u64) -> RawPull {
        RawPull {
            id: 5555,
            number: 42,
            title: "Add OAuth2 login flow".to_string(),
            body: Some("Adds the login flow.".to_string()),
            html_url: "https://github.com/org/repo/pull/42".to_string(),
            base: RawRef {
                sha: "aaaa1111aaaa1111aaaa1111aaaa1111aaaa1111".to_string(),
                repo: raw_repo(base_repo_id, "org/repo"),
            },
            head: RawRef {
                sha: "bbbb2222bbbb2222bbbb2222bbbb2222bbbb2222".to_string(),
                repo: raw_repo(head_repo_id, if head_repo_id == base_repo_id { "org/repo" } else { "fork/repo" }),
            },
        }
    }

    fn raw_file(filename: &str, status: &str, patch: Option<&str>) -> RawFileChange {
        RawFileChange {
            sha: "cccc3333cccc3333cccc3333cccc3333cccc3333".to_string(),
            filename: filename.to_string(),
            previous_filename: None,
            status: status.to_string(),
            additions: 0,
            deletions: 0,
            blob_url: format!("https://github.com/org/repo/blob/bbbb/{}", filename),
            patch: patch.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_valid_pr_url() {
        let url = parse_pr_url("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(url.owner, "org");
        assert_eq!(url.repo, "repo");
        assert_eq!(url.pr_number, 42);
    }

    #[test]
    fn test_parse_invalid_pr_url() {
        assert!(parse_pr_url("https://example.com").is_err());
        assert!(parse_pr_url("not-a-url").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pulls/42").is_err());
    }

    #[test]
    fn test_change_file_name_and_suffix() {
        let pull = raw_pull(1, 1);
        let file = build_change_file(&raw_file("src/auth/config.rs", "modified", None), &pull).unwrap();
        assert_eq!(file.name, "config.rs");
        assert_eq!(file.suffix, "rs");

        let file = build_change_file(&raw_file("archive.tar.gz", "added", None), &pull).unwrap();
        assert_eq!(file.suffix, "gz");

        // Dotless names keep the whole name as suffix.
        let file = build_change_file(&raw_file("Makefile", "added", None), &pull).unwrap();
        assert_eq!(file.name, "Makefile");
        assert_eq!(file.suffix, "Makefile");
    }

    #[test]
    fn test_source_full_name_falls_back_to_full_name() {
        let pull = raw_pull(1, 1);
        let mut raw = raw_file("src/lib.rs", "modified", None);
        let file = build_change_file(&raw, &pull).unwrap();
        assert_eq!(file.source_full_name, file.full_name);

        raw.previous_filename = Some(String::new());
        let file = build_change_file(&raw, &pull).unwrap();
        assert_eq!(file.source_full_name, file.full_name);

        raw.previous_filename = Some("src/old_lib.rs".to_string());
        let file = build_change_file(&raw, &pull).unwrap();
        assert_eq!(file.source_full_name, "src/old_lib.rs");
    }

    #[test]
    fn test_diff_url_is_synthesized_from_pr_url_and_sha() {
        let pull = raw_pull(1, 1);
        let raw = raw_file("src/lib.rs", "modified", None);
        let file = build_change_file(&raw, &pull).unwrap();
        assert_eq!(
            file.diff_url,
            "https://github.com/org/repo/pull/42/files#diff-cccc3333cccc3333cccc3333cccc3333cccc3333"
        );
    }

    #[test]
    fn test_commit_ids_come_from_base_and_head() {
        let pull = raw_pull(1, 1);
        let file = build_change_file(&raw_file("a.rs", "added", None), &pull).unwrap();
        assert_eq!(file.start_commit_id, hex_id(&pull.base.sha).unwrap());
        assert_eq!(file.end_commit_id, hex_id(&pull.head.sha).unwrap());
        assert_eq!(file.pull_request_id, 5555);
    }

    #[test]
    fn test_non_hex_blob_sha_is_an_error() {
        let pull = raw_pull(1, 1);
        let mut raw = raw_file("a.rs", "added", None);
        raw.sha = "not-hex!".to_string();
        assert!(build_change_file(&raw, &pull).is_err());
    }

    #[test]
    fn test_malformed_patch_degrades_to_empty_diff() {
        let pull = raw_pull(1, 1);
        let mut raw = raw_file("a.rs", "modified", Some("@@ garbage @@\n+x"));
        raw.additions = 1;
        let file = build_change_file(&raw, &pull).unwrap();
        assert_eq!(file.diff_content, DiffContent::default());
    }

    #[test]
    fn test_fork_detection_by_repository_id() {
        let pull = raw_pull(1, 2);
        let pr = assemble_pull_request(&pull, &[]);
        assert!(!pr.source_repository.is_same_entity(&pr.base_repository));
        assert_eq!(pr.source_repository.full_name, "fork/repo");
        assert_eq!(pr.repository_id, 2);

        let pull = raw_pull(1, 1);
        let pr = assemble_pull_request(&pull, &[]);
        assert!(pr.source_repository.is_same_entity(&pr.base_repository));
        assert_eq!(pr.source_repository, pr.base_repository);
    }

    #[test]
    fn test_null_body_becomes_empty_string() {
        let mut pull = raw_pull(1, 1);
        pull.body = None;
        let pr = assemble_pull_request(&pull, &[]);
        assert_eq!(pr.body, "");
    }

    #[test]
    fn test_per_file_failures_do_not_abort_siblings() {
        let pull = raw_pull(1, 1);
        // One file with a malformed patch among three: degraded, not dropped.
        let files = vec![
            raw_file("a.rs", "modified", Some("@@ -1 +1 @@\n-x\n+y")),
            raw_file("b.rs", "modified", Some("totally not a diff")),
            raw_file("c.rs", "modified", Some("@@ -2,2 +2,3 @@\n x\n+y\n x")),
        ];
        let pr = assemble_pull_request(&pull, &files);
        assert_eq!(pr.change_files.len(), 3);
        assert_eq!(pr.change_files[0].diff_content.diff_segments.len(), 1);
        assert!(pr.change_files[1].diff_content.diff_segments.is_empty());
        assert_eq!(pr.change_files[2].diff_content.diff_segments.len(), 1);

        // A non-hex hash drops only that file.
        let mut bad = raw_file("bad.rs", "added", None);
        bad.sha = "xyz".to_string();
        let files = vec![raw_file("a.rs", "added", None), bad, raw_file("c.rs", "added", None)];
        let pr = assemble_pull_request(&pull, &files);
        let names: Vec<&str> = pr.change_files.iter().map(|f| f.full_name.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "c.rs"]);
    }

    #[test]
    fn test_end_to_end_added_plus_renamed() {
        let pull = raw_pull(1, 1);
        let mut readme = raw_file("README.md", "added", Some("@@ -0,0 +1,3 @@\n+a\n+b\n+c"));
        readme.additions = 3;
        let mut renamed = raw_file("new.py", "renamed", None);
        renamed.previous_filename = Some("old.py".to_string());

        let pr = assemble_pull_request(&pull, &[readme, renamed]);
        assert_eq!(pr.change_files.len(), 2);

        let readme = &pr.change_files[0];
        assert_eq!(readme.status, ChangeStatus::Addition);
        assert_eq!(readme.diff_content.diff_segments.len(), 1);
        let seg = &readme.diff_content.diff_segments[0];
        assert_eq!(seg.add_count, 3);
        assert_eq!(seg.target_length, 3);
        assert_eq!(seg.source_start_line_number, 0);

        let renamed = &pr.change_files[1];
        assert_eq!(renamed.status, ChangeStatus::Renaming);
        assert_eq!(renamed.source_full_name, "old.py");
        assert!(renamed.diff_content.diff_segments.is_empty());
    }
}
