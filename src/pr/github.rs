use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PrError;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "pr-digest";

/// Raw repository record as returned by the GitHub REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
}

/// One side (base or head) of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRef {
    pub sha: String,
    pub repo: RawRepo,
}

/// Raw pull-request record: GET /repos/{owner}/{repo}/pulls/{number}
#[derive(Debug, Clone, Deserialize)]
pub struct RawPull {
    /// Global id, distinct from the per-repo number
    pub id: u64,
    pub number: u64,
    pub title: String,
    /// Null when the PR has no description
    pub body: Option<String>,
    pub html_url: String,
    pub base: RawRef,
    pub head: RawRef,
}

/// Raw changed-file record: GET /repos/{owner}/{repo}/pulls/{number}/files
#[derive(Debug, Clone, Deserialize)]
pub struct RawFileChange {
    pub sha: String,
    pub filename: String,
    /// Present only for renamed/copied files
    pub previous_filename: Option<String>,
    pub status: String,
    pub additions: usize,
    pub deletions: usize,
    pub blob_url: String,
    /// Absent for binary files
    pub patch: Option<String>,
}

/// Raw issue comment record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: u64,
    pub body: String,
    pub user: RawUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub login: String,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Thin GitHub REST client. No retries, no pagination policy — API failures
/// propagate to the caller as `PrError::ApiRequest`.
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: String) -> GithubClient {
        GithubClient {
            http: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.api_base, path))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
    }

    /// Fetch PR metadata including base/head refs.
    pub async fn get_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<RawPull, PrError> {
        debug!(owner, repo, number, "fetching PR metadata");
        let pull = self
            .get(&format!("/repos/{}/{}/pulls/{}", owner, repo, number))
            .send()
            .await?
            .error_for_status()?
            .json::<RawPull>()
            .await?;
        debug!(title = %pull.title, "received PR metadata");
        Ok(pull)
    }

    /// List the files changed by a PR, in GitHub's reported order.
    pub async fn list_pull_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<RawFileChange>, PrError> {
        debug!(owner, repo, number, "fetching PR file list");
        let files = self
            .get(&format!(
                "/repos/{}/{}/pulls/{}/files?per_page=100",
                owner, repo, number
            ))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawFileChange>>()
            .await?;
        debug!(files = files.len(), "received PR file list");
        Ok(files)
    }

    /// List issue comments on a PR (PR comments live on the issue side).
    pub async fn list_issue_comments(
        &self,
        repo_full_name: &str,
        number: u64,
    ) -> Result<Vec<RawComment>, PrError> {
        let comments = self
            .get(&format!(
                "/repos/{}/issues/{}/comments",
                repo_full_name, number
            ))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawComment>>()
            .await?;
        Ok(comments)
    }

    pub async fn create_issue_comment(
        &self,
        repo_full_name: &str,
        number: u64,
        body: &str,
    ) -> Result<(), PrError> {
        debug!(repo = repo_full_name, number, "creating issue comment");
        self.http
            .post(format!(
                "{}/repos/{}/issues/{}/comments",
                self.api_base, repo_full_name, number
            ))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .json(&CommentBody { body })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn update_issue_comment(
        &self,
        repo_full_name: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<(), PrError> {
        debug!(repo = repo_full_name, comment_id, "updating issue comment");
        self.http
            .patch(format!(
                "{}/repos/{}/issues/comments/{}",
                self.api_base, repo_full_name, comment_id
            ))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .json(&CommentBody { body })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_pull_deserializes_null_body() {
        let json = r#"{
            "id": 99, "number": 7, "title": "t", "body": null,
            "html_url": "https://github.com/org/repo/pull/7",
            "base": {"sha": "aa", "repo": {"id": 1, "name": "repo", "full_name": "org/repo", "html_url": "u"}},
            "head": {"sha": "bb", "repo": {"id": 1, "name": "repo", "full_name": "org/repo", "html_url": "u"}}
        }"#;
        let pull: RawPull = serde_json::from_str(json).unwrap();
        assert!(pull.body.is_none());
        assert_eq!(pull.base.repo.id, pull.head.repo.id);
    }

    #[test]
    fn test_raw_file_change_optional_fields() {
        let json = r#"{
            "sha": "abc123", "filename": "new.py", "previous_filename": "old.py",
            "status": "renamed", "additions": 0, "deletions": 0,
            "blob_url": "https://github.com/org/repo/blob/bb/new.py"
        }"#;
        let file: RawFileChange = serde_json::from_str(json).unwrap();
        assert_eq!(file.previous_filename.as_deref(), Some("old.py"));
        assert!(file.patch.is_none());
    }
}
