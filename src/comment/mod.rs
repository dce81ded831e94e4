use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::pr::{ChangeFile, GithubClient, PrError};
use crate::summary::{PrSummary, SummaryOutcome};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment API request failed: {0}")]
    ApiRequest(#[from] PrError),
}

/// Render the markdown comment body for a summary outcome.
///
/// Each `important_changes` entry becomes a markdown link to the first change
/// file whose full name contains the entry text; entries matching no file
/// stay plain.
pub fn render_comment_body(outcome: &SummaryOutcome, change_files: &[ChangeFile]) -> String {
    match outcome {
        SummaryOutcome::Parsed(summary) => render_parsed_body(summary, change_files),
        SummaryOutcome::Raw(text) => format!(
            "## Pull Request Summary\n\n{}\n\n_The review output could not be parsed into its structured form and is shown as-is._",
            text
        ),
    }
}

fn render_parsed_body(summary: &PrSummary, change_files: &[ChangeFile]) -> String {
    let mut body = String::new();
    body.push_str("## Pull Request Summary\n\n");
    body.push_str(&format!("**Category:** {}\n\n", summary.pr_category));
    body.push_str(&format!("{}\n\n", summary.changes_description));
    body.push_str(&format!("**Objective:** {}\n", summary.objective));

    if !summary.important_changes.is_empty() {
        body.push_str("\n**Important Changes:**\n");
        for entry in &summary.important_changes {
            body.push_str(&format!("- {}\n", link_change(entry, change_files)));
        }
    }

    if let Some(bugs) = summary.bugs.as_deref() {
        body.push_str(&format!("\n**Potential Bugs:** {}\n", bugs));
    }
    if let Some(errors) = summary.errors.as_deref() {
        body.push_str(&format!("\n**Errors:** {}\n", errors));
    }

    body
}

/// Link an important-change entry to its file's diff anchor. Matched by
/// substring containment of the entry text in a file's full name; first match
/// wins, no match falls back to the plain entry.
fn link_change(entry: &str, change_files: &[ChangeFile]) -> String {
    for file in change_files {
        if file.full_name.contains(entry) {
            return format!("[{}]({})", entry, file.diff_url);
        }
    }
    entry.to_string()
}

/// Find the bot's previous comment on the PR and edit it, or create one.
#[instrument(skip(client, body), fields(repo = repo_full_name, pr = pr_number, bot = bot_login))]
pub async fn upsert_bot_comment(
    client: &GithubClient,
    repo_full_name: &str,
    pr_number: u64,
    bot_login: &str,
    body: &str,
) -> Result<(), CommentError> {
    let comments = client.list_issue_comments(repo_full_name, pr_number).await?;
    let existing = comments.iter().find(|c| c.user.login == bot_login);

    match existing {
        Some(comment) => {
            debug!(comment_id = comment.id, "editing existing bot comment");
            client
                .update_issue_comment(repo_full_name, comment.id, body)
                .await?;
            info!(comment_id = comment.id, "updated bot comment");
        }
        None => {
            debug!("no previous bot comment, creating one");
            client
                .create_issue_comment(repo_full_name, pr_number, body)
                .await?;
            info!("created bot comment");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::types::{ChangeStatus, DiffContent};

    fn change_file(full_name: &str) -> ChangeFile {
        ChangeFile {
            blob_id: 0,
            sha: "abc".to_string(),
            full_name: full_name.to_string(),
            source_full_name: full_name.to_string(),
            name: full_name.rsplit('/').next().unwrap().to_string(),
            suffix: "rs".to_string(),
            status: ChangeStatus::Modified,
            pull_request_id: 1,
            start_commit_id: 0,
            end_commit_id: 0,
            diff_url: format!("https://example.test/files#diff-{}", full_name),
            blob_url: String::new(),
            diff_content: DiffContent::default(),
        }
    }

    fn summary() -> PrSummary {
        PrSummary {
            changes_description: "Adds OAuth2 login.".to_string(),
            pr_category: "Feature".to_string(),
            important_changes: vec![
                "config.rs".to_string(),
                "documentation updates".to_string(),
            ],
            objective: "Let users sign in.".to_string(),
            bugs: None,
            errors: None,
        }
    }

    #[test]
    fn test_important_changes_linked_by_containment() {
        // The entry is a substring of the file's full name, not the reverse.
        let files = vec![change_file("src/auth/config.rs"), change_file("README.md")];
        let body = render_comment_body(&SummaryOutcome::Parsed(summary()), &files);

        assert!(body.contains(
            "[config.rs](https://example.test/files#diff-src/auth/config.rs)"
        ));
        // No matching file: plain text, no link.
        assert!(body.contains("- documentation updates\n"));
        assert!(!body.contains("[documentation updates]"));
    }

    #[test]
    fn test_full_entry_path_links_to_its_file() {
        let files = vec![change_file("src/auth/config.rs")];
        let body = render_comment_body(
            &SummaryOutcome::Parsed(PrSummary {
                important_changes: vec!["src/auth/config.rs".to_string()],
                ..summary()
            }),
            &files,
        );
        assert!(body.contains(
            "[src/auth/config.rs](https://example.test/files#diff-src/auth/config.rs)"
        ));
    }

    #[test]
    fn test_first_matching_file_wins() {
        let files = vec![change_file("a/mod.rs"), change_file("b/mod.rs")];
        let body = render_comment_body(
            &SummaryOutcome::Parsed(PrSummary {
                important_changes: vec!["mod.rs".to_string()],
                ..summary()
            }),
            &files,
        );
        assert!(body.contains("#diff-a/mod.rs"));
        assert!(!body.contains("#diff-b/mod.rs"));
    }

    #[test]
    fn test_bugs_and_errors_sections() {
        let body = render_comment_body(
            &SummaryOutcome::Parsed(PrSummary {
                bugs: Some("off-by-one in pagination".to_string()),
                errors: Some("missing import".to_string()),
                ..summary()
            }),
            &[],
        );
        assert!(body.contains("**Potential Bugs:** off-by-one in pagination"));
        assert!(body.contains("**Errors:** missing import"));
    }

    #[test]
    fn test_raw_outcome_rendered_with_fallback_note() {
        let body = render_comment_body(&SummaryOutcome::Raw("just prose".to_string()), &[]);
        assert!(body.contains("just prose"));
        assert!(body.contains("could not be parsed"));
    }
}
