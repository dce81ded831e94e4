use super::PrError;

/// Canonical change status for a file in a pull request.
///
/// GitHub reports a free-form status token per changed file; anything outside
/// the known vocabulary maps to `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeStatus {
    Addition,
    Copy,
    Deleted,
    Modified,
    Renaming,
    TypeChange,
    Unknown,
}

impl ChangeStatus {
    /// Map a GitHub file-status token to the canonical enumeration.
    /// Total over the string domain: unrecognized tokens become `Unknown`.
    pub fn from_token(token: &str) -> ChangeStatus {
        match token {
            "added" => ChangeStatus::Addition,
            "copied" => ChangeStatus::Copy,
            "removed" => ChangeStatus::Deleted,
            "modified" => ChangeStatus::Modified,
            "renamed" => ChangeStatus::Renaming,
            "type_change" => ChangeStatus::TypeChange,
            _ => ChangeStatus::Unknown,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeStatus::Addition => "addition",
            ChangeStatus::Copy => "copy",
            ChangeStatus::Deleted => "deleted",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Renaming => "renaming",
            ChangeStatus::TypeChange => "type_change",
            ChangeStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Immutable snapshot of one GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Numeric repository id — the entity identity.
    pub id: u64,
    /// Short name (e.g., "code-challenge")
    pub name: String,
    /// Owner-qualified name (e.g., "org/code-challenge")
    pub full_name: String,
    /// Web URL of the repository
    pub url: String,
}

impl Repository {
    /// Two snapshots denote the same hosting-side repository iff ids match,
    /// regardless of any drift in the other fields.
    pub fn is_same_entity(&self, other: &Repository) -> bool {
        self.id == other.id
    }
}

/// One hunk of a file's unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    /// Added lines in this hunk
    pub add_count: usize,
    /// Removed lines in this hunk
    pub remove_count: usize,
    /// Hunk text: header line followed by the body lines
    pub content: String,
    /// Start line in the pre-change file (the `-` side of the header)
    pub source_start_line_number: usize,
    /// Line count in the pre-change file
    pub source_length: usize,
    /// Start line in the post-change file (the `+` side of the header)
    pub target_start_line_number: usize,
    /// Line count in the post-change file
    pub target_length: usize,
}

/// Parsed diff for one changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffContent {
    /// File-level added-line total as reported by GitHub. Independent of the
    /// per-segment sums: for binary files GitHub reports totals with no
    /// textual patch at all.
    pub add_count: usize,
    /// File-level removed-line total as reported by GitHub
    pub remove_count: usize,
    /// Raw patch text ("" when GitHub omits it)
    pub content: String,
    /// Hunks in patch order, top to bottom
    pub diff_segments: Vec<DiffSegment>,
}

/// One changed file within a pull request.
#[derive(Debug, Clone)]
pub struct ChangeFile {
    /// Content hash interpreted as a number (see `hex_id`)
    pub blob_id: u128,
    /// Content hash as reported by GitHub
    pub sha: String,
    /// Post-change path (e.g., "src/auth/config.rs")
    pub full_name: String,
    /// Pre-change path; equals `full_name` unless renamed/copied
    pub source_full_name: String,
    /// Final path segment
    pub name: String,
    /// Substring after the last `.` in `name`. A dotless name yields the
    /// whole name — quirk kept from the original convention, not corrected.
    pub suffix: String,
    pub status: ChangeStatus,
    /// Global id of the owning pull request
    pub pull_request_id: u64,
    /// Base commit hash as a number
    pub start_commit_id: u128,
    /// Head commit hash as a number
    pub end_commit_id: u128,
    /// Deep link into the PR's "Files changed" view
    pub diff_url: String,
    /// Blob URL at the head commit
    pub blob_url: String,
    pub diff_content: DiffContent,
}

/// Normalized pull request with its changed files.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// Global PR id (not the per-repo number)
    pub id: u64,
    /// Id of the repository the head commit lives in
    pub repository_id: u64,
    /// PR number within the repository (e.g., 42)
    pub number: u64,
    pub title: String,
    /// PR description; never null — empty string when GitHub has none
    pub body: String,
    /// Web URL of the pull request
    pub url: String,
    /// Owner-qualified name of the head-side repository
    pub repository_name: String,
    /// Changed files in the order GitHub listed them. Not deduplicated.
    pub change_files: Vec<ChangeFile>,
    /// Repository the PR targets
    pub base_repository: Repository,
    /// Repository the PR comes from. Equals `base_repository` (same snapshot)
    /// unless the PR originates from a fork.
    pub source_repository: Repository,
}

/// Interpret a git object hash as a base-16 integer.
///
/// The full hash (160 bits for SHA-1, 256 for SHA-256) does not fit a native
/// integer, so the id is taken from the leading 32 hex digits. The whole
/// string must still be valid hex: anything else is rejected, and the caller
/// isolates the failure to that file.
pub fn hex_id(hash: &str) -> Result<u128, PrError> {
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PrError::InvalidHash(hash.to_string()));
    }
    let head = &hash[..hash.len().min(32)];
    u128::from_str_radix(head, 16).map_err(|_| PrError::InvalidHash(hash.to_string()))
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}
