use crate::pr::types::{ChangeFile, ChangeStatus, PullRequest};

/// Canonical order in which status groups are rendered. TypeChange has no
/// header of its own and shares "Other Changes:" with Unknown.
const STATUS_ORDER: [ChangeStatus; 7] = [
    ChangeStatus::Addition,
    ChangeStatus::Modified,
    ChangeStatus::Deleted,
    ChangeStatus::Renaming,
    ChangeStatus::Copy,
    ChangeStatus::TypeChange,
    ChangeStatus::Unknown,
];

fn status_header(status: ChangeStatus) -> &'static str {
    match status {
        ChangeStatus::Addition => "Added Files:",
        ChangeStatus::Modified => "Modified Files:",
        ChangeStatus::Deleted => "Deleted Files:",
        ChangeStatus::Renaming => "Renamed Files:",
        ChangeStatus::Copy => "Copied Files:",
        ChangeStatus::TypeChange | ChangeStatus::Unknown => "Other Changes:",
    }
}

/// Render the changed files grouped by status, one block per status present.
///
/// Groups come out in a fixed canonical order and files keep the host API's
/// order within each group. Empty groups are omitted; blocks are separated by
/// a blank line.
pub fn change_files_material(change_files: &[ChangeFile]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for status in STATUS_ORDER {
        let lines: Vec<String> = change_files
            .iter()
            .filter(|file| file.status == status)
            .map(format_file_line)
            .collect();
        if lines.is_empty() {
            continue;
        }
        blocks.push(format!("{}\n{}", status_header(status), lines.join("\n")));
    }

    blocks.join("\n\n")
}

fn format_file_line(file: &ChangeFile) -> String {
    match file.status {
        ChangeStatus::Copy => format!(
            "- {} (copied from {})",
            file.full_name, file.source_full_name
        ),
        ChangeStatus::Renaming => format!(
            "- {} (renamed from {})",
            file.full_name, file.source_full_name
        ),
        _ => format!("- {}", file.full_name),
    }
}

/// Render PR title and description for the prompt.
pub fn pr_metadata_material(pr: &PullRequest) -> String {
    format!(
        "Pull Request Title: {}\nDescription:\n{}",
        pr.title, pr.body
    )
}
