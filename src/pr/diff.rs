use super::types::DiffSegment;
use super::PrError;

/// Parse one file's unified-diff patch text into an ordered list of hunks.
///
/// The input is GitHub's per-file `patch` field: hunks only, no
/// `diff --git` preamble. Hunks start with:
///   @@ -{source_start},{source_count} +{target_start},{target_count} @@
/// where an omitted count defaults to 1.
///
/// Lines are prefixed with:
///   '+' for additions
///   '-' for deletions
///   ' ' for context (unchanged)
///
/// Empty input yields an empty list. Text that cannot be parsed as
/// unified-diff is an error for this file; the caller decides how to isolate
/// it from its siblings.
pub fn parse_patch(patch: &str) -> Result<Vec<DiffSegment>, PrError> {
    if patch.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut segments: Vec<DiffSegment> = Vec::new();

    for line in patch.lines() {
        if line.starts_with("@@") {
            let (source_start, source_length, target_start, target_length) =
                parse_hunk_header(line)?;
            segments.push(DiffSegment {
                add_count: 0,
                remove_count: 0,
                content: line.to_string(),
                source_start_line_number: source_start,
                source_length,
                target_start_line_number: target_start,
                target_length,
            });
            continue;
        }

        let segment = segments
            .last_mut()
            .ok_or_else(|| PrError::DiffParse("Content before first hunk header".to_string()))?;

        if line.starts_with('+') {
            segment.add_count += 1;
        } else if line.starts_with('-') {
            segment.remove_count += 1;
        } else if !line.starts_with(' ') && !line.starts_with('\\') && !line.is_empty() {
            // '\ No newline at end of file' is the only unprefixed line a
            // well-formed patch may carry.
            return Err(PrError::DiffParse(format!(
                "Unexpected line in patch: {}",
                line
            )));
        }
        segment.content.push('\n');
        segment.content.push_str(line);
    }

    Ok(segments)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize), PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::DiffParse("Invalid hunk header".to_string()))?;
    let header = match header.find("@@") {
        Some(end) => &header[..end],
        None => header,
    };
    let mut parts = header.split_whitespace();
    let source_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing source range".to_string()))?;
    let target_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing target range".to_string()))?;

    let (source_start, source_length) = parse_range(source_part, '-')?;
    let (target_start, target_length) = parse_range(target_part, '+')?;

    Ok((source_start, source_length, target_start, target_length))
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::DiffParse(format!("Invalid range prefix in {}", part)))?;
    // "-12" means "-12,1" per the unified-diff convention.
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
