//! Parser for `git worktree list --porcelain` output.
//!
//! Porcelain output is a sequence of stanzas, one per worktree. Each stanza
//! opens with a `worktree <path>` line and then reports attributes one per
//! line; the attributes we care about are `HEAD <commit>` and
//! `branch <ref>`. Stanzas for bare repositories or detached checkouts
//! never report a branch and are dropped rather than surfaced as partial
//! records.

use arbor_protocol::WorktreeRecord;

const WORKTREE_MARKER: &str = "worktree ";
const HEAD_MARKER: &str = "HEAD ";
const BRANCH_MARKER: &str = "branch ";

#[derive(Default)]
struct PartialRecord {
    path: Option<String>,
    head: Option<String>,
    branch: Option<String>,
}

impl PartialRecord {
    /// Emit the record if all three fields arrived, clearing the slot
    /// either way.
    fn take_complete(&mut self) -> Option<WorktreeRecord> {
        match (self.path.take(), self.head.take(), self.branch.take()) {
            (Some(path), Some(head), Some(branch)) => {
                Some(WorktreeRecord { path, head, branch })
            }
            _ => None,
        }
    }
}

/// Parse a full porcelain listing into ordered worktree records.
///
/// Single pass, no backtracking. Lines that start none of the known
/// markers are ignored, so attribute lines we do not model (`bare`,
/// `detached`, `locked` and friends) pass through harmlessly.
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current = PartialRecord::default();

    for line in output.trim().lines() {
        if let Some(path) = line.strip_prefix(WORKTREE_MARKER) {
            if let Some(record) = current.take_complete() {
                records.push(record);
            }
            current = PartialRecord {
                path: Some(path.to_string()),
                ..PartialRecord::default()
            };
        } else if let Some(head) = line.strip_prefix(HEAD_MARKER) {
            current.head = Some(head.to_string());
        } else if let Some(branch) = line.strip_prefix(BRANCH_MARKER) {
            current.branch = Some(branch.to_string());
        }
    }

    if let Some(record) = current.take_complete() {
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::parse_worktree_list;
    use arbor_protocol::WorktreeRecord;

    fn record(path: &str, head: &str, branch: &str) -> WorktreeRecord {
        WorktreeRecord {
            path: path.to_string(),
            head: head.to_string(),
            branch: branch.to_string(),
        }
    }

    #[test]
    fn parses_complete_records_in_order() {
        let output = "worktree /home/u/proj\n\
                      HEAD abc123\n\
                      branch refs/heads/main\n\
                      \n\
                      worktree /home/u/proj-feature\n\
                      HEAD def456\n\
                      branch refs/heads/feature\n";
        assert_eq!(
            parse_worktree_list(output),
            vec![
                record("/home/u/proj", "abc123", "refs/heads/main"),
                record("/home/u/proj-feature", "def456", "refs/heads/feature"),
            ]
        );
    }

    #[test]
    fn drops_trailing_record_missing_fields() {
        let output = "worktree /home/u/proj\n\
                      HEAD abc123\n\
                      branch refs/heads/main\n\
                      \n\
                      worktree /home/u/proj-wip\n";
        assert_eq!(
            parse_worktree_list(output),
            vec![record("/home/u/proj", "abc123", "refs/heads/main")]
        );
    }

    #[test]
    fn drops_detached_entry_but_keeps_neighbors() {
        let output = "worktree /home/u/proj\n\
                      HEAD abc123\n\
                      branch refs/heads/main\n\
                      \n\
                      worktree /home/u/proj-detached\n\
                      HEAD def456\n\
                      detached\n\
                      \n\
                      worktree /home/u/proj-feature\n\
                      HEAD 789abc\n\
                      branch refs/heads/feature\n";
        assert_eq!(
            parse_worktree_list(output),
            vec![
                record("/home/u/proj", "abc123", "refs/heads/main"),
                record("/home/u/proj-feature", "789abc", "refs/heads/feature"),
            ]
        );
    }

    #[test]
    fn single_incomplete_record_yields_nothing() {
        assert_eq!(parse_worktree_list("worktree /home/u/proj\n"), vec![]);
        assert_eq!(
            parse_worktree_list("worktree /home/u/proj\nHEAD abc123\n"),
            vec![]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parse_worktree_list(""), vec![]);
        assert_eq!(parse_worktree_list("\n\n"), vec![]);
    }

    #[test]
    fn surrounding_whitespace_does_not_matter() {
        let bare = "worktree /home/u/proj\nHEAD abc123\nbranch refs/heads/main";
        let padded = format!("\n\n{bare}\n\n\n");
        assert_eq!(parse_worktree_list(bare), parse_worktree_list(&padded));
        assert_eq!(parse_worktree_list(bare).len(), 1);
    }

    #[test]
    fn ignores_unrecognized_attribute_lines() {
        let output = "worktree /home/u/proj\n\
                      HEAD abc123\n\
                      branch refs/heads/main\n\
                      locked reason\n\
                      prunable gitdir file points to non-existent location\n";
        assert_eq!(
            parse_worktree_list(output),
            vec![record("/home/u/proj", "abc123", "refs/heads/main")]
        );
    }
}
