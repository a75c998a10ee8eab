//! Line diffs between two snapshots of a file.
//!
//! Pairs with [`Figsync::watch_file`](crate::Figsync::watch_file): the watch
//! callback receives both documents, and [`diff_files`] turns them into a
//! readable change summary.

use crate::error::Result;
use crate::model::FileDocument;
use similar::{ChangeTag, TextDiff};

/// Changed lines between the pretty-printed JSON of `before` and `after`.
///
/// Removed lines start with `-`, added lines with `+`; unchanged lines are
/// omitted. A missing document compares as `{}`. Identical documents give an
/// empty string.
pub fn diff_files(before: Option<&FileDocument>, after: Option<&FileDocument>) -> Result<String> {
    let before = to_json(before)?;
    let after = to_json(after)?;

    let mut out = String::new();
    for change in TextDiff::from_lines(&before, &after).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => continue,
        };
        out.push(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    Ok(out)
}

fn to_json(file: Option<&FileDocument>) -> Result<String> {
    match file {
        Some(file) => Ok(serde_json::to_string_pretty(file)?),
        None => Ok("{}".to_string()),
    }
}
