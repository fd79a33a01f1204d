//! Markdown blocks appended to notes, and tag extraction
//!
//! The block layouts are fixed; downstream tooling parses them.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("tag pattern is valid"));

/// Sub-list of wikilinks under a label
///
/// ```text
///
///  - Related
/// 	 - [[first]]
/// 	 - [[second]]
/// ```
pub fn link_block<S: AsRef<str>>(label: &str, targets: &[S]) -> String {
    let mut block = String::from("\n");
    block.push_str(&format!(" - {}\n", label));
    for target in targets {
        block.push_str(&format!("\t - [[{}]]\n", target.as_ref()));
    }
    block
}

/// "Tags" list, one `#tag` bullet per tag, followed by a blank line
pub fn tags_block<S: AsRef<str>>(tags: &[S]) -> String {
    let bullets: String = tags.iter().map(|tag| format!("- #{}\n", tag.as_ref())).collect();
    format!("\n- Tags\n\t{}\n", bullets)
}

/// Pipe table with the first row as header
///
/// Callers must pass at least one row; rows are written as-is, so a ragged
/// grid produces a ragged table.
pub fn table<R, S>(rows: &[R]) -> String
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut out = String::new();
    let Some((header, body)) = rows.split_first() else {
        return out;
    };

    push_row(&mut out, header.as_ref());
    for _ in header.as_ref() {
        out.push_str("| --- ");
    }
    out.push_str("|\n");
    for row in body {
        push_row(&mut out, row.as_ref());
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    for cell in cells {
        out.push_str("| ");
        out.push_str(cell.as_ref());
        out.push(' ');
    }
    out.push_str("|\n");
}

/// Every `#word` token in order of appearance, duplicates included
pub fn extract_tags(content: &str) -> Vec<String> {
    TAG_RE.find_iter(content).map(|m| m.as_str().to_string()).collect()
}
