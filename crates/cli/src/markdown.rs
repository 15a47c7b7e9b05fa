//! Markdown report persistence
//!
//! Every table render also lands as a markdown file under
//! `output/<context>/<command>_<timestamp>.md`. Persistence failures
//! warn and continue; they never fail the report.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};

use crate::output::print_warning;

fn sanitize_context_name(name: &str) -> String {
    if name.is_empty() {
        return "default".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes a markdown file for `command`, headed with the context name and
/// generation time.
pub fn save(command: &str, context_name: &str, ts: DateTime<Local>, table_markdown: &str) {
    let dir = PathBuf::from("output").join(sanitize_context_name(context_name));
    if let Err(err) = fs::create_dir_all(&dir) {
        print_warning(&format!(
            "failed to create output directory {}: {}",
            dir.display(),
            err
        ));
        return;
    }

    let path = dir.join(format!("{}_{}.md", command, ts.format("%Y%m%d_%H%M%S")));
    let header = format!(
        "# kugap {} — {}\n\n_Generated at {}_\n\n",
        command,
        context_name,
        ts.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC")
    );
    let content = format!("{}{}\n", header, table_markdown);

    if let Err(err) = fs::write(&path, content) {
        print_warning(&format!("failed to write markdown file {}: {}", path.display(), err));
        return;
    }

    println!("Saved: {}", path.display());
}
