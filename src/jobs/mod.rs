//! Jobs: data model, registry, and the console job table.
//!
//! ## Contents
//! - [`Job`], [`JobSpec`], [`Protocol`] one running network service
//! - [`JobRegistry`] concurrency-safe map of running jobs
//! - [`render_table`] fixed-width listing for the `jobs` command

mod job;
mod registry;

use std::sync::Arc;

pub use job::{Job, JobId, JobSpec, Protocol, StopSignal};
pub use registry::JobRegistry;

const HEADERS: [&str; 5] = ["ID", "Name", "Protocol", "Port", "Description"];

/// Renders jobs as a left-aligned table, one row per job, ordered by id.
///
/// ```text
/// ID  Name  Protocol  Port  Description
/// ==  ====  ========  ====  ===========
/// 1   rpc   tcp       9000  client listener
/// ```
///
/// Returns `"No active jobs"` for an empty slice.
pub fn render_table(jobs: &[Arc<Job>]) -> String {
    if jobs.is_empty() {
        return "No active jobs".to_string();
    }

    let mut sorted: Vec<&Arc<Job>> = jobs.iter().collect();
    sorted.sort_by_key(|j| j.id);

    let rows: Vec<[String; 5]> = sorted
        .iter()
        .map(|j| {
            [
                j.id.to_string(),
                j.name.to_string(),
                j.protocol.to_string(),
                j.port.to_string(),
                j.description.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let underline = HEADERS.map(|h| "=".repeat(h.len()));
    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    push_row(&mut out, &underline, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<w$}", c.as_ref(), w = *w))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
