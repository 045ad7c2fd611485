//! Table rendering for CLI output using comfy-table.
//!
//! Provides consistent table formatting for commands that display tabular
//! data: the release index, the bug catalogue, and per-project artefact
//! status.
//!
//! ## Tables Overview
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `dpm release-index` | `render_release_index_table()` |
//! | `dpm bugs` | `render_bug_catalogue_table()` |
//! | `dpm status` | `render_artefact_status_table()` |

use std::path::PathBuf;

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use dpm_core::types::{BugTicket, Release};

use super::format::truncate_str;

/// Render the release index for `dpm release-index`.
///
/// # Example Output
///
/// ```text
/// #    RELEASE   DATE
/// 1    1.0.0     2021-01-04
/// 2    1.1.0     2021-03-12
/// ```
pub fn render_release_index_table(releases: &[Release]) -> String {
    if releases.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("RELEASE"),
        Cell::new("DATE"),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(4)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for release in releases {
        table.add_row(vec![
            Cell::new(release.index).set_alignment(CellAlignment::Right),
            Cell::new(truncate_str(&release.name, 24)),
            Cell::new(release.date.format("%Y-%m-%d").to_string()),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render the bug catalogue for `dpm bugs`.
///
/// A ticket's introduction/fixed version columns read `-` until the
/// labeller has derived them, which only happens inside a full `extract`
/// or `run`.
///
/// # Example Output
///
/// ```text
/// KEY         CREATED      FIX COMMIT   IV   FV
/// LANG-123    2021-02-01   a1b2c3d4     3    5
/// LANG-456    2021-02-14   -            -    -
/// ```
pub fn render_bug_catalogue_table(tickets: &[BugTicket]) -> String {
    if tickets.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("KEY"),
        Cell::new("CREATED"),
        Cell::new("FIX COMMIT"),
        Cell::new("IV").set_alignment(CellAlignment::Right),
        Cell::new("FV").set_alignment(CellAlignment::Right),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(4)),
        ColumnConstraint::LowerBoundary(Width::Fixed(4)),
    ]);

    for ticket in tickets {
        let fix_commit = ticket.fix_commit.as_deref().map(|c| truncate_str(c, 8)).unwrap_or_else(|| "-".to_string());
        let iv = ticket.introduction_version.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        let fv = ticket.fixed_version.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&ticket.key),
            Cell::new(ticket.created.format("%Y-%m-%d").to_string()),
            Cell::new(fix_commit),
            Cell::new(iv).set_alignment(CellAlignment::Right),
            Cell::new(fv).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render the persisted-artefact status for `dpm status`.
///
/// # Example Output
///
/// ```text
/// ARTEFACT                   PRESENT   PATH
/// raw dataset                 yes      ./Lang.csv
/// processed dataset           no       ./Lang_processed.arff
/// ```
pub fn render_artefact_status_table(rows: &[(&str, PathBuf, bool)]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![Cell::new("ARTEFACT"), Cell::new("PRESENT"), Cell::new("PATH")]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(24)),
        ColumnConstraint::LowerBoundary(Width::Fixed(8)),
        ColumnConstraint::LowerBoundary(Width::Fixed(20)),
    ]);

    for (label, path, present) in rows {
        table.add_row(vec![
            Cell::new(*label),
            Cell::new(if *present { "yes" } else { "no" }),
            Cell::new(path.display().to_string()),
        ]);
    }

    table.trim_fmt().to_string()
}
