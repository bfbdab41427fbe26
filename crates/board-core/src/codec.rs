//! Reading and writing the two markdown files every item directory holds.
//!
//! Both files are scanned the same way: a `## Section` line opens a section
//! and collects lines until the next `## ` header or end of file. Unknown
//! sections are dropped on read; writes always emit the canonical layout.

use crate::error::Result;
use crate::id::canonical_id;
use crate::io::{atomic_write, read_or_empty};
use crate::paths;
use crate::types::Status;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NONE_PLACEHOLDER: &str = "(none)";
pub const EMPTY_PLACEHOLDER: &str = "(empty)";

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readme {
    pub title: String,
    pub description: String,
    pub scope: String,
    pub acceptance_criteria: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: Status,
    pub assignee: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
    pub blocked_by: Vec<String>,
    pub blocks: Vec<String>,
    pub checklist: Vec<ChecklistItem>,
    pub notes: String,
}

impl Progress {
    pub fn is_blocked_by(&self, id: &str) -> bool {
        self.blocked_by.iter().any(|b| b == id)
    }

    pub fn blocks(&self, id: &str) -> bool {
        self.blocks.iter().any(|b| b == id)
    }
}

/// Current instant at the second precision the files store.
pub fn now_secs() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

pub fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Section scanner
// ---------------------------------------------------------------------------

struct Scanned<'a> {
    title: Option<String>,
    sections: Vec<(String, Vec<&'a str>)>,
}

impl<'a> Scanned<'a> {
    fn section(&self, name: &str) -> Option<&[&'a str]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.as_slice())
    }

    /// Free-text section body, with header escapes undone.
    fn text(&self, name: &str) -> String {
        self.section(name)
            .map(|lines| {
                lines
                    .iter()
                    .map(|l| unescape_line(l))
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string()
            })
            .unwrap_or_default()
    }

    fn first_line(&self, name: &str) -> Option<&'a str> {
        self.section(name)?
            .iter()
            .copied()
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

// A free-text line that would read as `## Header` is written with a leading
// backslash. Lines already starting with backslashes before `## ` gain one more,
// so the escape is reversible.

fn needs_escape(line: &str) -> bool {
    line.trim_start_matches('\\').starts_with("## ")
}

fn escape_text(text: &str) -> String {
    text.lines()
        .map(|l| {
            if needs_escape(l) {
                format!("\\{l}")
            } else {
                l.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_line(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if needs_escape(rest) => rest,
        _ => line,
    }
}

fn scan(text: &str) -> Scanned<'_> {
    let mut title = None;
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            sections.push((header.trim().to_lowercase(), Vec::new()));
            continue;
        }
        match sections.last_mut() {
            Some((_, lines)) => lines.push(line),
            None => {
                if title.is_none() {
                    if let Some(t) = line.strip_prefix("# ") {
                        title = Some(t.trim().to_string());
                    }
                }
            }
        }
    }
    Scanned { title, sections }
}

// ---------------------------------------------------------------------------
// README.md
// ---------------------------------------------------------------------------

pub fn parse_readme(text: &str) -> Readme {
    let s = scan(text);
    Readme {
        title: s.title.clone().unwrap_or_default(),
        description: s.text("description"),
        scope: s.text("scope"),
        acceptance_criteria: s.text("acceptance criteria"),
    }
}

pub fn render_readme(readme: &Readme) -> String {
    format!(
        "# {}\n\n## Description\n{}\n\n## Scope\n{}\n\n## Acceptance Criteria\n{}\n",
        readme.title,
        escape_text(&readme.description),
        escape_text(&readme.scope),
        escape_text(&readme.acceptance_criteria)
    )
}

// ---------------------------------------------------------------------------
// progress.md
// ---------------------------------------------------------------------------

fn parse_id_list(lines: Option<&[&str]>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in lines.unwrap_or_default() {
        let Some(entry) = line.trim().strip_prefix("- ") else {
            continue;
        };
        let entry = entry.trim();
        if entry.is_empty() || entry == NONE_PLACEHOLDER {
            continue;
        }
        let id = canonical_id(entry);
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn parse_checklist(lines: Option<&[&str]>) -> Vec<ChecklistItem> {
    let mut out = Vec::new();
    for line in lines.unwrap_or_default() {
        let line = line.trim();
        if line == EMPTY_PLACEHOLDER {
            continue;
        }
        let (checked, rest) = if let Some(rest) = line.strip_prefix("- [ ]") {
            (false, rest)
        } else if let Some(rest) = line
            .strip_prefix("- [x]")
            .or_else(|| line.strip_prefix("- [X]"))
        {
            (true, rest)
        } else {
            continue;
        };
        out.push(ChecklistItem {
            text: rest.trim().to_string(),
            checked,
        });
    }
    out
}

fn parse_instant(line: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(line?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub fn parse_progress(text: &str) -> Progress {
    let s = scan(text);
    let status = s
        .first_line("status")
        .and_then(|l| l.parse().ok())
        .unwrap_or_default();
    let assignee = s
        .first_line("assigned to")
        .filter(|l| *l != NONE_PLACEHOLDER)
        .map(str::to_string);
    Progress {
        status,
        assignee,
        created_at: parse_instant(s.first_line("created")),
        last_update: parse_instant(s.first_line("last update")),
        blocked_by: parse_id_list(s.section("blocked by")),
        blocks: parse_id_list(s.section("blocks")),
        checklist: parse_checklist(s.section("checklist")),
        notes: s.text("notes"),
    }
}

fn render_id_list(out: &mut String, ids: &[String]) {
    if ids.is_empty() {
        out.push_str("- ");
        out.push_str(NONE_PLACEHOLDER);
        out.push('\n');
    }
    for id in ids {
        out.push_str("- ");
        out.push_str(id);
        out.push('\n');
    }
}

/// Serialize as-is. Callers that persist should use [`write_progress`],
/// which refreshes `last_update` first.
pub fn render_progress(p: &Progress) -> String {
    let mut out = String::new();
    out.push_str("## Status\n");
    out.push_str(p.status.as_str());
    out.push_str("\n\n## Assigned To\n");
    out.push_str(p.assignee.as_deref().unwrap_or(NONE_PLACEHOLDER));
    out.push_str("\n\n## Created\n");
    if let Some(t) = &p.created_at {
        out.push_str(&format_instant(t));
    }
    out.push_str("\n\n## Last Update\n");
    if let Some(t) = &p.last_update {
        out.push_str(&format_instant(t));
    }
    out.push_str("\n\n## Blocked By\n");
    render_id_list(&mut out, &p.blocked_by);
    out.push_str("\n## Blocks\n");
    render_id_list(&mut out, &p.blocks);
    out.push_str("\n## Checklist\n");
    if p.checklist.is_empty() {
        out.push_str(EMPTY_PLACEHOLDER);
        out.push('\n');
    }
    for item in &p.checklist {
        let mark = if item.checked { "x" } else { " " };
        out.push_str(&format!("- [{mark}] {}\n", item.text));
    }
    out.push_str("\n## Notes\n");
    if !p.notes.is_empty() {
        out.push_str(&escape_text(&p.notes));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// File access
// ---------------------------------------------------------------------------

pub fn read_readme(item_dir: &Path) -> Result<Readme> {
    Ok(parse_readme(&read_or_empty(&paths::readme_path(item_dir))?))
}

pub fn write_readme(item_dir: &Path, readme: &Readme) -> Result<()> {
    atomic_write(
        &paths::readme_path(item_dir),
        render_readme(readme).as_bytes(),
    )
}

pub fn read_progress(item_dir: &Path) -> Result<Progress> {
    Ok(parse_progress(&read_or_empty(&paths::progress_path(item_dir))?))
}

/// Stamp `last_update` with the current instant and persist.
pub fn write_progress(item_dir: &Path, progress: &mut Progress) -> Result<()> {
    progress.last_update = Some(now_secs());
    atomic_write(
        &paths::progress_path(item_dir),
        render_progress(progress).as_bytes(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
