//! The `plan.md` artifact written by `plan --save`.

use crate::error::Result;
use crate::io::atomic_write;
use crate::scheduler::Plan;
use chrono::{Local, NaiveDate};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub fn render_plan_markdown(scope_label: &str, plan: &Plan, generated: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Plan: {scope_label}\n");
    let _ = writeln!(out, "Generated: {}\n", generated.format("%Y-%m-%d"));

    for phase in &plan.phases {
        if phase.number == 1 {
            out.push_str("## Phase 1 (no dependencies)\n");
        } else {
            let _ = writeln!(out, "## Phase {}", phase.number);
        }
        for entry in &phase.elements {
            if entry.blocked_by.is_empty() {
                let _ = writeln!(out, "- {}: {}", entry.id, entry.title);
            } else {
                let _ = writeln!(
                    out,
                    "- {}: {} (blocked by: {})",
                    entry.id,
                    entry.title,
                    entry.blocked_by.join(", ")
                );
            }
        }
        out.push('\n');
    }

    if plan.has_cycle {
        out.push_str("## Cycle\n");
        for id in &plan.cycle_nodes {
            let _ = writeln!(out, "- {id}");
        }
        out.push('\n');
    }

    out.push_str("## Critical Path\n");
    if plan.critical_path.is_empty() {
        out.push_str("(none)\n");
    } else {
        let _ = writeln!(
            out,
            "{} ({} phases)",
            plan.critical_path.join(" -> "),
            plan.critical_path.len()
        );
    }

    if !plan.warnings.is_empty() {
        out.push_str("\n## Warnings\n");
        for w in &plan.warnings {
            let _ = writeln!(out, "- {w}");
        }
    }
    out
}

/// Write the plan to `dir/file_name`, dated today.
pub fn save_plan(dir: &Path, file_name: &str, scope_label: &str, plan: &Plan) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let text = render_plan_markdown(scope_label, plan, Local::now().date_naive());
    atomic_write(&path, text.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::write_item;
    use crate::board::Board;
    use crate::scheduler::{plan_scope, Scope};
    use tempfile::TempDir;

    const S: &str = "STORY-260101-s00001";
    const A: &str = "TASK-260101-t00001";
    const B: &str = "TASK-260101-t00002";
    const C: &str = "TASK-260101-t00003";

    fn chain_board() -> (TempDir, Board) {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), "EPIC-260101-e00001", "e", &[]);
        let s = write_item(&e, S, "s", &[]);
        write_item(&s, A, "a", &[]);
        write_item(&s, B, "b", &[A]);
        write_item(&s, C, "c", &[B, "TASK-260101-zzzzzz"]);
        let board = Board::load(dir.path()).unwrap();
        (dir, board)
    }

    #[test]
    fn markdown_layout() {
        let (_dir, board) = chain_board();
        let scope = Scope::new(Some(S), false);
        let (_, plan) = plan_scope(&board, &scope, false).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap();
        let md = render_plan_markdown(&scope.label(&board), &plan, date);

        let expected = format!(
            "# Plan: {S} (s)\n\n\
             Generated: 2026-01-18\n\n\
             ## Phase 1 (no dependencies)\n\
             - {A}: a\n\n\
             ## Phase 2\n\
             - {B}: b (blocked by: {A})\n\n\
             ## Phase 3\n\
             - {C}: c (blocked by: {B})\n\n\
             ## Critical Path\n\
             {A} -> {B} -> {C} (3 phases)\n\n\
             ## Warnings\n\
             - {C} is blocked by items outside this scope (ignored): TASK-260101-zzzzzz\n"
        );
        assert_eq!(md, expected);
    }

    #[test]
    fn save_writes_into_scope_dir() {
        let (_dir, board) = chain_board();
        let scope = Scope::new(Some(S), false);
        let (_, plan) = plan_scope(&board, &scope, false).unwrap();
        let dir = scope.dir(&board).unwrap();
        let path = save_plan(&dir, "plan.md", &scope.label(&board), &plan).unwrap();
        assert_eq!(path, dir.join("plan.md"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("# Plan: "));
        // The artifact is not an item and must not disturb loading.
        assert_eq!(Board::load(board.root()).unwrap().len(), board.len());
    }
}
