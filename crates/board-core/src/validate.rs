//! Read-only consistency checks over a loaded board.

use crate::board::Board;
use crate::config::{BoardConfig, WarnLevel};
use crate::error::Result;
use crate::item::Item;
use crate::paths;
use crate::scheduler::build_plan;
use crate::system::read_counters;
use crate::types::ItemType;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn push(&mut self, severity: Severity, item: Option<&str>, message: String) {
        self.issues.push(ValidationIssue {
            severity,
            item: item.map(str::to_string),
            message,
        });
    }

    fn error(&mut self, item: &str, message: String) {
        self.push(Severity::Error, Some(item), message);
    }

    fn warning(&mut self, item: Option<&str>, message: String) {
        self.push(Severity::Warning, item, message);
    }
}

pub fn validate(board: &Board, config: &BoardConfig) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    check_files(board, &mut report);
    check_edges(board, &mut report);
    check_escalation(board, &mut report);
    check_id_styles(board, &mut report)?;
    check_sibling_cycles(board, &mut report);

    for stray in board.strays() {
        report.warning(
            None,
            format!("item directory at an illegal depth is ignored: {}", stray.display()),
        );
    }
    for w in config.validate() {
        let severity = match w.level {
            WarnLevel::Error => Severity::Error,
            WarnLevel::Warning => Severity::Warning,
        };
        report.push(severity, None, format!("config: {}", w.message));
    }
    Ok(report)
}

fn check_files(board: &Board, report: &mut ValidationReport) {
    for item in board.items() {
        for path in [paths::readme_path(&item.path), paths::progress_path(&item.path)] {
            if !path.is_file() {
                report.error(&item.id, format!("missing {}", path.display()));
            }
        }
    }
}

/// Self-links, dangling references and edges recorded on one side only.
fn check_edges(board: &Board, report: &mut ValidationReport) {
    for item in board.items() {
        for blocker in item.blocked_by() {
            if blocker == &item.id {
                report.error(&item.id, "is blocked by itself".to_string());
                continue;
            }
            match board.get(blocker) {
                None => report.error(&item.id, format!("blocked by unknown item {blocker}")),
                Some(other) if !other.progress.blocks(&item.id) => report.error(
                    &item.id,
                    format!("blocked by {blocker}, but {blocker} does not list it under Blocks"),
                ),
                Some(_) => {}
            }
        }
        for blocked in item.blocks() {
            if blocked == &item.id {
                report.error(&item.id, "blocks itself".to_string());
                continue;
            }
            match board.get(blocked) {
                None => report.error(&item.id, format!("blocks unknown item {blocked}")),
                Some(other) if !other.progress.is_blocked_by(&item.id) => report.error(
                    &item.id,
                    format!("blocks {blocked}, but {blocked} does not list it under Blocked By"),
                ),
                Some(_) => {}
            }
        }
    }
}

/// Every link between items under diverging parents should be mirrored
/// between those parents, all the way up.
fn check_escalation(board: &Board, report: &mut ValidationReport) {
    for item in board.items() {
        for blocker in item.blocked_by() {
            let Some(other) = board.get(blocker) else {
                continue;
            };
            let (mut b, mut k) = (item, other);
            while let Some((pb, pk)) = diverging(board, b, k) {
                if !pb.progress.is_blocked_by(&pk.id) {
                    report.warning(
                        Some(&pb.id),
                        format!(
                            "missing escalated link: {} should be blocked by {} because {} is blocked by {}",
                            pb.id, pk.id, item.id, other.id
                        ),
                    );
                    break;
                }
                (b, k) = (pb, pk);
            }
        }
    }
}

fn diverging<'a>(board: &'a Board, b: &Item, k: &Item) -> Option<(&'a Item, &'a Item)> {
    let pb = board.parent_of(b)?;
    let pk = board.parent_of(k)?;
    if pb.id == pk.id
        || board.is_ancestor_or_self(&pb.id, &pk.id)
        || board.is_ancestor_or_self(&pk.id, &pb.id)
    {
        return None;
    }
    Some((pb, pk))
}

fn check_id_styles(board: &Board, report: &mut ValidationReport) -> Result<()> {
    let legacy: Vec<&Item> = board.items().iter().filter(|i| i.legacy_id).collect();
    if legacy.is_empty() {
        return Ok(());
    }
    if legacy.len() < board.len() {
        report.warning(
            None,
            format!(
                "board mixes legacy sequential IDs ({}) with dated IDs ({})",
                legacy.len(),
                board.len() - legacy.len()
            ),
        );
    }

    let counters = read_counters(board.root())?;
    if counters.is_empty() {
        return Ok(());
    }
    for item in legacy {
        let number = item
            .id
            .rsplit_once('-')
            .and_then(|(_, n)| n.parse::<u64>().ok())
            .unwrap_or(0);
        if number > counters.get(item.item_type) {
            report.warning(
                Some(&item.id),
                format!(
                    "legacy id exceeds the {} counter in system.md ({})",
                    item.item_type,
                    counters.get(item.item_type)
                ),
            );
        }
    }
    Ok(())
}

/// Cycles are only meaningful among siblings, since escalation mirrors every
/// cross-parent link onto a sibling pair higher up.
fn check_sibling_cycles(board: &Board, report: &mut ValidationReport) {
    let mut groups: Vec<(String, Vec<&Item>)> =
        vec![("epics".to_string(), board.find_by_type(ItemType::Epic))];
    for parent in board.items().iter().filter(|i| !i.item_type.is_leaf()) {
        groups.push((format!("children of {}", parent.id), board.children_of(&parent.id)));
    }
    for (label, siblings) in groups {
        if siblings.len() < 2 {
            continue;
        }
        let plan = build_plan(&siblings);
        if !plan.has_cycle {
            continue;
        }
        let nodes = if plan.cycle_path.is_empty() {
            plan.cycle_nodes.join(", ")
        } else {
            plan.cycle_path.join(" -> ")
        };
        let first = plan.cycle_nodes.first().cloned().unwrap_or_default();
        report.error(&first, format!("dependency cycle among {label}: {nodes}"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::write_item;
    use crate::codec::{render_progress, Progress};
    use crate::deps::link;
    use tempfile::TempDir;

    const E1: &str = "EPIC-260101-e00001";
    const E2: &str = "EPIC-260101-e00002";
    const S1: &str = "STORY-260101-s00001";
    const S2: &str = "STORY-260101-s00002";
    const T1: &str = "TASK-260101-t00001";
    const T2: &str = "TASK-260101-t00002";

    fn two_epics() -> TempDir {
        let dir = TempDir::new().unwrap();
        let e1 = write_item(dir.path(), E1, "e1", &[]);
        let e2 = write_item(dir.path(), E2, "e2", &[]);
        let s1 = write_item(&e1, S1, "s1", &[]);
        let s2 = write_item(&e2, S2, "s2", &[]);
        write_item(&s1, T1, "t1", &[]);
        write_item(&s2, T2, "t2", &[]);
        dir
    }

    fn run(dir: &TempDir) -> ValidationReport {
        let board = Board::load(dir.path()).unwrap();
        validate(&board, &BoardConfig::default()).unwrap()
    }

    #[test]
    fn clean_board_after_links() {
        let dir = two_epics();
        let mut board = Board::load(dir.path()).unwrap();
        link(&mut board, T2, T1).unwrap();
        let report = run(&dir);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert!(!report.has_errors());
    }

    #[test]
    fn asymmetric_and_dangling_edges() {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), E1, "e", &[]);
        let s = write_item(&e, S1, "s", &[]);
        write_item(&s, T1, "a", &[]);
        write_item(&s, T2, "b", &[T1, "TASK-260101-gone00"]);
        let report = run(&dir);
        assert!(report.has_errors());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("does not list it under Blocks")));
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("unknown item TASK-260101-gone00")));
    }

    #[test]
    fn self_loop_is_an_error() {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), E1, "e", &[]);
        let progress = Progress {
            blocked_by: vec![E1.to_string()],
            blocks: vec![E1.to_string()],
            ..Progress::default()
        };
        std::fs::write(e.join("progress.md"), render_progress(&progress)).unwrap();
        let report = run(&dir);
        assert_eq!(report.count(Severity::Error), 2);
    }

    #[test]
    fn missing_files_are_errors() {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), E1, "e", &[]);
        std::fs::remove_file(e.join("README.md")).unwrap();
        let report = run(&dir);
        assert_eq!(report.count(Severity::Error), 1);
        assert_eq!(report.issues[0].item.as_deref(), Some(E1));
    }

    #[test]
    fn escalation_gap_is_a_warning() {
        let dir = two_epics();
        let mut board = Board::load(dir.path()).unwrap();
        link(&mut board, T2, T1).unwrap();
        // Drop the epic-level link by hand.
        let e2 = board.find_by_id(E2).unwrap().path.clone();
        std::fs::write(e2.join("progress.md"), render_progress(&Progress::default())).unwrap();
        let report = run(&dir);
        assert!(report.issues.iter().any(|i| {
            i.severity == Severity::Warning && i.message.contains("missing escalated link")
        }));
    }

    #[test]
    fn sibling_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), E1, "e", &[]);
        let s = write_item(&e, S1, "s", &[]);
        write_item(&s, T1, "a", &[]);
        write_item(&s, T2, "b", &[]);
        let mut board = Board::load(dir.path()).unwrap();
        link(&mut board, T1, T2).unwrap();
        link(&mut board, T2, T1).unwrap();
        let report = run(&dir);
        assert!(report
            .issues
            .iter()
            .any(|i| i.severity == Severity::Error && i.message.contains("dependency cycle")));
    }

    #[test]
    fn mixed_id_styles_and_strays_warn() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), E1, "new", &[]);
        write_item(dir.path(), "EPIC-7", "old", &[]);
        write_item(dir.path(), T1, "misplaced", &[]);
        std::fs::write(dir.path().join("system.md"), "- epic: 3\n").unwrap();
        let report = run(&dir);
        assert!(!report.has_errors());
        let messages: Vec<&str> = report.issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("mixes legacy")));
        assert!(messages.iter().any(|m| m.contains("exceeds the epic counter")));
        assert!(messages.iter().any(|m| m.contains("illegal depth")));
    }
}
