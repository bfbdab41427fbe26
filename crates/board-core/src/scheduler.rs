use crate::board::Board;
use crate::deps::Edge;
use crate::error::{BoardError, Result};
use crate::item::Item;
use crate::types::{ItemType, Status};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which items a plan considers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "root", rename_all = "snake_case")]
pub enum Scope {
    /// Every epic.
    Project,
    /// Direct children of one item: an epic's stories or a story's tasks and bugs.
    Children(String),
    /// Everything below one item, or the whole board.
    Descendants(Option<String>),
}

impl Scope {
    pub fn new(root: Option<&str>, deep: bool) -> Scope {
        match (root, deep) {
            (None, false) => Scope::Project,
            (None, true) => Scope::Descendants(None),
            (Some(id), false) => Scope::Children(id.to_string()),
            (Some(id), true) => Scope::Descendants(Some(id.to_string())),
        }
    }

    pub fn root_id(&self) -> Option<&str> {
        match self {
            Scope::Project | Scope::Descendants(None) => None,
            Scope::Children(id) | Scope::Descendants(Some(id)) => Some(id),
        }
    }

    /// Items in scope, in load order.
    pub fn resolve<'a>(&self, board: &'a Board) -> Result<Vec<&'a Item>> {
        match self {
            Scope::Project => Ok(board.find_by_type(ItemType::Epic)),
            Scope::Children(id) => {
                let root = board.find_by_id(id)?;
                Ok(board.children_of(&root.id))
            }
            Scope::Descendants(None) => {
                let mut out = Vec::new();
                for epic in board.find_by_type(ItemType::Epic) {
                    out.push(epic);
                    out.extend(board.descendants_of(&epic.id));
                }
                Ok(out)
            }
            Scope::Descendants(Some(id)) => {
                let root = board.find_by_id(id)?;
                Ok(board.descendants_of(&root.id))
            }
        }
    }

    /// Human label, e.g. `project` or `STORY-260101-abc123 (Login)`.
    pub fn label(&self, board: &Board) -> String {
        let deep = matches!(self, Scope::Descendants(_));
        let base = match self.root_id().and_then(|id| board.get(id)) {
            Some(item) => format!("{} ({})", item.id, item.title()),
            None => "project".to_string(),
        };
        if deep {
            format!("{base}, all descendants")
        } else {
            base
        }
    }

    /// Directory that plan artifacts for this scope are written to.
    pub fn dir(&self, board: &Board) -> Result<PathBuf> {
        match self.root_id() {
            Some(id) => Ok(board.find_by_id(id)?.path.clone()),
            None => Ok(board.root().to_path_buf()),
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub id: String,
    pub title: String,
    pub item_type: ItemType,
    pub status: Status,
    /// In-scope blockers only.
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanPhase {
    pub number: usize,
    pub elements: Vec<PlanEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub phases: Vec<PlanPhase>,
    pub critical_path: Vec<String>,
    pub has_cycle: bool,
    pub cycle_nodes: Vec<String>,
    /// Explicit cycle ending with its start node, when one could be traced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle_path: Vec<String>,
    /// In-scope `blocker -> blocked` pairs.
    pub edges: Vec<Edge>,
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn phase(&self, number: usize) -> Option<&PlanPhase> {
        self.phases.iter().find(|p| p.number == number)
    }

    pub fn phase_of(&self, id: &str) -> Option<usize> {
        self.phases
            .iter()
            .find(|p| p.elements.iter().any(|e| e.id == id))
            .map(|p| p.number)
    }

    pub fn scheduled(&self) -> usize {
        self.phases.iter().map(|p| p.elements.len()).sum()
    }

    /// Err(CycleDetected) when the scope is not a DAG.
    pub fn ensure_acyclic(&self) -> Result<()> {
        if self.has_cycle {
            let nodes = if self.cycle_path.is_empty() {
                self.cycle_nodes.clone()
            } else {
                self.cycle_path.clone()
            };
            return Err(BoardError::CycleDetected(nodes));
        }
        Ok(())
    }
}

/// Resolve a scope (optionally dropping done/closed items) and plan it.
///
/// With `active_only`, finished blockers are expected to be missing from the
/// scope and produce no warning.
pub fn plan_scope<'a>(
    board: &'a Board,
    scope: &Scope,
    active_only: bool,
) -> Result<(Vec<&'a Item>, Plan)> {
    let mut items = scope.resolve(board)?;
    let plan = if active_only {
        items.retain(|i| !i.status().is_complete());
        plan_with(&items, |id| {
            board.get(id).is_some_and(|i| i.status().is_complete())
        })
    } else {
        build_plan(&items)
    };
    Ok((items, plan))
}

/// Layered topological sort, critical path and cycle localization over `items`.
/// Blockers outside `items` are ignored and reported as warnings.
pub fn build_plan(items: &[&Item]) -> Plan {
    plan_with(items, |_| false)
}

/// [`build_plan`], except out-of-scope blockers for which `settled` holds are
/// dropped without a warning.
fn plan_with(items: &[&Item], settled: impl Fn(&str) -> bool) -> Plan {
    let n = items.len();
    let pos: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id.as_str(), i))
        .collect();

    // Adjacency: blocker -> blocked, kept in scope order.
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];
    let mut in_scope_blockers: Vec<Vec<String>> = vec![Vec::new(); n];
    let mut edges = Vec::new();
    let mut warnings = Vec::new();

    for (v, item) in items.iter().enumerate() {
        let mut outside = Vec::new();
        for blocker in item.blocked_by() {
            match pos.get(blocker.as_str()) {
                Some(&u) => {
                    adj[u].push(v);
                    in_degree[v] += 1;
                    in_scope_blockers[v].push(blocker.clone());
                    edges.push(Edge {
                        blocked: item.id.clone(),
                        blocker: blocker.clone(),
                    });
                }
                None if settled(blocker.as_str()) => {}
                None => outside.push(blocker.as_str()),
            }
        }
        if !outside.is_empty() {
            warnings.push(format!(
                "{} is blocked by items outside this scope (ignored): {}",
                item.id,
                outside.join(", ")
            ));
        }
    }

    // Kahn with level tracking.
    let mut remaining = in_degree.clone();
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &u in &current {
            for &v in &adj[u] {
                remaining[v] -= 1;
                if remaining[v] == 0 {
                    next.push(v);
                }
            }
        }
        next.sort_unstable();
        levels.push(current);
        current = next;
    }

    let processed: usize = levels.iter().map(Vec::len).sum();
    let has_cycle = processed < n;
    let cycle_set: Vec<usize> = (0..n).filter(|&i| remaining[i] > 0).collect();
    let cycle_path = if has_cycle {
        trace_cycle(items, &pos, &cycle_set)
    } else {
        Vec::new()
    };

    let critical_path = if has_cycle || edges.is_empty() {
        Vec::new()
    } else {
        longest_path(&levels, &adj)
            .into_iter()
            .map(|i| items[i].id.clone())
            .collect()
    };

    let phases = levels
        .iter()
        .enumerate()
        .map(|(i, level)| PlanPhase {
            number: i + 1,
            elements: level
                .iter()
                .map(|&v| PlanEntry {
                    id: items[v].id.clone(),
                    title: items[v].title().to_string(),
                    item_type: items[v].item_type,
                    status: items[v].status(),
                    blocked_by: in_scope_blockers[v].clone(),
                })
                .collect(),
        })
        .collect();

    Plan {
        phases,
        critical_path,
        has_cycle,
        cycle_nodes: cycle_set.iter().map(|&i| items[i].id.clone()).collect(),
        cycle_path,
        edges,
        warnings,
    }
}

/// Longest chain through the DAG; ties keep the first node reached in topological order.
fn longest_path(levels: &[Vec<usize>], adj: &[Vec<usize>]) -> Vec<usize> {
    let n = adj.len();
    let mut dist = vec![0usize; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let order: Vec<usize> = levels.iter().flatten().copied().collect();

    for &u in &order {
        for &v in &adj[u] {
            if dist[u] + 1 > dist[v] {
                dist[v] = dist[u] + 1;
                prev[v] = Some(u);
            }
        }
    }

    let Some(mut end) = order.first().copied() else {
        return Vec::new();
    };
    for &v in &order {
        if dist[v] > dist[end] {
            end = v;
        }
    }

    let mut path = vec![end];
    while let Some(p) = prev[end] {
        path.push(p);
        end = p;
    }
    path.reverse();
    path
}

/// DFS along `blocked_by` edges restricted to the unscheduled nodes, trying
/// each node as a start in order until a closed walk back to it is found.
fn trace_cycle(items: &[&Item], pos: &HashMap<&str, usize>, cycle_set: &[usize]) -> Vec<String> {
    let in_cycle: HashSet<usize> = cycle_set.iter().copied().collect();
    let neighbors = |x: usize| -> Vec<usize> {
        items[x]
            .blocked_by()
            .iter()
            .filter_map(|b| pos.get(b.as_str()).copied())
            .filter(|i| in_cycle.contains(i))
            .collect()
    };

    for &start in cycle_set {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut path = vec![start];
        let mut stack: Vec<(usize, Vec<usize>)> = vec![(start, neighbors(start))];
        visited.insert(start);

        while let Some((_, pending)) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                stack.pop();
                path.pop();
                continue;
            };
            if next == start {
                path.push(start);
                return path.into_iter().map(|i| items[i].id.clone()).collect();
            }
            if visited.insert(next) {
                path.push(next);
                stack.push((next, neighbors(next)));
            }
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Progress, Readme};

    fn item(id: &str, blocked_by: &[&str]) -> Item {
        Item {
            id: id.to_string(),
            item_type: ItemType::Task,
            name: id.to_lowercase(),
            path: PathBuf::from(id),
            parent_id: Some("STORY-1".into()),
            legacy_id: true,
            readme: Readme::default(),
            progress: Progress {
                blocked_by: blocked_by.iter().map(|s| s.to_string()).collect(),
                ..Progress::default()
            },
        }
    }

    fn phase_ids(plan: &Plan) -> Vec<Vec<&str>> {
        plan.phases
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.as_str()).collect())
            .collect()
    }

    #[test]
    fn linear_chain() {
        let items = [item("A", &[]), item("B", &["A"]), item("C", &["B"])];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert_eq!(phase_ids(&plan), vec![vec!["A"], vec!["B"], vec!["C"]]);
        assert_eq!(plan.critical_path, vec!["A", "B", "C"]);
        assert!(!plan.has_cycle);
        assert_eq!(plan.phases[0].number, 1);
        assert_eq!(plan.phases[2].elements[0].blocked_by, vec!["B"]);
    }

    #[test]
    fn diamond() {
        let items = [
            item("D", &["B", "C"]),
            item("C", &["A"]),
            item("B", &["A"]),
            item("A", &[]),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert_eq!(phase_ids(&plan), vec![vec!["A"], vec!["C", "B"], vec!["D"]]);
        assert_eq!(plan.critical_path.len(), 3);
        assert_eq!(plan.critical_path.first().map(String::as_str), Some("A"));
        assert_eq!(plan.critical_path.last().map(String::as_str), Some("D"));
        assert_eq!(plan.critical_path[1], "C");
    }

    #[test]
    fn no_edges_means_single_phase_and_empty_critical_path() {
        let items = [item("A", &[]), item("B", &[])];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert_eq!(phase_ids(&plan), vec![vec!["A", "B"]]);
        assert!(plan.critical_path.is_empty());
        assert!(plan.edges.is_empty());
    }

    #[test]
    fn two_node_cycle() {
        let items = [item("A", &["B"]), item("B", &["A"])];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert!(plan.has_cycle);
        assert!(plan.phases.is_empty());
        assert_eq!(plan.cycle_nodes, vec!["A", "B"]);
        assert_eq!(plan.cycle_path, vec!["A", "B", "A"]);
        assert!(plan.critical_path.is_empty());
        assert!(matches!(
            plan.ensure_acyclic(),
            Err(BoardError::CycleDetected(_))
        ));
    }

    #[test]
    fn cycle_downstream_node_is_listed_but_not_on_path() {
        // X waits on the A<->B cycle without being part of it.
        let items = [
            item("X", &["A"]),
            item("A", &["B"]),
            item("B", &["A"]),
            item("F", &[]),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert!(plan.has_cycle);
        assert_eq!(plan.cycle_nodes, vec!["X", "A", "B"]);
        assert_eq!(plan.cycle_path, vec!["A", "B", "A"]);
        assert_eq!(phase_ids(&plan), vec![vec!["F"]]);
        assert_eq!(plan.scheduled() + plan.cycle_nodes.len(), items.len());
    }

    #[test]
    fn out_of_scope_blockers_are_ignored_with_warning() {
        let items = [item("A", &["ELSEWHERE"]), item("B", &["A"])];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        assert_eq!(phase_ids(&plan), vec![vec!["A"], vec!["B"]]);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("ELSEWHERE"));
    }

    #[test]
    fn phases_respect_every_edge() {
        let items = [
            item("A", &[]),
            item("B", &["A"]),
            item("C", &[]),
            item("D", &["C", "B"]),
            item("E", &["A"]),
            item("F", &["D", "E"]),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let plan = build_plan(&refs);
        for e in &plan.edges {
            assert!(plan.phase_of(&e.blocker).unwrap() < plan.phase_of(&e.blocked).unwrap());
        }
        assert_eq!(plan.critical_path, vec!["A", "B", "D", "F"]);
    }

    #[test]
    fn active_plan_is_silent_about_finished_blockers() {
        use crate::board::tests::write_item;
        use crate::status::set_status;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), "EPIC-260101-e00001", "e", &[]);
        let s = write_item(&e, "STORY-260101-s00001", "s", &[]);
        let other = write_item(&e, "STORY-260101-s00002", "other", &[]);
        write_item(&s, "TASK-260101-t00001", "a", &[]);
        write_item(&other, "TASK-260101-t00009", "elsewhere", &[]);
        write_item(
            &s,
            "TASK-260101-t00002",
            "b",
            &["TASK-260101-t00001", "TASK-260101-t00009"],
        );
        let mut board = Board::load(dir.path()).unwrap();
        set_status(&mut board, "TASK-260101-t00001", Status::Done).unwrap();

        let scope = Scope::new(Some("STORY-260101-s00001"), false);
        let (items, plan) = plan_scope(&board, &scope, true).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(phase_ids(&plan), vec![vec!["TASK-260101-t00002"]]);
        // The unfinished blocker in another story is still reported.
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("TASK-260101-t00009"));
        assert!(!plan.warnings[0].contains("TASK-260101-t00001"));

        let (_, full) = plan_scope(&board, &scope, false).unwrap();
        assert_eq!(full.phases.len(), 2);
        assert_eq!(full.warnings.len(), 1);
    }

    #[test]
    fn scope_constructors() {
        assert_eq!(Scope::new(None, false), Scope::Project);
        assert_eq!(Scope::new(None, true), Scope::Descendants(None));
        assert_eq!(
            Scope::new(Some("EPIC-1"), false),
            Scope::Children("EPIC-1".into())
        );
        assert_eq!(Scope::new(Some("EPIC-1"), true).root_id(), Some("EPIC-1"));
    }
}
