//! Graphviz output for plans.
//!
//! Two layouts are produced as DOT text: `phases` (one cluster per phase,
//! left to right) and `hierarchy` (epics and stories as nested clusters,
//! top to bottom). Turning DOT into an image is delegated to a
//! [`GraphRenderer`]; [`Graphviz`] shells out to the `dot` binary.

use crate::board::Board;
use crate::error::{BoardError, Result};
use crate::item::Item;
use crate::scheduler::Plan;
use crate::types::{ItemType, Status};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Phases,
    Hierarchy,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Phases => "phases",
            Layout::Hierarchy => "hierarchy",
        })
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phases" => Ok(Layout::Phases),
            "hierarchy" => Ok(Layout::Hierarchy),
            other => Err(format!("unknown layout '{other}': expected phases or hierarchy")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(format!("unknown format '{other}': expected svg, png or pdf")),
        }
    }
}

// ---------------------------------------------------------------------------
// Palette and node helpers
// ---------------------------------------------------------------------------

/// Fill color per status. Grey for not started, blues for work in flight,
/// oranges for review, green when finished, red when stuck.
pub fn status_color(status: Status) -> &'static str {
    match status {
        Status::Backlog => "#e8e8e8",
        Status::Analysis => "#d6e4ff",
        Status::ToDev => "#adc8ff",
        Status::Development => "#85a9ff",
        Status::ToReview => "#ffe7ba",
        Status::Reviewing => "#ffc069",
        Status::Done => "#b7eb8f",
        Status::Closed => "#d9d9d9",
        Status::Blocked => "#ff7875",
    }
}

fn shape(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Epic => "box3d",
        ItemType::Bug => "octagon",
        ItemType::Story | ItemType::Task => "box",
    }
}

/// DOT identifier for an item: `-` is not legal in bare IDs.
pub fn node_id(id: &str) -> String {
    id.replace('-', "_")
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_node(out: &mut String, item: &Item, indent: &str) {
    let _ = writeln!(
        out,
        "{indent}{} [label=\"{}\\n{}\", shape={}, style=filled, fillcolor=\"{}\"];",
        node_id(&item.id),
        escape(&item.id),
        escape(&item.name),
        shape(item.item_type),
        status_color(item.status()),
    );
}

fn write_legend(out: &mut String) {
    out.push_str("  subgraph cluster_legend {\n");
    out.push_str("    label=\"Status\";\n    style=dotted;\n");
    for &status in Status::all() {
        let _ = writeln!(
            out,
            "    legend_{} [label=\"{}\", shape=box, style=filled, fillcolor=\"{}\"];",
            status.as_str().replace('-', "_"),
            status,
            status_color(status),
        );
    }
    out.push_str("  }\n");
}

fn write_edges(out: &mut String, plan: &Plan) {
    let critical: HashSet<(&str, &str)> = plan
        .critical_path
        .windows(2)
        .map(|w| (w[0].as_str(), w[1].as_str()))
        .collect();
    for edge in &plan.edges {
        let attrs = if critical.contains(&(edge.blocker.as_str(), edge.blocked.as_str())) {
            " [color=\"#cf1322\", penwidth=2]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} -> {}{attrs};",
            node_id(&edge.blocker),
            node_id(&edge.blocked)
        );
    }
}

// ---------------------------------------------------------------------------
// DOT generation
// ---------------------------------------------------------------------------

pub fn to_dot(layout: Layout, board: &Board, items: &[&Item], plan: &Plan) -> String {
    match layout {
        Layout::Phases => to_dot_phases(items, plan),
        Layout::Hierarchy => to_dot_hierarchy(board, items, plan),
    }
}

pub fn to_dot_phases(items: &[&Item], plan: &Plan) -> String {
    let mut out = String::from("digraph plan {\n  rankdir=LR;\n  node [fontname=\"Helvetica\"];\n");
    for phase in &plan.phases {
        let _ = writeln!(out, "  subgraph cluster_phase_{} {{", phase.number);
        let _ = writeln!(out, "    label=\"Phase {}\";", phase.number);
        for entry in &phase.elements {
            if let Some(item) = items.iter().find(|i| i.id == entry.id) {
                write_node(&mut out, item, "    ");
            }
        }
        out.push_str("  }\n");
    }
    write_edges(&mut out, plan);
    write_legend(&mut out);
    out.push_str("}\n");
    out
}

pub fn to_dot_hierarchy(board: &Board, items: &[&Item], plan: &Plan) -> String {
    let in_scope: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    // An ancestor gets a cluster when it or anything below it is in scope.
    let visible = |id: &str| {
        in_scope.contains(id) || board.descendants_of(id).iter().any(|d| in_scope.contains(d.id.as_str()))
    };

    let mut out = String::from("digraph plan {\n  rankdir=TB;\n  compound=true;\n  node [fontname=\"Helvetica\"];\n");
    for epic in board.find_by_type(ItemType::Epic) {
        if !visible(&epic.id) {
            continue;
        }
        let _ = writeln!(out, "  subgraph cluster_{} {{", node_id(&epic.id));
        let _ = writeln!(out, "    label=\"{}\";\n    style=rounded;", escape(epic.title()));
        if in_scope.contains(epic.id.as_str()) {
            write_node(&mut out, epic, "    ");
        }
        for story in board.children_of(&epic.id) {
            if !visible(&story.id) {
                continue;
            }
            let leaves: Vec<&Item> = board
                .children_of(&story.id)
                .into_iter()
                .filter(|l| in_scope.contains(l.id.as_str()))
                .collect();
            if leaves.is_empty() {
                write_node(&mut out, story, "    ");
                continue;
            }
            let _ = writeln!(out, "    subgraph cluster_{} {{", node_id(&story.id));
            let _ = writeln!(out, "      label=\"{}\";\n      style=dashed;", escape(story.title()));
            if in_scope.contains(story.id.as_str()) {
                write_node(&mut out, story, "      ");
            }
            for leaf in leaves {
                write_node(&mut out, leaf, "      ");
            }
            out.push_str("    }\n");
        }
        out.push_str("  }\n");
    }
    write_edges(&mut out, plan);
    write_legend(&mut out);
    out.push_str("}\n");
    out
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Turns DOT text into an image file.
pub trait GraphRenderer {
    /// Render `dot` into `out`, returning the written path.
    fn render(&self, dot: &str, format: OutputFormat, out: &Path) -> Result<PathBuf>;
}

/// The Graphviz `dot` executable.
#[derive(Debug, Clone)]
pub struct Graphviz {
    binary: PathBuf,
}

impl Graphviz {
    /// Resolve `name` (a bare command or a path) with `which`.
    pub fn locate(name: &str) -> Result<Self> {
        let binary = which::which(name).map_err(|_| BoardError::RendererMissing(name.to_string()))?;
        Ok(Graphviz { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl GraphRenderer for Graphviz {
    fn render(&self, dot: &str, format: OutputFormat, out: &Path) -> Result<PathBuf> {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut src = NamedTempFile::new()?;
        src.write_all(dot.as_bytes())?;
        src.flush()?;

        tracing::debug!(binary = %self.binary.display(), out = %out.display(), %format, "running graphviz");
        let output = Command::new(&self.binary)
            .arg(format!("-T{}", format.extension()))
            .arg("-o")
            .arg(out)
            .arg(src.path())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BoardError::RenderFailed(if stderr.is_empty() {
                format!("dot exited with {}", output.status)
            } else {
                stderr
            }));
        }
        Ok(out.to_path_buf())
    }
}

/// Render a plan; a cyclic plan fails before any subprocess runs.
pub fn render_plan(
    renderer: &dyn GraphRenderer,
    layout: Layout,
    format: OutputFormat,
    board: &Board,
    items: &[&Item],
    plan: &Plan,
    out: &Path,
) -> Result<PathBuf> {
    plan.ensure_acyclic()?;
    let dot = to_dot(layout, board, items, plan);
    renderer.render(&dot, format, out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
