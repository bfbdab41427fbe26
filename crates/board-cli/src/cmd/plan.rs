use crate::cmd::{board_dir, load_config, open_board};
use crate::output::{print_json, status_label};
use anyhow::Context;
use board_core::plan_doc::save_plan;
use board_core::render::{render_plan, Graphviz, Layout, OutputFormat};
use board_core::scheduler::{plan_scope, Plan, Scope};
use std::path::Path;

pub struct PlanArgs {
    pub scope: Option<String>,
    pub deep: bool,
    pub active: bool,
    pub phase: Option<usize>,
    pub critical_path: bool,
    pub save: bool,
    pub render: bool,
    pub layout: Option<Layout>,
    pub format: Option<OutputFormat>,
}

pub fn run(root: &Path, args: PlanArgs, json: bool) -> anyhow::Result<()> {
    let board = open_board(root)?;
    let config = load_config(root)?;
    let scope = Scope::new(args.scope.as_deref(), args.deep);
    let (items, plan) = plan_scope(&board, &scope, args.active)?;
    let label = scope.label(&board);

    if plan.has_cycle {
        if json {
            print_json(&plan)?;
        } else {
            print_cycle(&plan);
        }
        plan.ensure_acyclic()
            .with_context(|| format!("cannot schedule {label}"))?;
    }

    if let Some(n) = args.phase {
        if plan.phase(n).is_none() {
            anyhow::bail!("phase {n} does not exist ({} phases)", plan.phases.len());
        }
    }

    let scope_dir = scope.dir(&board)?;
    let mut written = Vec::new();
    if args.save {
        let path = save_plan(&scope_dir, &config.plan_file, &label, &plan)
            .with_context(|| format!("failed to write {}", config.plan_file))?;
        written.push(path);
    }
    if args.render {
        let layout = args.layout.unwrap_or(config.default_layout);
        let format = args.format.unwrap_or(config.default_format);
        let renderer = Graphviz::locate(config.dot_binary())?;
        let out_dir = config.output_dir_for(&board_dir(root), &scope_dir);
        let out = out_dir.join(format!("plan.{}", format.extension()));
        let path = render_plan(&renderer, layout, format, &board, &items, &plan, &out)
            .with_context(|| format!("failed to render {}", out.display()))?;
        written.push(path);
    }

    if json {
        let value = match (args.phase, args.critical_path) {
            (Some(n), _) => serde_json::to_value(plan.phase(n))?,
            (None, true) => serde_json::json!({ "critical_path": plan.critical_path }),
            (None, false) => serde_json::to_value(&plan)?,
        };
        print_json(&value)?;
    } else if let Some(n) = args.phase {
        print_phases(&plan, Some(n));
    } else if args.critical_path {
        print_critical_path(&plan);
    } else {
        println!("Plan: {label}\n");
        print_phases(&plan, None);
        print_critical_path(&plan);
        if !plan.warnings.is_empty() {
            println!("\nWarnings:");
            for w in &plan.warnings {
                println!("  - {w}");
            }
        }
    }

    for path in written {
        if !json {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_phases(plan: &Plan, only: Option<usize>) {
    if plan.phases.is_empty() {
        println!("(nothing to schedule)");
        return;
    }
    for phase in plan.phases.iter().filter(|p| only.map_or(true, |n| p.number == n)) {
        if phase.number == 1 {
            println!("Phase 1 (no dependencies)");
        } else {
            println!("Phase {}", phase.number);
        }
        for e in &phase.elements {
            let blocked = if e.blocked_by.is_empty() {
                String::new()
            } else {
                format!("  <- {}", e.blocked_by.join(", "))
            };
            println!("  {} {} [{}]{blocked}", e.id, e.title, status_label(e.status));
        }
    }
}

fn print_critical_path(plan: &Plan) {
    if plan.critical_path.is_empty() {
        println!("\nCritical path: (none)");
    } else {
        println!(
            "\nCritical path: {} ({} phases)",
            plan.critical_path.join(" -> "),
            plan.critical_path.len()
        );
    }
}

fn print_cycle(plan: &Plan) {
    eprintln!("Dependency cycle detected.");
    if !plan.cycle_path.is_empty() {
        eprintln!("  cycle: {}", plan.cycle_path.join(" -> "));
    }
    eprintln!("  unschedulable: {}", plan.cycle_nodes.join(", "));
}
