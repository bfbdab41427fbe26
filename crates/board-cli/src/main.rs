mod cmd;
mod output;
mod root;

use board_core::lifecycle::ReadmeEdit;
use board_core::render::{Layout, OutputFormat};
use board_core::{ItemType, Status};
use clap::{Parser, Subcommand};
use cmd::{parse_item_type, parse_status, progress::ProgressSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "board",
    about = "File-based project board with dependency-aware planning",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .board/ or .git/)
    #[arg(long, global = true, env = "BOARD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .board/ in the project root
    Init,

    /// Create an epic, story, task or bug
    Create {
        #[arg(value_parser = parse_item_type)]
        kind: ItemType,
        /// Short name, used for the directory slug
        #[arg(long)]
        name: String,
        /// Display title (defaults to the name)
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Parent epic (stories)
        #[arg(long)]
        epic: Option<String>,
        /// Parent story (tasks and bugs)
        #[arg(long)]
        story: Option<String>,
    },

    /// Show one item in full
    Show { id: String },

    /// List items as a tree, or as a table when filtered
    List {
        #[arg(long = "type", value_parser = parse_item_type)]
        kind: Option<ItemType>,
        #[arg(long, value_parser = parse_status)]
        status: Option<Status>,
    },

    /// Rewrite README fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        acceptance: Option<String>,
    },

    /// Record that ID cannot proceed until another item is finished
    Link {
        id: String,
        #[arg(long)]
        blocked_by: String,
    },

    /// Remove a dependency recorded with `link`
    Unlink {
        id: String,
        #[arg(long)]
        blocked_by: String,
    },

    /// Update status, assignee, checklist and notes
    Progress {
        #[command(subcommand)]
        subcommand: ProgressSubcommand,
    },

    /// Schedule a scope into dependency phases
    Plan {
        /// Epic or story to plan (default: all epics)
        scope: Option<String>,
        /// Include every descendant instead of direct children
        #[arg(long)]
        deep: bool,
        /// Leave out done and closed items
        #[arg(long)]
        active: bool,
        /// Print only phase N
        #[arg(long)]
        phase: Option<usize>,
        /// Print only the critical path
        #[arg(long)]
        critical_path: bool,
        /// Write plan.md into the scope directory
        #[arg(long)]
        save: bool,
        /// Render a Graphviz image into the scope directory
        #[arg(long)]
        render: bool,
        #[arg(long)]
        layout: Option<Layout>,
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Delete an item (with --force, its whole subtree)
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },

    /// Move a story to another epic, or a task/bug to another story
    Move {
        id: String,
        #[arg(long)]
        to: String,
    },

    /// Check board consistency
    Validate,

    /// Regex search over item files
    Search {
        pattern: String,
        #[arg(long = "type", value_parser = parse_item_type)]
        kind: Option<ItemType>,
        /// Case-insensitive match
        #[arg(long, short = 'i')]
        ignore_case: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, json),
        Commands::Create {
            kind,
            name,
            title,
            description,
            epic,
            story,
        } => cmd::item::create(
            &root,
            cmd::item::CreateArgs {
                kind,
                name,
                title,
                description,
                epic,
                story,
            },
            json,
        ),
        Commands::Show { id } => cmd::item::show(&root, &id, json),
        Commands::List { kind, status } => cmd::item::list(&root, kind, status, json),
        Commands::Edit {
            id,
            title,
            description,
            scope,
            acceptance,
        } => cmd::item::edit(
            &root,
            &id,
            ReadmeEdit {
                title,
                description,
                scope,
                acceptance_criteria: acceptance,
            },
            json,
        ),
        Commands::Link { id, blocked_by } => cmd::link::link(&root, &id, &blocked_by, json),
        Commands::Unlink { id, blocked_by } => cmd::link::unlink(&root, &id, &blocked_by, json),
        Commands::Progress { subcommand } => cmd::progress::run(&root, subcommand, json),
        Commands::Plan {
            scope,
            deep,
            active,
            phase,
            critical_path,
            save,
            render,
            layout,
            format,
        } => cmd::plan::run(
            &root,
            cmd::plan::PlanArgs {
                scope,
                deep,
                active,
                phase,
                critical_path,
                save,
                render,
                layout,
                format,
            },
            json,
        ),
        Commands::Delete { id, force } => cmd::item::delete(&root, &id, force, json),
        Commands::Move { id, to } => cmd::item::move_item(&root, &id, &to, json),
        Commands::Validate => cmd::validate::run(&root, json),
        Commands::Search {
            pattern,
            kind,
            ignore_case,
        } => cmd::search::run(&root, &pattern, kind, ignore_case, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
