use anyhow::Context;
use board_core::{config::BoardConfig, io, paths, system};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let board = paths::board_dir(root);
    io::ensure_dir(&board).with_context(|| format!("failed to create {}", board.display()))?;

    let system_created = io::write_if_missing(
        &paths::system_path(&board),
        system::default_system_md().as_bytes(),
    )
    .context("failed to write system.md")?;

    let config_path = paths::config_path(&board);
    let config_created = !config_path.exists();
    if config_created {
        BoardConfig::default()
            .save(&board)
            .context("failed to write config.yaml")?;
    }

    if json {
        crate::output::print_json(&serde_json::json!({
            "board": board,
            "system_created": system_created,
            "config_created": config_created,
        }))?;
        return Ok(());
    }

    println!("Initializing board in: {}", board.display());
    for (name, created) in [
        (paths::SYSTEM_FILE, system_created),
        (paths::CONFIG_FILE, config_created),
    ] {
        if created {
            println!("  created: {}/{name}", paths::BOARD_DIR);
        } else {
            println!("  exists:  {}/{name}", paths::BOARD_DIR);
        }
    }
    Ok(())
}
