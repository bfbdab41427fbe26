use crate::cmd::{load_config, open_board};
use crate::output::{print_json, print_table};
use board_core::validate::{validate, Severity};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let board = open_board(root)?;
    let config = load_config(root)?;
    let report = validate(&board, &config)?;

    if json {
        print_json(&report)?;
    } else if report.issues.is_empty() {
        println!("Board is consistent ({} items).", board.len());
    } else {
        let rows = report
            .issues
            .iter()
            .map(|i| {
                vec![
                    match i.severity {
                        Severity::Error => "error".to_string(),
                        Severity::Warning => "warning".to_string(),
                    },
                    i.item.clone().unwrap_or_else(|| "-".to_string()),
                    i.message.clone(),
                ]
            })
            .collect();
        print_table(&["SEVERITY", "ITEM", "MESSAGE"], rows);
    }

    if report.has_errors() {
        anyhow::bail!(
            "validation failed: {} error(s), {} warning(s)",
            report.count(Severity::Error),
            report.count(Severity::Warning)
        );
    }
    Ok(())
}
