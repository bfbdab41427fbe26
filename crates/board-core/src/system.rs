//! `system.md`: per-type counters left over from sequential IDs.
//!
//! New IDs never consult these counters. They are read so the validator can
//! flag legacy IDs numbered past the recorded counter, and `init` writes a
//! zeroed file so older tooling still finds one.

use crate::error::Result;
use crate::io::read_or_empty;
use crate::paths;
use crate::types::ItemType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    counts: BTreeMap<ItemType, u64>,
}

impl Counters {
    pub fn get(&self, item_type: ItemType) -> u64 {
        self.counts.get(&item_type).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Accepts `- task: 12`, `task: 12` and `TASK = 12`. Unknown keys and
/// malformed lines are skipped.
pub fn parse_system(text: &str) -> Counters {
    let mut counts = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        let Some((key, value)) = line.split_once([':', '=']) else {
            continue;
        };
        let key = key.trim().to_ascii_uppercase();
        let Some(item_type) = ItemType::from_prefix(&key) else {
            continue;
        };
        if let Ok(n) = value.trim().parse::<u64>() {
            counts.insert(item_type, n);
        }
    }
    Counters { counts }
}

pub fn default_system_md() -> String {
    let mut out = String::from("# System\n\n## Counters\n");
    for t in ItemType::all() {
        out.push_str(&format!("- {}: 0\n", t.as_str()));
    }
    out
}

pub fn read_counters(board: &Path) -> Result<Counters> {
    Ok(parse_system(&read_or_empty(&paths::system_path(board))?))
}
