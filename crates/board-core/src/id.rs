//! Item identifiers and directory names.
//!
//! IDs look like `TASK-260118-k3f9qa`: type prefix, creation date (local time,
//! `YYMMDD`) and six base-36 characters drawn from a hashed random seed.
//! Directories carry the ID plus a slug: `TASK-260118-k3f9qa_fix-login`.
//! The legacy short form `TASK-12` is still accepted on read.

use crate::error::{BoardError, Result};
use crate::types::ItemType;
use chrono::{Local, NaiveDate};
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Grammars
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();
static LEGACY_ID_RE: OnceLock<Regex> = OnceLock::new();
static DIR_RE: OnceLock<Regex> = OnceLock::new();
static LEGACY_DIR_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| {
        Regex::new(r"(?i)^(EPIC|STORY|TASK|BUG)-(\d{6})-([0-9a-z]{6})$").unwrap()
    })
}

fn legacy_id_re() -> &'static Regex {
    LEGACY_ID_RE.get_or_init(|| Regex::new(r"(?i)^(EPIC|STORY|TASK|BUG)-(\d+)$").unwrap())
}

fn dir_re() -> &'static Regex {
    DIR_RE.get_or_init(|| {
        Regex::new(r"^(EPIC|STORY|TASK|BUG)-(\d{6})-([0-9a-z]{6})_([a-z0-9-]+)$").unwrap()
    })
}

fn legacy_dir_re() -> &'static Regex {
    LEGACY_DIR_RE
        .get_or_init(|| Regex::new(r"^(EPIC|STORY|TASK|BUG)-(\d+)_([a-z0-9-]+)$").unwrap())
}

// ---------------------------------------------------------------------------
// Parsed forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub item_type: ItemType,
    /// Canonical form: upper-case prefix, lower-case suffix.
    pub id: String,
    pub legacy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirName {
    pub id: ParsedId,
    pub slug: String,
}

/// Parse an item ID, case-insensitively.
pub fn parse_id(s: &str) -> Result<ParsedId> {
    let s = s.trim();
    if let Some(caps) = id_re().captures(s) {
        let item_type = ItemType::from_prefix(&caps[1])
            .ok_or_else(|| BoardError::InvalidId(s.to_string()))?;
        return Ok(ParsedId {
            item_type,
            id: format!(
                "{}-{}-{}",
                item_type.prefix(),
                &caps[2],
                caps[3].to_ascii_lowercase()
            ),
            legacy: false,
        });
    }
    if let Some(caps) = legacy_id_re().captures(s) {
        let item_type = ItemType::from_prefix(&caps[1])
            .ok_or_else(|| BoardError::InvalidId(s.to_string()))?;
        return Ok(ParsedId {
            item_type,
            id: format!("{}-{}", item_type.prefix(), &caps[2]),
            legacy: true,
        });
    }
    Err(BoardError::InvalidId(s.to_string()))
}

/// Canonical spelling of an ID-like string without validating it.
/// Used for case-insensitive lookups of references read from disk.
pub fn canonical_id(s: &str) -> String {
    let s = s.trim();
    match s.split_once('-') {
        Some((prefix, rest)) => format!(
            "{}-{}",
            prefix.to_ascii_uppercase(),
            rest.to_ascii_lowercase()
        ),
        None => s.to_ascii_uppercase(),
    }
}

/// Parse a directory name of the form `TYPE-YYMMDD-xxxxxx_slug` (or legacy `TYPE-NN_slug`).
pub fn parse_dir_name(name: &str) -> Result<DirName> {
    if let Some(caps) = dir_re().captures(name) {
        let id = parse_id(&format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))?;
        return Ok(DirName {
            id,
            slug: caps[4].to_string(),
        });
    }
    if let Some(caps) = legacy_dir_re().captures(name) {
        let id = parse_id(&format!("{}-{}", &caps[1], &caps[2]))?;
        return Ok(DirName {
            id,
            slug: caps[3].to_string(),
        });
    }
    Err(BoardError::InvalidName(name.to_string()))
}

pub fn dir_name(id: &str, slug: &str) -> String {
    format!("{id}_{slug}")
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Base-36 encode with alphabet `0-9a-z`. Zero encodes as `"0"`.
pub fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Six-character suffix derived from a seed: SHA-256, first eight bytes
/// big-endian, base-36, left-padded with `0` and cut to six characters.
pub fn suffix_from_seed(seed: &[u8]) -> String {
    let digest = Sha256::digest(seed);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let encoded = base36(u64::from_be_bytes(head));
    let padded = format!("{encoded:0>width$}", width = SUFFIX_LEN);
    padded[..SUFFIX_LEN].to_string()
}

pub fn random_suffix() -> String {
    let mut seed = [0u8; 16];
    OsRng.fill_bytes(&mut seed);
    suffix_from_seed(&seed)
}

pub fn id_for_date(item_type: ItemType, date: NaiveDate, suffix: &str) -> String {
    format!("{}-{}-{}", item_type.prefix(), date.format("%y%m%d"), suffix)
}

/// Fresh ID dated today in local time.
pub fn generate_id(item_type: ItemType) -> String {
    id_for_date(item_type, Local::now().date_naive(), &random_suffix())
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Turn free text into a directory slug: lower-case, spaces and underscores
/// become hyphens, everything outside `[a-z0-9-]` is dropped, hyphen runs
/// collapse and leading/trailing hyphens are trimmed.
pub fn sanitize_slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.to_lowercase().chars() {
        let c = if c == ' ' || c == '_' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_basics() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(u64::MAX), "3w5e11264sgsf");
    }

    #[test]
    fn suffix_is_six_base36_chars() {
        for seed in [&b""[..], b"a", b"0123456789abcdef"] {
            let s = suffix_from_seed(seed);
            assert_eq!(s.len(), 6);
            assert!(s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
        assert_eq!(suffix_from_seed(b"seed"), suffix_from_seed(b"seed"));
    }

    #[test]
    fn generated_ids_parse_back() {
        for &t in ItemType::all() {
            let id = generate_id(t);
            let parsed = parse_id(&id).unwrap();
            assert_eq!(parsed.item_type, t);
            assert_eq!(parsed.id, id);
            assert!(!parsed.legacy);
        }
    }

    #[test]
    fn id_for_date_uses_yymmdd() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap();
        assert_eq!(
            id_for_date(ItemType::Story, date, "abc123"),
            "STORY-260118-abc123"
        );
    }

    #[test]
    fn parse_id_is_case_insensitive_and_canonicalizes() {
        let parsed = parse_id("task-260101-ABC123").unwrap();
        assert_eq!(parsed.id, "TASK-260101-abc123");
        assert_eq!(parsed.item_type, ItemType::Task);
    }

    #[test]
    fn parse_id_accepts_legacy() {
        let parsed = parse_id("bug-12").unwrap();
        assert_eq!(parsed.id, "BUG-12");
        assert!(parsed.legacy);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        for s in ["", "TASK", "FEATURE-260101-abc123", "TASK-2601-abc123", "TASK-260101-abc"] {
            assert!(parse_id(s).is_err(), "expected invalid: {s}");
        }
    }

    #[test]
    fn dir_names() {
        let d = parse_dir_name("EPIC-260101-abc123_user-auth").unwrap();
        assert_eq!(d.id.id, "EPIC-260101-abc123");
        assert_eq!(d.slug, "user-auth");
        assert_eq!(dir_name(&d.id.id, &d.slug), "EPIC-260101-abc123_user-auth");

        let legacy = parse_dir_name("TASK-7_cleanup").unwrap();
        assert_eq!(legacy.id.id, "TASK-7");
        assert!(legacy.id.legacy);

        for bad in ["notes", "EPIC-260101-abc123", "EPIC-260101-abc123_Bad_Slug", "epic-1_x"] {
            assert!(
                matches!(parse_dir_name(bad), Err(BoardError::InvalidName(_))),
                "expected invalid: {bad}"
            );
        }
    }

    #[test]
    fn sanitize_examples() {
        assert_eq!(sanitize_slug("Fix Login Bug"), "fix-login-bug");
        assert_eq!(sanitize_slug("snake_case_name"), "snake-case-name");
        assert_eq!(sanitize_slug("--weird!!  name--"), "weird-name");
        assert_eq!(sanitize_slug("Ünïcode ok"), "ncode-ok");
        assert_eq!(sanitize_slug("***"), "");
    }

    #[test]
    fn canonical_id_normalizes_case() {
        assert_eq!(canonical_id("story-260101-ABCDEF"), "STORY-260101-abcdef");
        assert_eq!(canonical_id(" Task-3 "), "TASK-3");
    }
}
