use crate::error::Result;
use crate::paths;
use crate::render::{Layout, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DOT_BINARY: &str = "dot";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

/// Optional `config.yaml` at the board root. Every field has a default, so a
/// missing file and an empty file mean the same thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Graphviz executable, bare name or path. `dot` on PATH when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_binary: Option<String>,
    #[serde(default)]
    pub default_format: OutputFormat,
    #[serde(default)]
    pub default_layout: Layout,
    #[serde(default = "default_plan_file")]
    pub plan_file: String,
    /// Where rendered graphs go. The scope directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_plan_file() -> String {
    "plan.md".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            dot_binary: None,
            default_format: OutputFormat::default(),
            default_layout: Layout::default(),
            plan_file: default_plan_file(),
            output_dir: None,
        }
    }
}

impl BoardConfig {
    pub fn load(board: &Path) -> Result<Self> {
        let path = paths::config_path(board);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: BoardConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, board: &Path) -> Result<()> {
        let path = paths::config_path(board);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn dot_binary(&self) -> &str {
        self.dot_binary.as_deref().unwrap_or(DEFAULT_DOT_BINARY)
    }

    /// Directory for rendered output, relative paths taken from the board root.
    pub fn output_dir_for(&self, board: &Path, scope_dir: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => board.join(dir),
            None => scope_dir.to_path_buf(),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Some(bin) = &self.dot_binary {
            if which::which(bin).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("dot_binary '{bin}' not found; rendering will fail"),
                });
            }
        }

        let plan_file = self.plan_file.trim();
        if plan_file.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "plan_file is empty".to_string(),
            });
        } else if plan_file.contains('/') || plan_file.contains('\\') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("plan_file '{plan_file}' must be a file name, not a path"),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
