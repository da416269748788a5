use anyhow::{Context, Result};
use fsfacade_platform::{
    with_allow_creation_of_directory_structure, with_allow_overwrite, with_content_operation,
    with_directory_structure_mode, with_mode, Argument, ContentOperation, Mode,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default arguments for the command-line tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeConfig {
    /// Mode for newly created files
    #[serde(default = "default_file_mode")]
    pub file_mode: Mode,

    /// Mode for directories created with `mkdir`
    #[serde(default = "default_directory_mode")]
    pub directory_mode: Mode,

    /// Mode for missing parent directories
    #[serde(default = "default_directory_mode")]
    pub directory_structure_mode: Mode,

    #[serde(default)]
    pub allow_overwrite: bool,

    #[serde(default)]
    pub allow_creation_of_directory_structure: bool,

    /// Content operation for writes (1 = append, 2 = overwrite)
    #[serde(default)]
    pub content_operation: ContentOperation,
}

fn default_file_mode() -> Mode {
    Mode::ALL_READ_WRITE
}
fn default_directory_mode() -> Mode {
    Mode::ALL_READ_WRITE_EXECUTE
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            file_mode: default_file_mode(),
            directory_mode: default_directory_mode(),
            directory_structure_mode: default_directory_mode(),
            allow_overwrite: false,
            allow_creation_of_directory_structure: false,
            content_operation: ContentOperation::APPEND,
        }
    }
}

impl FacadeConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "fsfacade", "fsfacade") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("fsfacade-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load config, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Arguments for `create_file`; callers append overrides after these
    pub fn file_arguments(&self) -> Vec<Argument> {
        vec![
            with_mode(self.file_mode),
            with_directory_structure_mode(self.directory_structure_mode),
            with_allow_overwrite(self.allow_overwrite),
            with_allow_creation_of_directory_structure(self.allow_creation_of_directory_structure),
        ]
    }

    /// Arguments for `create_directory`
    pub fn directory_arguments(&self) -> Vec<Argument> {
        vec![
            with_mode(self.directory_mode),
            with_directory_structure_mode(self.directory_structure_mode),
            with_allow_creation_of_directory_structure(self.allow_creation_of_directory_structure),
        ]
    }

    /// Arguments for `write_content_to` / `stream_content_to`
    pub fn write_arguments(&self) -> Vec<Argument> {
        vec![with_content_operation(self.content_operation)]
    }
}
