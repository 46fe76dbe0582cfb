//! Configuration loading and root folder resolution
//!
//! The service resolves its settings in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use std::path::PathBuf;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 5280;

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "gametracker.db";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder holding the database file
    pub root_folder: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// RAWG API key for cover-art lookups (cover endpoint fails without it)
    pub rawg_api_key: Option<String>,
}

impl Config {
    /// Resolve configuration from CLI arguments, environment, and config file
    pub fn resolve(cli_root: Option<&str>, cli_port: Option<u16>) -> Result<Self> {
        let file = load_config_file().ok().and_then(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            toml::from_str::<toml::Value>(&content).ok()
        });

        let root_folder = resolve_root_folder(cli_root, file.as_ref());

        let port = cli_port
            .or_else(|| {
                std::env::var("GAMETRACKER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .or_else(|| {
                file.as_ref()
                    .and_then(|c| c.get("port"))
                    .and_then(|v| v.as_integer())
                    .and_then(|v| u16::try_from(v).ok())
            })
            .unwrap_or(DEFAULT_PORT);

        let rawg_api_key = std::env::var("RAWG_API_KEY").ok().or_else(|| {
            file.as_ref()
                .and_then(|c| c.get("rawg_api_key"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

        Ok(Self {
            root_folder,
            port,
            rawg_api_key,
        })
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_root_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }
}

/// Root folder resolution following the 4-tier priority order
fn resolve_root_folder(cli_arg: Option<&str>, file: Option<&toml::Value>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("GAMETRACKER_ROOT") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(root) = file
        .and_then(|c| c.get("root_folder"))
        .and_then(|v| v.as_str())
    {
        return PathBuf::from(root);
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("gametracker").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/gametracker/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Platform default: data directory, falling back to the current directory
fn get_default_root_folder() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("gametracker"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let root = resolve_root_folder(Some("/tmp/gt-cli"), None);
        assert_eq!(root, PathBuf::from("/tmp/gt-cli"));
    }

    #[test]
    fn config_file_value_used_without_cli_or_env() {
        let file: toml::Value = toml::from_str(r#"root_folder = "/tmp/gt-file""#).unwrap();
        // Ignore the env tier when the variable is not set in the test environment
        if std::env::var("GAMETRACKER_ROOT").is_err() {
            let root = resolve_root_folder(None, Some(&file));
            assert_eq!(root, PathBuf::from("/tmp/gt-file"));
        }
    }

    #[test]
    fn database_path_appends_file_name() {
        let config = Config {
            root_folder: PathBuf::from("/tmp/gt"),
            port: DEFAULT_PORT,
            rawg_api_key: None,
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/gt/gametracker.db"));
    }
}
