//! Profile file discovery and loading
//!
//! Profiles start from the built-in defaults of [`hookflow_core::ProfileRegistry`];
//! a KDL profile file, when one is found, overrides them per resource kind.

pub mod error;
pub mod parser;

pub use error::*;
pub use parser::{apply_profiles, parse_profiles};

use hookflow_core::ProfileRegistry;
use std::path::{Path, PathBuf};

/// Environment variable naming a profile file directly
pub const CONFIG_PATH_ENV: &str = "HOOKFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 3] = ["hookflow.local.kdl", "hookflow.kdl", ".hookflow.kdl"];

/// hookflowのグローバル設定ディレクトリ (~/.config/hookflow)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hookflow"))
}

/// プロファイルファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 HOOKFLOW_CONFIG_PATH (直接パス指定、存在しなければエラー)
/// 2. カレントディレクトリ: hookflow.local.kdl, hookflow.kdl, .hookflow.kdl
/// 3. ~/.config/hookflow/hookflow.kdl (グローバル設定)
///
/// 見つからなければ `Ok(None)`、組み込みのデフォルトが使われる。
pub fn find_profile_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::NotFound(path));
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. グローバル設定ファイル
    if let Some(dir) = config_dir() {
        let global_config = dir.join("hookflow.kdl");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Load the profile registry
///
/// An explicit path must exist. Without one, [`find_profile_file`] decides,
/// and the defaults are returned when nothing is found.
pub fn load_registry(explicit: Option<&Path>) -> Result<ProfileRegistry> {
    let path = match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
        None => find_profile_file()?,
    };

    let Some(path) = path else {
        tracing::debug!("No profile file found, using built-in profiles");
        return Ok(ProfileRegistry::defaults());
    };

    tracing::info!(path = %path.display(), "Loading profiles");
    let content = std::fs::read_to_string(&path)?;
    parse_profiles(&content)
}
