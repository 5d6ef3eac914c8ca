//! FleetScale configuration
//!
//! Locates and loads `fleetscale.yml`, and resolves the secrets it binds to
//! environment variables.

pub mod config;
pub mod error;
pub mod secrets;

pub use config::{FleetConfig, PathsConfig, ScaleConfig, default_secret_bindings, expand_home};
pub use error::*;
pub use secrets::Secrets;

use std::path::{Path, PathBuf};

/// Environment variable naming the config file directly
pub const CONFIG_ENV: &str = "FLEETSCALE_CONFIG";

const CONFIG_FILE: &str = "fleetscale.yml";

/// Find the project's `fleetscale.yml`
///
/// Search order:
/// 1. `FLEETSCALE_CONFIG` (direct path)
/// 2. `./fleetscale.yml`
/// 3. `./.fleetscale/fleetscale.yml`
/// 4. `~/.config/fleetscale/fleetscale.yml` (global)
///
/// Returns `None` when no file exists; the built-in defaults apply then.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!("{} points to missing file {}", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    let local = current_dir.join(CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }

    let project = current_dir.join(".fleetscale").join(CONFIG_FILE);
    if project.exists() {
        return Ok(Some(project));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("fleetscale").join(CONFIG_FILE);
        if global.exists() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}

/// Load configuration from `explicit` if given, otherwise from the search path
///
/// An explicit path that does not exist is an error; an unsuccessful search
/// is not.
pub fn load_config(explicit: Option<&Path>) -> Result<(ScaleConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            let config = ScaleConfig::load(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok((ScaleConfig::builtin(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Run `f` inside `dir` with `FLEETSCALE_CONFIG` set to `config_env`
    /// and the global config directory pointed at `global` (or an empty
    /// temporary directory).
    fn in_dir<F: FnOnce()>(dir: &Path, config_env: Option<&Path>, global: Option<&Path>, f: F) {
        let original_dir = std::env::current_dir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let xdg = global.unwrap_or(empty.path());
        std::env::set_current_dir(dir).unwrap();
        temp_env::with_vars(
            [
                (CONFIG_ENV, config_env.map(|p| p.to_str().unwrap())),
                ("XDG_CONFIG_HOME", xdg.to_str()),
            ],
            f,
        );
        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("fleetscale.yml"), "fleet:\n  prefix: here\n").unwrap();

        in_dir(temp_dir.path(), None, None, || {
            let found = find_config_file().unwrap().unwrap();
            assert!(found.ends_with("fleetscale.yml"));

            let (config, path) = load_config(None).unwrap();
            assert_eq!(config.fleet.prefix, "here");
            assert!(path.is_some());
        });
    }

    #[test]
    #[serial]
    fn test_current_dir_wins_over_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".fleetscale");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("fleetscale.yml"), "").unwrap();
        fs::write(temp_dir.path().join("fleetscale.yml"), "").unwrap();

        in_dir(temp_dir.path(), None, None, || {
            let found = find_config_file().unwrap().unwrap();
            assert!(!found.to_string_lossy().contains(".fleetscale/"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".fleetscale");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("fleetscale.yml"), "").unwrap();

        in_dir(temp_dir.path(), None, None, || {
            let found = find_config_file().unwrap().unwrap();
            assert!(found.ends_with(".fleetscale/fleetscale.yml"));
        });
    }

    #[test]
    #[serial]
    fn test_env_var_takes_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.yml");
        fs::write(&custom, "fleet:\n  region: ap-south\n").unwrap();
        fs::write(temp_dir.path().join("fleetscale.yml"), "").unwrap();

        in_dir(temp_dir.path(), Some(&custom), None, || {
            assert_eq!(find_config_file().unwrap(), Some(custom.clone()));
            let (config, _) = load_config(None).unwrap();
            assert_eq!(config.fleet.region, "ap-south");
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_global_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let xdg = tempfile::tempdir().unwrap();
        let global_dir = xdg.path().join("fleetscale");
        fs::create_dir(&global_dir).unwrap();
        fs::write(global_dir.join("fleetscale.yml"), "").unwrap();

        in_dir(temp_dir.path(), None, Some(xdg.path()), || {
            let found = find_config_file().unwrap().unwrap();
            assert_eq!(found, global_dir.join("fleetscale.yml"));
        });
    }

    #[test]
    #[serial]
    fn test_defaults_when_nothing_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        in_dir(temp_dir.path(), None, None, || {
            assert!(find_config_file().unwrap().is_none());
            let (config, path) = load_config(None).unwrap();
            assert!(path.is_none());
            assert_eq!(config, ScaleConfig::builtin());
        });
    }

    #[test]
    #[serial]
    fn test_env_var_to_missing_file_falls_through() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("fleetscale.yml"), "fleet:\n  prefix: local\n").unwrap();
        let missing = temp_dir.path().join("gone.yml");

        in_dir(temp_dir.path(), Some(&missing), None, || {
            let (config, path) = load_config(None).unwrap();
            assert_eq!(config.fleet.prefix, "local");
            assert!(path.unwrap().ends_with("fleetscale.yml"));
        });
    }

    #[test]
    #[serial]
    fn test_explicit_missing_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/fleetscale.yml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
