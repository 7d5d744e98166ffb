use std::{
    env,
    fs,
    path::{Path, PathBuf},
    process::{self, Command, ExitStatus},
};

use crate::error::ConfigError;

const CONFIG_DIR: &str = ".config/followback";
const CONFIG_FILENAME: &str = "config.toml";

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "FOLLOWBACK_CONFIG";

pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(CONFIG_DIR))
}

pub fn get_config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join(CONFIG_FILENAME))
}

pub fn open_editor(file: &Path) -> Result<ExitStatus, ConfigError> {
    let editor = env::var("EDITOR")
        .or_else(|_| env::var("VISUAL"))
        .unwrap_or_else(|_| "vi".to_string());

    Command::new(&editor)
        .arg(file)
        .status()
        .map_err(|e| ConfigError::EditorFailed { editor, source: e })
}

pub fn check_permissions(path: &Path, is_dir: bool) {
    if let Ok(metadata) = fs::metadata(path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode() & 0o777;

            let expected = if is_dir { 0o700 } else { 0o600 };

            if mode != expected {
                println!(
                    "⚠️  Permissions for {:?} are {:o}, expected {:o}",
                    path, mode, expected
                );
                println!("Run chmod {:o} {:?}", expected, path)
            }
        }

        #[cfg(not(unix))]
        {
            let _ = (metadata, is_dir);
        }
    }
}

pub fn gracefully_exit(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1)
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_config_file_under_home() {
        let home = env::temp_dir().join("followback-tests").join("home");
        unsafe {
            env::remove_var(CONFIG_ENV);
            env::set_var("HOME", &home);
        }
        let file = get_config_file().unwrap();
        assert_eq!(file, home.join(".config/followback/config.toml"));
    }

    #[test]
    #[serial]
    fn test_config_file_env_override() {
        unsafe {
            env::set_var(CONFIG_ENV, "/tmp/elsewhere.toml");
        }
        let file = get_config_file().unwrap();
        unsafe {
            env::remove_var(CONFIG_ENV);
        }
        assert_eq!(file, PathBuf::from("/tmp/elsewhere.toml"));
    }
}
