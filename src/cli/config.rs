use std::fs;

use crate::{
    config::Config,
    error::{ConfigError, Result},
    utils,
};

pub fn edit() -> Result<()> {
    let config_file = utils::get_config_file()?;
    let status = utils::open_editor(&config_file)?;

    if status.success() {
        println!("Config edited successfully.");
    } else {
        eprintln!("Editor exited with non-zero status code.");
    }

    Ok(())
}

pub fn show() -> Result<()> {
    let config_file = utils::get_config_file()?;
    utils::check_permissions(&config_file, false);
    let config = Config::from_file(&config_file)?;

    println!("{config}");
    Ok(())
}

pub fn path() -> Result<()> {
    println!("{}", utils::get_config_file()?.display());
    Ok(())
}

pub fn validate() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    println!("Config is valid.");
    Ok(())
}

pub fn init() -> Result<()> {
    let config_file = utils::get_config_file()?;

    if config_file.exists() {
        println!("Config file already exists: {}", config_file.display());
        return Ok(());
    }

    if let Some(config_dir) = config_file.parent() {
        fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteFailed {
            path: config_dir.to_string_lossy().to_string(),
            source: e,
        })?;
    }

    let serialized_config = toml::to_string(&Config::template())?;

    fs::write(&config_file, serialized_config).map_err(|e| ConfigError::WriteFailed {
        path: config_file.to_string_lossy().to_string(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&config_file, fs::Permissions::from_mode(0o600))?;
    }

    println!("Config file created at: {}", config_file.display());
    println!("Please edit the file and fill in your Twitter API credentials.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_init_writes_loadable_template() {
        let file = env::temp_dir()
            .join("followback-tests")
            .join("init")
            .join("config.toml");
        let _ = fs::remove_file(&file);
        unsafe {
            env::set_var(utils::CONFIG_ENV, &file);
        }

        init().unwrap();
        let loaded = Config::load().unwrap();
        // A second init leaves the file alone.
        init().unwrap();

        unsafe {
            env::remove_var(utils::CONFIG_ENV);
        }
        assert_eq!(loaded.consumer_key, "your_consumer_key");
        assert!(loaded.validate().is_err());
    }
}
