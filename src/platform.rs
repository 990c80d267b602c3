// Hideout platform paths
//
// - Linux:   config `$XDG_CONFIG_HOME/hideout` (~/.config/hideout),
//            data   `$XDG_DATA_HOME/hideout` (~/.local/share/hideout)
// - macOS:   both under `~/Library/Application Support/Hideout`
// - Windows: both under `%APPDATA%/Hideout`

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$var/hideout` when the variable is set, else `~/<fallback...>/hideout`.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("hideout"),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join("hideout"),
    }
}

#[cfg(target_os = "macos")]
fn app_support_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("Hideout")
}

#[cfg(target_os = "windows")]
fn appdata_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"));
    appdata.join("Hideout")
}

/// Returns the directory holding `config.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        appdata_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
}

/// Returns the directory holding the session database.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        appdata_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
}
