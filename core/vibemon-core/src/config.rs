//! Environment-based configuration.
//!
//! Every hook invocation is a short-lived process, so configuration is a
//! snapshot: [`Config::from_env`] reads the recognized variables once at
//! startup and the resulting struct is passed by reference to whoever needs
//! it. There is no defaulting beyond `~` expansion and the cache path.
//!
//! Variables are sourced from the process environment, optionally seeded
//! from `~/.claude/.env.local` via [`load_env_file`] (shell-style lines,
//! `export ` prefixes and quotes tolerated, existing variables win).

use std::env;
use std::path::PathBuf;

use fs_err as fs;

const DEFAULT_CACHE_FILE: &str = "statusline-cache.json";

/// Snapshot of the recognized environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the desktop app HTTP server (`VIBEMON_DESKTOP_URL`).
    pub desktop_url: Option<String>,
    /// Base URL of the ESP32 HTTP server (`VIBEMON_ESP32_URL`).
    pub esp32_url: Option<String>,
    /// Serial device path or glob pattern (`VIBEMON_SERIAL_PORT`).
    pub serial_port: Option<String>,
    /// Project metadata cache file (`VIBEMON_CACHE_PATH`, default
    /// `~/.claude/statusline-cache.json`).
    pub cache_path: PathBuf,
    /// Debug logging toggle (`VIBEMON_DEBUG`).
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Lets tests avoid
    /// mutating the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Config {
        let cache_path = get("VIBEMON_CACHE_PATH")
            .map(|raw| PathBuf::from(expand_home(&raw)))
            .unwrap_or_else(default_cache_path);

        Config {
            desktop_url: get("VIBEMON_DESKTOP_URL").filter(|v| !v.is_empty()),
            esp32_url: get("VIBEMON_ESP32_URL").filter(|v| !v.is_empty()),
            serial_port: get("VIBEMON_SERIAL_PORT").filter(|v| !v.is_empty()),
            cache_path,
            debug: get("VIBEMON_DEBUG")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
                .unwrap_or(false),
        }
    }
}

fn default_cache_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".claude").join(DEFAULT_CACHE_FILE),
        None => {
            tracing::warn!("Home directory not found; using relative cache path");
            PathBuf::from(DEFAULT_CACHE_FILE)
        }
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(value: &str) -> String {
    if let Some(rest) = value.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), rest);
        }
    }
    value.to_string()
}

/// Loads `~/.claude/.env.local` into the process environment.
///
/// Only sets variables that are not already present, so the real environment
/// always wins over the file. Missing file is not an error.
pub fn load_env_file() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let path = home.join(".claude").join(".env.local");
    let Ok(content) = fs::read_to_string(&path) else {
        return;
    };
    for (key, value) in parse_env_file(&content) {
        if env::var_os(&key).is_none() {
            env::set_var(&key, &value);
        }
    }
}

/// Parses shell-style `KEY=value` lines.
///
/// Skips blank lines and `#` comments, strips an `export ` prefix, strips
/// surrounding single or double quotes from values, and expands a leading
/// `~` in values.
fn parse_env_file(content: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string();
        let value = if value.starts_with('~') {
            expand_home(&value)
        } else {
            value
        };
        vars.push((key.trim().to_string(), value));
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_from_lookup_reads_all_targets() {
        let config = Config::from_lookup(lookup(&[
            ("VIBEMON_DESKTOP_URL", "http://localhost:3000"),
            ("VIBEMON_ESP32_URL", "http://192.168.1.50"),
            ("VIBEMON_SERIAL_PORT", "/dev/tty.usbserial-*"),
        ]));
        assert_eq!(config.desktop_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.esp32_url.as_deref(), Some("http://192.168.1.50"));
        assert_eq!(config.serial_port.as_deref(), Some("/dev/tty.usbserial-*"));
    }

    #[test]
    fn test_unset_targets_are_none() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.desktop_url.is_none());
        assert!(config.esp32_url.is_none());
        assert!(config.serial_port.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn test_empty_values_treated_as_unset() {
        let config = Config::from_lookup(lookup(&[("VIBEMON_DESKTOP_URL", "")]));
        assert!(config.desktop_url.is_none());
    }

    #[test]
    fn test_debug_toggle_values() {
        for value in ["1", "true", "yes"] {
            let config = Config::from_lookup(lookup(&[("VIBEMON_DEBUG", value)]));
            assert!(config.debug, "expected {value} to enable debug");
        }
        let config = Config::from_lookup(lookup(&[("VIBEMON_DEBUG", "0")]));
        assert!(!config.debug);
    }

    #[test]
    fn test_cache_path_override() {
        let config = Config::from_lookup(lookup(&[("VIBEMON_CACHE_PATH", "/tmp/cache.json")]));
        assert_eq!(config.cache_path, PathBuf::from("/tmp/cache.json"));
    }

    #[test]
    fn test_cache_path_default_ends_with_statusline_cache() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config
            .cache_path
            .to_string_lossy()
            .ends_with("statusline-cache.json"));
    }

    #[test]
    fn test_parse_env_file_skips_comments_and_blanks() {
        let vars = parse_env_file("# comment\n\nFOO=bar\n");
        assert_eq!(vars, vec![("FOO".to_string(), "bar".to_string())]);
    }

    #[test]
    fn test_parse_env_file_strips_export_and_quotes() {
        let vars = parse_env_file("export A=\"one\"\nB='two'\n");
        assert_eq!(
            vars,
            vec![
                ("A".to_string(), "one".to_string()),
                ("B".to_string(), "two".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_env_file_expands_home() {
        let vars = parse_env_file("CACHE=~/cache.json\n");
        assert_eq!(vars.len(), 1);
        assert!(!vars[0].1.starts_with('~') || dirs::home_dir().is_none());
    }

    #[test]
    fn test_parse_env_file_ignores_lines_without_equals() {
        let vars = parse_env_file("not a var\nKEY=value\n");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].0, "KEY");
    }
}
