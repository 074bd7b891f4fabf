use clap::Subcommand;
use focusflow_core::{Config, ConfigError};
use serde_json::Value;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value (e.g. "timer.default_duration_min", "records.mode")
    Get {
        /// Dot-separated key
        key: String,
    },
    /// Change one value and save
    Set {
        /// Dot-separated key
        key: String,
        /// New value, parsed as the key's type
        value: String,
    },
    /// Print every key as `section.key = value`
    List {
        /// Print the whole config as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
    /// Overwrite the config file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in flatten(&config)? {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            let path = Config::path()?;
            Config::default().save_to(&path)?;
            println!("defaults written to {}", path.display());
        }
    }
    Ok(())
}

/// Dot-path keys and display values for every leaf of the config.
fn flatten(config: &Config) -> Result<Vec<(String, String)>, serde_json::Error> {
    let mut out = Vec::new();
    collect("", &serde_json::to_value(config)?, &mut out);
    Ok(out)
}

fn collect(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                collect(&key, child, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_lists_every_section() {
        let pairs = flatten(&Config::default()).unwrap();
        let has = |k: &str, v: &str| pairs.iter().any(|(key, val)| key == k && val == v);
        assert!(has("timer.default_duration_min", "25"));
        assert!(has("timer.paused_resize", "rebase"));
        assert!(has("records.mode", "leaderboard"));
        assert!(has("notifications.enabled", "true"));
    }

    #[test]
    fn flattened_keys_resolve_through_get() {
        let config = Config::default();
        for (key, value) in flatten(&config).unwrap() {
            assert_eq!(config.get(&key).as_deref(), Some(value.as_str()), "key = {key}");
        }
    }
}
