//! Show or update the saved configuration

use crate::config::{self, Config, Settings};
use anyhow::Result;
use console::style;

/// Changes to persist; all `None` means show only
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub backend_url: Option<String>,
    pub feed_capacity: Option<usize>,
    pub unbounded: bool,
}

/// `backend_url` is the `--backend-url` flag or `BACKEND_URL`; it is shown,
/// never saved.
pub async fn run(update: ConfigUpdate, backend_url: Option<String>) -> Result<()> {
    let mut file = Config::load()?;

    if apply(&mut file, update)? {
        file.save()?;
        println!("{} {}", style("Saved").green(), config::config_file().display());
        println!();
    }

    let overridden = backend_url.is_some();
    let settings = effective_settings(&file, backend_url)?;

    let source = if overridden { "(flag or env)" } else { "(config file or default)" };
    println!(
        "{:<18} {} {}",
        style("Backend").dim(),
        style(&settings.backend_url).cyan(),
        style(source).dim()
    );
    println!("{:<18} {}", style("Live stream").dim(), settings.socket_url());
    println!(
        "{:<18} {}",
        style("Feed capacity").dim(),
        settings
            .feed_capacity
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "{:<18} {}s",
        style("Snapshot timeout").dim(),
        settings.snapshot_timeout.as_secs()
    );
    println!(
        "{:<18} {}s",
        style("Reconnect max").dim(),
        settings.reconnect_max.as_secs()
    );
    println!("{:<18} {}", style("Config file").dim(), config::config_file().display());
    println!("{:<18} {}", style("TUI log").dim(), config::log_file().display());

    Ok(())
}

/// Settings this run would use
fn effective_settings(file: &Config, backend_url: Option<String>) -> Result<Settings> {
    file.resolve(backend_url, None)
}

/// Apply `update` to `file`, returning whether anything changed
fn apply(file: &mut Config, update: ConfigUpdate) -> Result<bool> {
    let mut changed = false;

    if let Some(url) = update.backend_url {
        // Validate before persisting
        file.resolve(Some(url.clone()), None)?;
        file.backend_url = Some(url.trim().trim_end_matches('/').to_string());
        changed = true;
    }

    if update.unbounded {
        file.feed_capacity = None;
        changed = true;
    } else if let Some(capacity) = update.feed_capacity {
        file.feed_capacity = Some(capacity.max(1));
        changed = true;
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut file = Config::default();
        assert!(!apply(&mut file, ConfigUpdate::default()).unwrap());
        assert_eq!(file, Config::default());
    }

    #[test]
    fn test_backend_url_is_normalized() {
        let mut file = Config::default();
        let update = ConfigUpdate {
            backend_url: Some(" http://10.0.0.5:5000/ ".to_string()),
            ..Default::default()
        };

        assert!(apply(&mut file, update).unwrap());
        assert_eq!(file.backend_url.as_deref(), Some("http://10.0.0.5:5000"));
    }

    #[test]
    fn test_invalid_backend_url_is_rejected() {
        let mut file = Config::default();
        let update = ConfigUpdate {
            backend_url: Some("ftp://nope".to_string()),
            ..Default::default()
        };

        assert!(apply(&mut file, update).is_err());
        assert_eq!(file.backend_url, None);
    }

    #[test]
    fn test_shown_backend_honours_override() {
        let file = Config {
            backend_url: Some("http://file:5000".to_string()),
            ..Default::default()
        };

        let saved = effective_settings(&file, None).unwrap();
        assert_eq!(saved.backend_url, "http://file:5000");

        let overridden = effective_settings(&file, Some("http://x:7000/".to_string())).unwrap();
        assert_eq!(overridden.backend_url, "http://x:7000");
        assert_eq!(
            overridden.socket_url(),
            "ws://x:7000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_capacity_set_and_cleared() {
        let mut file = Config::default();
        apply(
            &mut file,
            ConfigUpdate {
                feed_capacity: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(file.feed_capacity, Some(1));

        apply(
            &mut file,
            ConfigUpdate {
                unbounded: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(file.feed_capacity, None);
    }
}
