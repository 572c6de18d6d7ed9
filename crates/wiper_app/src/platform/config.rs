use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use engine_logging::engine_info;
use serde::{Deserialize, Serialize};
use wiper_core::SelectorTable;
use wiper_engine::{LaunchSettings, LoginWait, SettlePolicy, DEFAULT_START_URL};

/// Everything that is configurable without recompiling. Every field falls back
/// to its default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_url: String,
    pub login_timeout_secs: u64,
    pub login_poll_millis: u64,
    pub headless: bool,
    pub block_images: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub settle: SettlePolicy,
    pub selectors: SelectorTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        let launch = LaunchSettings::default();
        let login = LoginWait::default();
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            login_timeout_secs: login.timeout.as_secs(),
            login_poll_millis: login.poll_interval.as_millis() as u64,
            headless: launch.headless,
            block_images: launch.block_images,
            window_width: launch.window_width,
            window_height: launch.window_height,
            settle: SettlePolicy::default(),
            selectors: SelectorTable::default(),
        }
    }
}

impl AppConfig {
    pub fn launch_settings(&self) -> LaunchSettings {
        LaunchSettings {
            headless: self.headless,
            window_width: self.window_width,
            window_height: self.window_height,
            block_images: self.block_images,
            start_url: self.start_url.clone(),
        }
    }

    pub fn login_wait(&self) -> LoginWait {
        LoginWait {
            timeout: Duration::from_secs(self.login_timeout_secs),
            poll_interval: Duration::from_millis(self.login_poll_millis.max(1)),
        }
    }
}

/// Load the config file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    engine_info!("Loaded config from {:?}", path);
    Ok(config)
}

pub fn parse_config(content: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = ron::from_str(content)?;
    config.selectors.validate()?;
    Ok(config)
}

pub fn dump_config(config: &AppConfig) -> anyhow::Result<String> {
    let pretty = ron::ser::PrettyConfig::new();
    Ok(ron::ser::to_string_pretty(config, pretty)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use wiper_core::{Matcher, SemanticTarget};

    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn dumped_config_loads_back_unchanged() {
        let dumped = dump_config(&AppConfig::default()).unwrap();
        assert_eq!(parse_config(&dumped).unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(
                headless: true,
                settle: (inter_message: 2500),
                selectors: (chains: {{ confirm_delete: [Css("button.danger")] }}),
            )"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(config.headless);
        assert_eq!(config.settle.inter_message, Duration::from_millis(2500));
        assert_eq!(config.settle.reveal, SettlePolicy::default().reveal);
        assert_eq!(
            config.selectors.chain(SemanticTarget::ConfirmDelete),
            &[Matcher::css("button.danger")]
        );
        assert_eq!(
            config.selectors.chain(SemanticTarget::Message),
            SelectorTable::default().chain(SemanticTarget::Message)
        );
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = parse_config("(selectors: (chains: { message: [] }))").unwrap_err();
        assert!(err.to_string().contains("message"));
    }
}
