use serde::{Deserialize, Serialize};
use url::Url;

use crate::StrategyKind;

/// Parameter bundle handed over by the shell. The core never prompts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunParams {
    pub mode: StrategyKind,
    /// Channel to open before a scan. `None` keeps whatever page is showing.
    pub target: Option<String>,
    /// Server to open before searching.
    pub server: Option<String>,
    /// Author the search query is scoped to.
    pub author: Option<String>,
    /// Zero means unbounded.
    pub limit: u32,
    pub auto_confirm: bool,
    /// Zero means a failing message is retried for the whole run.
    pub max_attempts: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("invalid {field} url {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("{field} url must use http or https: {value:?}")]
    UnsupportedScheme { field: &'static str, value: String },
    #[error("search mode requires an author")]
    MissingAuthor,
    #[error("search mode requires a server url")]
    MissingServer,
}

/// Discovery inputs once the bundle has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedDiscovery {
    Scan { channel: Option<Url> },
    Search { server: Url, author: String },
}

impl RunParams {
    pub fn limit(&self) -> Option<u32> {
        (self.limit > 0).then_some(self.limit)
    }

    pub fn validate(&self) -> Result<ValidatedDiscovery, ParamsError> {
        match self.mode {
            StrategyKind::Scan => {
                let channel = non_blank(self.target.as_deref())
                    .map(|raw| parse_web_url("channel", raw))
                    .transpose()?;
                Ok(ValidatedDiscovery::Scan { channel })
            }
            StrategyKind::Search => {
                let author = non_blank(self.author.as_deref())
                    .ok_or(ParamsError::MissingAuthor)?
                    .to_string();
                let server = non_blank(self.server.as_deref())
                    .ok_or(ParamsError::MissingServer)
                    .and_then(|raw| parse_web_url("server", raw))?;
                Ok(ValidatedDiscovery::Search { server, author })
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_web_url(field: &'static str, raw: &str) -> Result<Url, ParamsError> {
    let url = Url::parse(raw).map_err(|err| ParamsError::InvalidUrl {
        field,
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ParamsError::UnsupportedScheme {
            field,
            value: raw.to_string(),
        }),
    }
}
