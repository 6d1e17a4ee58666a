use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_URL: &str = "http://localhost:8080/sakai-spml/spmlrouter";
pub const DEFAULT_ITEM_COUNT: usize = 15000;
pub const DEFAULT_DUMP_PATH: &str = "/tmp/batchspml";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 5.01; Windows NT 5.0)";
pub const DEFAULT_REQUEST_ID: &str = "A4DF567HGD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One fixed `addRequest`.
    #[default]
    Single,
    /// `item_count` generated entries inside a `batchRequest`.
    Batch,
}

/// Everything one run needs. Missing fields in a config file keep their
/// defaults, which point at a local Sakai SPML router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub url: String,
    pub verify_tls: bool,
    pub mode: Mode,
    pub item_count: usize,
    /// Batch mode writes the assembled body here before sending.
    pub dump_path: Option<PathBuf>,
    pub user_agent: String,
    pub request_id: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            verify_tls: false,
            mode: Mode::default(),
            item_count: DEFAULT_ITEM_COUNT,
            dump_path: Some(PathBuf::from(DEFAULT_DUMP_PATH)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_id: DEFAULT_REQUEST_ID.to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path)
            .map_err(|err| format!("cannot read config {}: {err}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Config file named by the first argument, or the defaults.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        match args.nth(1) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".to_string(), "text/xml".to_string()),
            ("SOAPAction".to_string(), "\"\"".to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_local_router() {
        let config = RunConfig::default();
        assert_eq!(config.url, "http://localhost:8080/sakai-spml/spmlrouter");
        assert_eq!(config.mode, Mode::Single);
        assert_eq!(config.item_count, 15000);
        assert!(!config.verify_tls);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"url": "https://sakai.example.org/sakai-spml/spmlrouter", "mode": "batch", "item_count": 3}}"#
        )
        .unwrap();

        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.url, "https://sakai.example.org/sakai-spml/spmlrouter");
        assert_eq!(config.mode, Mode::Batch);
        assert_eq!(config.item_count, 3);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.dump_path, Some(PathBuf::from(DEFAULT_DUMP_PATH)));
    }

    #[test]
    fn null_dump_path_disables_sink() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dump_path": null}}"#).unwrap();

        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dump_path, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout": 5}}"#).unwrap();

        assert!(RunConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = RunConfig::from_file("/nonexistent/spml.json").unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn no_argument_means_defaults() {
        let args = vec!["spml-post".to_string()];
        assert_eq!(RunConfig::from_args(args.into_iter()).unwrap(), RunConfig::default());
    }

    #[test]
    fn headers_carry_soap_action() {
        let headers = RunConfig::default().headers();
        assert!(headers.contains(&("Content-Type".to_string(), "text/xml".to_string())));
        assert!(headers.contains(&("SOAPAction".to_string(), "\"\"".to_string())));
    }
}
