use serde::{Deserialize, Serialize};
use url::Url;

/// Connection settings for a search engine node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,

    /// Whole-request timeout in seconds, none when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Accept gzip-compressed responses
    #[serde(default)]
    pub compression: bool,

    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "9200".to_string()
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// `scheme://host:port/`
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            timeout_secs: None,
            compression: false,
            insecure_skip_verify: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ClientConfig = serde_json::from_str(r#"{"host": "es.internal"}"#).unwrap();
        assert_eq!(config.host, "es.internal");
        assert_eq!(config.port, "9200");
        assert_eq!(config.scheme, "http");
        assert_eq!(config.timeout_secs, None);
        assert!(!config.compression);
    }

    #[test]
    fn test_base_url() {
        let config = ClientConfig::new("localhost", "9201");
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://localhost:9201/"
        );

        let broken = ClientConfig::new("bad host", "x");
        assert!(broken.base_url().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "elasticlink-config-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"scheme": "https", "host": "search", "port": "443", "timeout_secs": 5, "compression": true}"#,
        )
        .unwrap();

        let config = ClientConfig::load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout_secs, Some(5));
        assert!(config.compression);
        assert_eq!(config.base_url().unwrap().as_str(), "https://search/");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ClientConfig::load("/nonexistent/elasticlink.json").is_err());
    }
}
