use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub words: WordsConfig,
    pub mail: MailConfig,
    /// Request timeout in seconds, shared by outbound HTTP calls
    pub timeout: u64,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    #[serde(default)]
    pub quiet: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WordsConfig {
    #[serde(default)]
    pub api_key: String,
    pub api_url: String,
    pub api_host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    pub mailbox: String,
}

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_WORDS_API_URL: &str = "https://wordsapiv1.p.rapidapi.com/words/";
pub const DEFAULT_WORDS_API_HOST: &str = "wordsapiv1.p.rapidapi.com";
pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_MAILBOX: &str = "Inbox";

impl AppConfig {
    // Load config from defaults, then file (if exists), then environment variables
    pub fn new() -> Result<Self, ConfigError> {
        Self::configure_defaults()?
            .add_source(File::with_name("config").required(false))
            // e.g. APP_WORDS__API_KEY=... APP_MAIL__TOKEN=...
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    // Load config from a specific file path
    pub fn new_from_file(path: &str) -> Result<Self, ConfigError> {
        Self::configure_defaults()?
            .add_source(File::with_name(path).required(true))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn configure_defaults()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("timeout", DEFAULT_TIMEOUT_SECONDS as i64)?
            .set_default("words.api_url", DEFAULT_WORDS_API_URL)?
            .set_default("words.api_host", DEFAULT_WORDS_API_HOST)?
            .set_default("mail.host", DEFAULT_IMAP_HOST)?
            .set_default("mail.port", DEFAULT_IMAP_PORT as i64)?
            .set_default("mail.mailbox", DEFAULT_MAILBOX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load(toml_str: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::configure_defaults()
            .unwrap()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
    }

    #[test]
    fn test_valid_config_deserialization() {
        let toml_str = r#"
            timeout = 5
            log_level = "debug"

            [words]
            api_key = "rapid-key"

            [mail]
            host = "imap.example.com"
            port = 1993
            email = "me@example.com"
            token = "app-token"
            mailbox = "INBOX"
        "#;

        let config = load(toml_str).unwrap();

        assert_eq!(config.timeout, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.words.api_key, "rapid-key");
        assert_eq!(config.words.api_url, DEFAULT_WORDS_API_URL);
        assert_eq!(config.mail.host, "imap.example.com");
        assert_eq!(config.mail.port, 1993);
        assert_eq!(config.mail.email, "me@example.com");
        assert_eq!(config.mail.token, "app-token");
        assert_eq!(config.mail.mailbox, "INBOX");
    }

    #[test]
    fn test_default_values() {
        let config = load("").unwrap();

        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.words.api_host, DEFAULT_WORDS_API_HOST);
        assert_eq!(config.mail.host, DEFAULT_IMAP_HOST);
        assert_eq!(config.mail.port, DEFAULT_IMAP_PORT);
        assert_eq!(config.mail.mailbox, DEFAULT_MAILBOX);
        assert!(!config.quiet);
    }

    #[test]
    fn test_missing_credentials_are_empty() {
        // The upstream services reject these, not the config loader
        let config = load("[mail]\nemail = \"me@example.com\"").unwrap();

        assert!(config.words.api_key.is_empty());
        assert!(config.mail.token.is_empty());
        assert_eq!(config.mail.email, "me@example.com");
    }

    #[test]
    fn test_invalid_config_type() {
        let toml_str = r#"
            [mail]
            port = "not-a-port"
        "#;

        assert!(load(toml_str).is_err());
    }
}
