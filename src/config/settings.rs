use crate::domain::model::REPLY_WINDOW_HOURS;
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "CommentTracker/1.0";
pub const DEFAULT_DB_PATH: &str = "comment_tracker.db";
pub const OAUTH_API_BASE: &str = "https://oauth.reddit.com";
pub const PUBLIC_API_BASE: &str = "https://www.reddit.com";
pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Settings shared by the CLI and the web service.
///
/// Resolution order: built-in defaults, then an optional TOML file (with `${VAR}`
/// substitution), then environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    #[serde(default)]
    pub reddit: RedditSettings,
    #[serde(default)]
    pub tracking: TrackingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    /// Overrides the API host; derived from the credentials when unset.
    pub api_base: Option<String>,
    pub auth_url: String,
    pub timeout_seconds: u64,
}

/// The ranking cutoff is fixed at
/// [`TOP_N_COMMENTS`](crate::domain::model::TOP_N_COMMENTS); a `top_n` key is
/// rejected like any other unknown key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingSettings {
    pub db_path: String,
    pub reply_window_hours: i64,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_base: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            reply_window_hours: REPLY_WINDOW_HOURS,
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            reddit: RedditSettings::default(),
            tracking: TrackingSettings::default(),
        }
    }
}

impl RedditSettings {
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    pub fn effective_api_base(&self) -> &str {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/'),
            None if self.has_credentials() => OAUTH_API_BASE,
            None => PUBLIC_API_BASE,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl TrackerSettings {
    /// 讀取設定：檔案（可選）+ 環境變數
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut settings = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |key| std::env::var(key).ok());

        toml::from_str(&processed).map_err(|e| TrackerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Overlays environment variables; `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty("REDDIT_CLIENT_ID") {
            self.reddit.client_id = Some(id);
        }
        if let Some(secret) = non_empty("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = Some(secret);
        }
        if let Some(agent) = non_empty("REDDIT_USER_AGENT") {
            self.reddit.user_agent = agent;
        }
        if let Some(base) = non_empty("REDDIT_API_BASE") {
            self.reddit.api_base = Some(base);
        }
        if let Some(path) = non_empty("TRACKER_DB_PATH") {
            self.tracking.db_path = path;
        }
    }
}

/// 替換 `${VAR_NAME}`，找不到的變數保持原樣
fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex");
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    })
    .into_owned()
}

impl Validate for TrackerSettings {
    fn validate(&self) -> Result<()> {
        if self.reddit.client_id.is_some() {
            validation::validate_required_field(
                "reddit.client_secret",
                &self.reddit.client_secret,
            )?;
        }
        validation::validate_non_empty_string("reddit.user_agent", &self.reddit.user_agent)?;
        validation::validate_url("reddit.api_base", self.reddit.effective_api_base())?;
        validation::validate_url("reddit.auth_url", &self.reddit.auth_url)?;
        validation::validate_range("reddit.timeout_seconds", self.reddit.timeout_seconds, 1, 600)?;
        validation::validate_path("tracking.db_path", &self.tracking.db_path)?;
        validation::validate_range(
            "tracking.reply_window_hours",
            self.tracking.reply_window_hours,
            1,
            24 * 365,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_tracker_constants() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.reddit.user_agent, "CommentTracker/1.0");
        assert_eq!(settings.tracking.db_path, "comment_tracker.db");
        assert_eq!(settings.tracking.reply_window_hours, 72);
        assert_eq!(settings.reddit.effective_api_base(), PUBLIC_API_BASE);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_and_oauth_base() {
        let env: HashMap<&str, &str> = [
            ("REDDIT_CLIENT_ID", "id123"),
            ("REDDIT_CLIENT_SECRET", "secret456"),
            ("REDDIT_USER_AGENT", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = TrackerSettings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(settings.reddit.has_credentials());
        assert_eq!(settings.reddit.effective_api_base(), OAUTH_API_BASE);
        // 空字串不覆蓋預設值
        assert_eq!(settings.reddit.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_toml_with_substitution() {
        let content = r#"
[reddit]
client_id = "${TRACKER_TEST_ID}"
client_secret = "s"
api_base = "http://127.0.0.1:9000/"

[tracking]
db_path = "/tmp/tracker.db"
"#;
        let processed = substitute_env_vars(content, |key| {
            (key == "TRACKER_TEST_ID").then(|| "abc".to_string())
        });
        let settings: TrackerSettings = toml::from_str(&processed).unwrap();

        assert_eq!(settings.reddit.client_id.as_deref(), Some("abc"));
        assert_eq!(settings.reddit.effective_api_base(), "http://127.0.0.1:9000");
        assert_eq!(settings.tracking.db_path, "/tmp/tracker.db");
        assert_eq!(settings.tracking.reply_window_hours, 72);
    }

    #[test]
    fn test_ranking_cutoff_is_not_configurable() {
        let content = r#"
[tracking]
top_n = 10
"#;
        let err = TrackerSettings::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("top_n"));
    }

    #[test]
    fn test_client_id_without_secret_is_rejected() {
        let mut settings = TrackerSettings::default();
        settings.reddit.client_id = Some("id".to_string());
        assert!(matches!(
            settings.validate(),
            Err(TrackerError::MissingConfigError { .. })
        ));
    }
}
