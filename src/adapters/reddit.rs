use crate::config::settings::RedditSettings;
use crate::core::CommentSource;
use crate::domain::model::RedditComment;
use crate::utils::error::{Result, TrackerError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

fn comment_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/comments/[^/]+/[^/]+/([a-z0-9]+)").expect("static regex"))
}

fn post_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/comments/([a-z0-9]+)").expect("static regex"))
}

/// `https://www.reddit.com/r/x/comments/{post}/{slug}/{comment}/` → `{comment}`
pub fn extract_comment_id(url: &str) -> Option<String> {
    comment_id_re()
        .captures(url)
        .map(|caps| caps[1].to_string())
}

pub fn extract_post_id(url: &str) -> Option<String> {
    post_id_re().captures(url).map(|caps| caps[1].to_string())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Read-only Reddit client.
///
/// With credentials it authenticates through the application-only OAuth flow and
/// talks to `oauth.reddit.com`; without them it falls back to the public `.json`
/// endpoints of `www.reddit.com`.
pub struct RedditClient {
    client: Client,
    settings: RedditSettings,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(settings: RedditSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            settings,
            token: Mutex::new(None),
        })
    }

    fn authenticated(&self) -> bool {
        self.settings.has_credentials()
    }

    async fn access_token(&self) -> Result<Option<String>> {
        let (Some(id), Some(secret)) = (&self.settings.client_id, &self.settings.client_secret)
        else {
            return Ok(None);
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(Some(token.value.clone()));
            }
        }

        tracing::debug!("Requesting Reddit access token");
        let response = self
            .client
            .post(&self.settings.auth_url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::RedditApiError {
                status: status.as_u16(),
                message: "access token request rejected".to_string(),
            });
        }

        let token: TokenResponse = response.json().await?;
        // 提前一分鐘過期，避免邊界情況
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60).max(1));
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(Some(value))
    }

    fn thread_url(&self, post_id: &str, focus: Option<&str>) -> String {
        let base = self.settings.effective_api_base();
        let suffix = if self.authenticated() { "" } else { ".json" };
        match focus {
            Some(comment_id) => format!("{}/comments/{}/_/{}{}", base, post_id, comment_id, suffix),
            None => format!("{}/comments/{}{}", base, post_id, suffix),
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.access_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Fetches a post's comment forest in "best" order, optionally focused on one comment.
    pub async fn fetch_thread(
        &self,
        post_id: &str,
        focus: Option<&str>,
    ) -> Result<Vec<RedditComment>> {
        let url = self.thread_url(post_id, focus);
        tracing::debug!("Fetching thread: {}", url);

        let request = self
            .client
            .get(&url)
            .query(&[("sort", "best"), ("raw_json", "1")]);
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::RedditApiError {
                status: status.as_u16(),
                message: format!("GET {} failed", url),
            });
        }

        let body: Value = response.json().await?;
        parse_thread(&body)
    }
}

/// The thread endpoint returns `[post_listing, comment_listing]`.
pub fn parse_thread(body: &Value) -> Result<Vec<RedditComment>> {
    let listing = body
        .as_array()
        .and_then(|parts| parts.get(1))
        .ok_or_else(|| TrackerError::processing("unexpected thread response shape"))?;
    Ok(parse_listing(listing))
}

/// Collects `t1` children in order; `more` placeholders are skipped.
pub fn parse_listing(listing: &Value) -> Vec<RedditComment> {
    listing
        .pointer("/data/children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
                .filter_map(|child| child.get("data").map(parse_comment))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_comment(data: &Value) -> RedditComment {
    let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

    // replies 沒有回覆時是空字串
    let replies = match data.get("replies") {
        Some(listing @ Value::Object(_)) => parse_listing(listing),
        _ => Vec::new(),
    };

    RedditComment {
        id: text("id").unwrap_or_default(),
        parent_id: text("parent_id").unwrap_or_default(),
        author: text("author"),
        body: text("body").unwrap_or_default(),
        score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
        created_utc: data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0),
        replies,
    }
}

#[async_trait]
impl CommentSource for RedditClient {
    async fn fetch_comment(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<RedditComment>> {
        let comments = self.fetch_thread(post_id, Some(comment_id)).await?;
        Ok(comments.into_iter().find(|c| c.id == comment_id))
    }

    async fn fetch_top_level(&self, post_id: &str) -> Result<Vec<RedditComment>> {
        self.fetch_thread(post_id, None).await
    }

    async fn fetch_replies(&self, post_id: &str, parent_id: &str) -> Result<Vec<RedditComment>> {
        let parent = self.fetch_comment(post_id, parent_id).await?;
        Ok(parent.map(|p| p.replies).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const URL: &str = "https://www.reddit.com/r/rust/comments/abc123/some_title/def456/";

    fn comment_json(id: &str, parent: &str, created: f64, replies: Value) -> Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "parent_id": parent,
                "author": "someone",
                "body": "hello",
                "score": 10,
                "created_utc": created,
                "replies": replies
            }
        })
    }

    fn listing(children: Vec<Value>) -> Value {
        json!({"kind": "Listing", "data": {"children": children}})
    }

    fn settings_for(server: &MockServer) -> RedditSettings {
        RedditSettings {
            api_base: Some(server.base_url()),
            auth_url: server.url("/api/v1/access_token"),
            ..RedditSettings::default()
        }
    }

    #[test]
    fn test_extract_ids_from_url() {
        assert_eq!(extract_comment_id(URL).as_deref(), Some("def456"));
        assert_eq!(extract_post_id(URL).as_deref(), Some("abc123"));

        let post_only = "https://www.reddit.com/r/rust/comments/abc123/some_title/";
        assert_eq!(extract_comment_id(post_only), None);
        assert_eq!(extract_post_id("https://example.com/nothing"), None);
    }

    #[test]
    fn test_parse_listing_skips_more_and_nests_replies() {
        let nested = listing(vec![comment_json("c2", "t1_c1", 2.0, json!(""))]);
        let body = json!([
            listing(vec![]),
            listing(vec![
                comment_json("c1", "t3_abc", 1.0, nested),
                json!({"kind": "more", "data": {"children": ["x", "y"]}}),
                comment_json("c3", "t3_abc", 3.0, json!("")),
            ])
        ]);

        let comments = parse_thread(&body).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].replies.len(), 1);
        assert_eq!(comments[0].replies[0].parent_comment_id(), Some("c1"));
        assert_eq!(comments[1].id, "c3");
        assert!(comments[1].replies.is_empty());
    }

    #[test]
    fn test_parse_thread_rejects_unexpected_shape() {
        assert!(parse_thread(&json!({"error": 404})).is_err());
    }

    #[tokio::test]
    async fn test_anonymous_fetch_uses_json_endpoint() {
        let server = MockServer::start();
        let body = json!([
            listing(vec![]),
            listing(vec![comment_json("def456", "t3_abc123", 5.0, json!(""))])
        ]);

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/comments/abc123/_/def456.json")
                .query_param("sort", "best");
            then.status(200).json_body(body);
        });

        let client = RedditClient::new(settings_for(&server)).unwrap();
        let comment = client.fetch_comment("abc123", "def456").await.unwrap();

        mock.assert();
        assert_eq!(comment.unwrap().id, "def456");
    }

    #[tokio::test]
    async fn test_oauth_token_is_requested_once_and_reused() {
        let server = MockServer::start();

        let token_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/access_token")
                .body_contains("grant_type=client_credentials");
            then.status(200)
                .json_body(json!({"access_token": "tok", "expires_in": 3600}));
        });

        let thread_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/comments/abc123")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(json!([listing(vec![]), listing(vec![])]));
        });

        let mut settings = settings_for(&server);
        settings.client_id = Some("id".to_string());
        settings.client_secret = Some("secret".to_string());
        let client = RedditClient::new(settings).unwrap();

        assert!(client.fetch_top_level("abc123").await.unwrap().is_empty());
        assert!(client.fetch_top_level("abc123").await.unwrap().is_empty());

        token_mock.assert_hits(1);
        thread_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/comments/abc123.json");
            then.status(429);
        });

        let client = RedditClient::new(settings_for(&server)).unwrap();
        let err = client.fetch_top_level("abc123").await.unwrap_err();
        assert!(matches!(err, TrackerError::RedditApiError { status: 429, .. }));
    }
}
