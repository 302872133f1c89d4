use crate::adapters::reddit::{extract_comment_id, extract_post_id};
use crate::core::CommentSource;
use crate::domain::model::{RedditComment, ReplyCheck, REPLY_WINDOW_HOURS};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Latest `created_utc` at or after `cutoff` anywhere in the reply tree.
pub fn most_recent_reply(comment: &RedditComment, cutoff: f64) -> Option<f64> {
    comment
        .replies
        .iter()
        .flat_map(|reply| {
            let own = (reply.created_utc >= cutoff).then_some(reply.created_utc);
            own.into_iter().chain(most_recent_reply(reply, cutoff))
        })
        .fold(None, |latest: Option<f64>, t| {
            Some(latest.map_or(t, |l| l.max(t)))
        })
}

fn format_utc(seconds: f64) -> Option<String> {
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
    DateTime::<Utc>::from_timestamp(whole, nanos.min(999_999_999))
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Looks for replies posted within the tracking window.
pub struct ReplyDetector<C: CommentSource + ?Sized> {
    source: Arc<C>,
    window: Duration,
}

impl<C: CommentSource + ?Sized> Clone for ReplyDetector<C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            window: self.window,
        }
    }
}

impl<C: CommentSource + ?Sized> ReplyDetector<C> {
    pub fn new(source: Arc<C>) -> Self {
        Self::with_window_hours(source, REPLY_WINDOW_HOURS)
    }

    pub fn with_window_hours(source: Arc<C>, hours: i64) -> Self {
        Self {
            source,
            window: Duration::hours(hours),
        }
    }

    pub fn window_hours(&self) -> i64 {
        self.window.num_hours()
    }

    pub async fn has_recent_reply(&self, comment_url: &str) -> ReplyCheck {
        self.has_recent_reply_at(comment_url, Utc::now()).await
    }

    pub async fn has_recent_reply_at(&self, comment_url: &str, now: DateTime<Utc>) -> ReplyCheck {
        let (Some(comment_id), Some(post_id)) =
            (extract_comment_id(comment_url), extract_post_id(comment_url))
        else {
            return ReplyCheck::none();
        };

        let comment = match self.source.fetch_comment(&post_id, &comment_id).await {
            Ok(Some(comment)) => comment,
            Ok(None) => return ReplyCheck::none(),
            Err(e) => {
                tracing::warn!("Error fetching replies for {}: {}", comment_url, e);
                return ReplyCheck::none();
            }
        };

        let cutoff = (now - self.window).timestamp() as f64;
        match most_recent_reply(&comment, cutoff).and_then(format_utc) {
            Some(timestamp) => ReplyCheck {
                has_recent_reply: true,
                most_recent_reply: Some(timestamp),
            },
            None => ReplyCheck::none(),
        }
    }
}
