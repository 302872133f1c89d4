use crate::domain::model::{RedditComment, TrackingRecord, TrackingResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_source(&self) -> &str;
    /// Explicit output path; a timestamped name is generated when absent.
    fn output_path(&self) -> Option<&str>;
    fn csv_output(&self) -> bool;
    fn parallel(&self) -> bool;
    fn workers(&self) -> usize;
}

/// Read access to Reddit comment threads, always in "best" order.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// The comment itself with its full reply tree, or `None` if Reddit does not return it.
    async fn fetch_comment(&self, post_id: &str, comment_id: &str)
        -> Result<Option<RedditComment>>;

    /// Top-level comments of a post.
    async fn fetch_top_level(&self, post_id: &str) -> Result<Vec<RedditComment>>;

    /// Direct replies of a comment.
    async fn fetch_replies(&self, post_id: &str, parent_id: &str) -> Result<Vec<RedditComment>>;
}

/// Persistence of the last observed rank and reply per comment URL.
pub trait TrackingStore: Send + Sync {
    fn get_last_known_data(&self, comment_url: &str) -> Result<Option<TrackingRecord>>;

    fn get_previous_rank(&self, comment_url: &str) -> Result<Option<String>> {
        Ok(self
            .get_last_known_data(comment_url)?
            .and_then(|record| record.last_known_rank))
    }

    /// Upserts the row; a `None` reply timestamp keeps the stored one.
    fn update_tracking_data(
        &self,
        comment_url: &str,
        current_rank: &str,
        reply_timestamp: Option<&str>,
    ) -> Result<()>;

    fn has_rank_changed(&self, comment_url: &str, current_rank: &str) -> Result<bool> {
        Ok(match self.get_last_known_data(comment_url)? {
            Some(record) => record.last_known_rank.as_deref() != Some(current_rank),
            None => false,
        })
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, comment_urls: Vec<String>) -> Result<Vec<TrackingResult>>;
    async fn load(&self, results: &[TrackingResult]) -> Result<String>;
}
