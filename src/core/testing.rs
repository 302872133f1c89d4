use crate::core::CommentSource;
use crate::domain::model::RedditComment;
use crate::utils::error::{Result, TrackerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn comment(id: &str, parent: &str, created_utc: f64) -> RedditComment {
    RedditComment {
        id: id.to_string(),
        parent_id: parent.to_string(),
        author: Some(format!("author_{}", id)),
        body: format!("body of {}", id),
        score: 1,
        created_utc,
        replies: Vec::new(),
    }
}

pub(crate) fn with_replies(mut parent: RedditComment, replies: Vec<RedditComment>) -> RedditComment {
    parent.replies = replies;
    parent
}

/// In-memory comment forests keyed by post id.
#[derive(Default)]
pub(crate) struct FakeSource {
    posts: HashMap<String, Vec<RedditComment>>,
    failing: bool,
    pub(crate) calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_post(mut self, post_id: &str, forest: Vec<RedditComment>) -> Self {
        self.posts.insert(post_id.to_string(), forest);
        self
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn find<'a>(forest: &'a [RedditComment], id: &str) -> Option<&'a RedditComment> {
        forest.iter().find_map(|c| {
            if c.id == id {
                Some(c)
            } else {
                Self::find(&c.replies, id)
            }
        })
    }

    fn forest(&self, post_id: &str) -> Result<&[RedditComment]> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(TrackerError::RedditApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.posts.get(post_id).map(Vec::as_slice).unwrap_or(&[]))
    }
}

#[async_trait]
impl CommentSource for FakeSource {
    async fn fetch_comment(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<RedditComment>> {
        Ok(Self::find(self.forest(post_id)?, comment_id).cloned())
    }

    async fn fetch_top_level(&self, post_id: &str) -> Result<Vec<RedditComment>> {
        Ok(self.forest(post_id)?.to_vec())
    }

    async fn fetch_replies(&self, post_id: &str, parent_id: &str) -> Result<Vec<RedditComment>> {
        Ok(Self::find(self.forest(post_id)?, parent_id)
            .map(|c| c.replies.clone())
            .unwrap_or_default())
    }
}
