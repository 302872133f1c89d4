use crate::adapters::reddit::{extract_comment_id, extract_post_id};
use crate::core::CommentSource;
use crate::domain::model::{Rank, RedditComment};
use crate::utils::error::{Result, TrackerError};
use std::sync::Arc;

/// Everything looked at while ranking one comment.
#[derive(Debug, Clone)]
pub struct RankInspection {
    pub post_id: String,
    pub target: RedditComment,
    /// Human readable description of the comparison set.
    pub context: String,
    pub comparison: Vec<RedditComment>,
    /// 1-based position of the target inside `comparison`.
    pub position: Option<usize>,
    pub rank: Rank,
}

impl RankInspection {
    /// First `limit` entries of the comparison set, marking the target.
    pub fn listing(&self, limit: usize) -> Vec<String> {
        self.comparison
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, c)| {
                let marker = if c.id == self.target.id { "⭐" } else { "  " };
                format!(
                    "{} {:2}. {:20} | Score: {:4} | ID: {}",
                    marker,
                    idx + 1,
                    c.author_label(),
                    c.score,
                    c.id
                )
            })
            .collect()
    }
}

/// Ranks a comment among its siblings using Reddit's "best" ordering.
pub struct RankDetector<C: CommentSource + ?Sized> {
    source: Arc<C>,
}

impl<C: CommentSource + ?Sized> Clone for RankDetector<C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<C: CommentSource + ?Sized> RankDetector<C> {
    pub fn new(source: Arc<C>) -> Self {
        Self { source }
    }

    pub async fn inspect(&self, comment_url: &str) -> Result<RankInspection> {
        let (Some(comment_id), Some(post_id)) =
            (extract_comment_id(comment_url), extract_post_id(comment_url))
        else {
            return Err(TrackerError::input(format!(
                "Invalid comment URL format: {}",
                comment_url
            )));
        };

        let target = self
            .source
            .fetch_comment(&post_id, &comment_id)
            .await?
            .ok_or_else(|| {
                TrackerError::processing(format!("Comment {} not returned by Reddit", comment_id))
            })?;

        if target.is_deleted() {
            tracing::warn!("⚠️ Comment {} is deleted or removed", comment_id);
            return Ok(RankInspection {
                post_id,
                target,
                context: "deleted comment".to_string(),
                comparison: Vec::new(),
                position: None,
                rank: Rank::OutOfTop,
            });
        }

        tracing::debug!(
            "👤 Author: {} | Score: {} | Top-level: {}",
            target.author_label(),
            target.score,
            target.is_top_level()
        );

        let (comparison, context) = match target.parent_comment_id() {
            None => (
                self.source.fetch_top_level(&post_id).await?,
                "top-level comments".to_string(),
            ),
            Some(parent_id) => (
                self.source.fetch_replies(&post_id, parent_id).await?,
                format!("replies under parent {}", parent_id),
            ),
        };

        let position = comparison
            .iter()
            .position(|c| c.id == target.id)
            .map(|idx| idx + 1);

        let rank = match position {
            Some(pos) => Rank::from_position(pos),
            None => {
                tracing::warn!("⚠️ Target comment not found in {}", context);
                Rank::OutOfTop
            }
        };

        Ok(RankInspection {
            post_id,
            target,
            context,
            comparison,
            position,
            rank,
        })
    }

    /// Present rank; any failure counts as "Out of Top 5".
    pub async fn detect_rank(&self, comment_url: &str) -> Rank {
        match self.inspect(comment_url).await {
            Ok(inspection) => {
                tracing::debug!(
                    "🏆 {} of {} {}",
                    inspection.position.map_or("-".to_string(), |p| p.to_string()),
                    inspection.comparison.len(),
                    inspection.context
                );
                for line in inspection.listing(10) {
                    tracing::debug!("{}", line);
                }
                inspection.rank
            }
            Err(e) => {
                tracing::warn!("❌ Error detecting rank for {}: {}", comment_url, e);
                Rank::OutOfTop
            }
        }
    }
}
