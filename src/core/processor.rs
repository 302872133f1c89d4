use crate::config::settings::TrackingSettings;
use crate::core::rank_detector::RankDetector;
use crate::core::reply_detector::ReplyDetector;
use crate::core::status::StatusCalculator;
use crate::core::{CommentSource, TrackingStore};
use crate::domain::model::{Rank, ReplyCheck, Status, TrackingResult};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    Started { index: usize, url: &'a str },
    Finished(&'a TrackingResult),
}

/// Runs rank detection, reply detection and status calculation per comment.
pub struct CommentProcessor<C: CommentSource + ?Sized, S: TrackingStore + ?Sized> {
    rank_detector: RankDetector<C>,
    reply_detector: ReplyDetector<C>,
    status_calc: StatusCalculator<S>,
    store: Arc<S>,
    max_workers: usize,
}

impl<C: CommentSource + ?Sized, S: TrackingStore + ?Sized> CommentProcessor<C, S> {
    pub fn new(source: Arc<C>, store: Arc<S>, settings: &TrackingSettings) -> Self {
        Self {
            rank_detector: RankDetector::new(Arc::clone(&source)),
            reply_detector: ReplyDetector::with_window_hours(source, settings.reply_window_hours),
            status_calc: StatusCalculator::new(Arc::clone(&store)),
            store,
            max_workers: 5,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    fn finish(&self, url: &str, rank: Rank, reply: &ReplyCheck) -> Result<TrackingResult> {
        // 更新前先讀上一次的排名
        let previous_rank = self.store.get_previous_rank(url)?;
        let status = self.status_calc.calculate_status(
            url,
            rank,
            reply.has_recent_reply,
            reply.most_recent_reply.as_deref(),
        )?;
        Ok(TrackingResult::new(url, status, rank, previous_rank))
    }

    /// Fails only when the tracking store does.
    pub async fn process_single_comment(&self, comment_url: &str) -> Result<TrackingResult> {
        tracing::info!("Processing: {}", comment_url);

        let rank = self.rank_detector.detect_rank(comment_url).await;
        let reply = self.reply_detector.has_recent_reply(comment_url).await;
        let result = self.finish(comment_url, rank, &reply)?;

        tracing::info!(
            "✅ RESULT: {} | Rank: {}",
            result.status,
            result.present_rank
        );
        Ok(result)
    }

    /// Sequential processing; a failed comment yields "No Change" / "Out of Top 5".
    pub async fn process_batch(&self, comment_urls: &[String]) -> Vec<TrackingResult> {
        self.process_batch_with_progress(comment_urls, Status::NoChange, |_| {})
            .await
    }

    /// Sequential processing reporting every comment to `on_event`. A failed
    /// comment is reported with `error_status` and "Out of Top 5".
    pub async fn process_batch_with_progress<F>(
        &self,
        comment_urls: &[String],
        error_status: Status,
        mut on_event: F,
    ) -> Vec<TrackingResult>
    where
        F: FnMut(BatchEvent<'_>) + Send,
    {
        let mut results = Vec::with_capacity(comment_urls.len());

        for (index, url) in comment_urls.iter().enumerate() {
            tracing::info!("# COMMENT {}/{}", index + 1, comment_urls.len());
            on_event(BatchEvent::Started { index, url });

            let result = match self.process_single_comment(url).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("❌ ERROR processing {}: {}", url, e);
                    TrackingResult::fallback(url, error_status)
                }
            };
            on_event(BatchEvent::Finished(&result));
            results.push(result);
        }

        results
    }
}

impl<C, S> CommentProcessor<C, S>
where
    C: CommentSource + ?Sized + 'static,
    S: TrackingStore + ?Sized,
{
    /// Ranks sequentially, checks replies concurrently (bounded by `max_workers`),
    /// then computes statuses in input order.
    pub async fn process_batch_parallel(&self, comment_urls: &[String]) -> Vec<TrackingResult> {
        tracing::info!("PHASE 1: RANK DETECTION (Sequential)");
        let mut ranks = Vec::with_capacity(comment_urls.len());
        for (idx, url) in comment_urls.iter().enumerate() {
            let rank = self.rank_detector.detect_rank(url).await;
            tracing::info!("[{}/{}] Rank: {} ({})", idx + 1, comment_urls.len(), rank, url);
            ranks.push(rank);
        }

        tracing::info!(
            "PHASE 2: REPLY DETECTION (Parallel, {} workers)",
            self.max_workers
        );
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        for (idx, url) in comment_urls.iter().enumerate() {
            let detector = self.reply_detector.clone();
            let semaphore = Arc::clone(&semaphore);
            let url = url.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let check = detector.has_recent_reply(&url).await;
                tracing::debug!("✓ {}: Reply={}", url, check.has_recent_reply);
                (idx, check)
            });
        }

        let mut replies: HashMap<usize, ReplyCheck> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, check)) => {
                    replies.insert(idx, check);
                }
                Err(e) => tracing::error!("✗ Reply check task failed: {}", e),
            }
        }

        tracing::info!("PHASE 3: STATUS CALCULATION");
        comment_urls
            .iter()
            .zip(ranks)
            .enumerate()
            .map(|(idx, (url, rank))| {
                let reply = replies.remove(&idx).unwrap_or_default();
                self.finish(url, rank, &reply).unwrap_or_else(|e| {
                    tracing::error!("❌ ERROR processing {}: {}", url, e);
                    TrackingResult::fallback(url, Status::NoChange)
                })
            })
            .collect()
    }
}
