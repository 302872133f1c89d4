use crate::core::TrackingStore;
use crate::domain::model::{Rank, Status};
use crate::utils::error::Result;
use std::sync::Arc;

pub struct StatusCalculator<S: TrackingStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TrackingStore + ?Sized> StatusCalculator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Compares against the stored rank, records the new observation, then maps
    /// (rank changed, recent reply) onto a [`Status`].
    pub fn calculate_status(
        &self,
        comment_url: &str,
        current_rank: Rank,
        has_recent_reply: bool,
        reply_timestamp: Option<&str>,
    ) -> Result<Status> {
        let rank = current_rank.to_string();
        let rank_changed = self.store.has_rank_changed(comment_url, &rank)?;

        self.store
            .update_tracking_data(comment_url, &rank, reply_timestamp)?;

        Ok(Status::from_flags(rank_changed, has_recent_reply))
    }
}
