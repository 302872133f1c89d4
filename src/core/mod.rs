pub mod etl;
pub mod pipeline;
pub mod processor;
pub mod rank_detector;
pub mod reply_detector;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{Rank, RedditComment, ReplyCheck, Status, TrackingResult};
pub use crate::domain::ports::{CommentSource, ConfigProvider, Pipeline, Storage, TrackingStore};
pub use crate::utils::error::Result;
