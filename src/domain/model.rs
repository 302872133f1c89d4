use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of positions that count as "ranked".
pub const TOP_N_COMMENTS: usize = 5;

/// Hours a reply stays "recent".
pub const REPLY_WINDOW_HOURS: i64 = 72;

pub const OUTPUT_COLUMNS: [&str; 4] = ["URL", "Status", "Present Rank", "Previous Rank"];

pub const OUT_OF_TOP: &str = "Out of Top 5";

/// Position of a comment among its siblings in Reddit's "best" order.
///
/// Ordering puts `Top(1)..Top(5)` before `OutOfTop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Top(u8),
    OutOfTop,
}

impl Rank {
    /// Maps a 1-based position onto a rank, collapsing anything past the top five.
    pub fn from_position(position: usize) -> Self {
        if (1..=TOP_N_COMMENTS).contains(&position) {
            Rank::Top(position as u8)
        } else {
            Rank::OutOfTop
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Top(n) => write!(f, "{}", n),
            Rank::OutOfTop => f.write_str(OUT_OF_TOP),
        }
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == OUT_OF_TOP {
            return Ok(Rank::OutOfTop);
        }
        match s.parse::<u8>() {
            Ok(n) if n >= 1 => Ok(Rank::Top(n)),
            _ => Err(format!("invalid rank: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    RankingChanged,
    ReplyReceived,
    RankingChangedAndReplyReceived,
    NoChange,
    Error,
}

impl Status {
    pub fn from_flags(rank_changed: bool, has_recent_reply: bool) -> Self {
        match (rank_changed, has_recent_reply) {
            (true, true) => Status::RankingChangedAndReplyReceived,
            (true, false) => Status::RankingChanged,
            (false, true) => Status::ReplyReceived,
            (false, false) => Status::NoChange,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::RankingChanged => "Ranking Changed",
            Status::ReplyReceived => "Reply Received",
            Status::RankingChangedAndReplyReceived => "Ranking Changed + Reply Received",
            Status::NoChange => "No Change",
            Status::Error => "Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scanning a comment's reply tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyCheck {
    pub has_recent_reply: bool,
    pub most_recent_reply: Option<String>,
}

impl ReplyCheck {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Row of the `comment_tracking` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRecord {
    pub comment_url: String,
    pub last_known_rank: Option<String>,
    pub last_checked_timestamp: Option<String>,
    pub last_reply_timestamp: Option<String>,
}

/// One output row. Field names match the spreadsheet headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResult {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Present Rank")]
    pub present_rank: String,
    #[serde(rename = "Previous Rank")]
    pub previous_rank: String,
}

impl TrackingResult {
    pub fn new(url: &str, status: Status, present: Rank, previous: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            status: status.to_string(),
            present_rank: present.to_string(),
            previous_rank: previous.unwrap_or_else(|| "N/A".to_string()),
        }
    }

    /// Row used when a comment could not be processed at all.
    pub fn fallback(url: &str, status: Status) -> Self {
        Self::new(url, status, Rank::OutOfTop, None)
    }

    pub fn as_row(&self) -> [&str; 4] {
        [
            &self.url,
            &self.status,
            &self.present_rank,
            &self.previous_rank,
        ]
    }
}

/// A comment as returned by the Reddit listing API, with its reply tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RedditComment {
    pub id: String,
    /// Fullname of the parent: `t1_…` for a comment, `t3_…` for the post.
    pub parent_id: String,
    pub author: Option<String>,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub replies: Vec<RedditComment>,
}

impl RedditComment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.starts_with("t3_")
    }

    pub fn parent_comment_id(&self) -> Option<&str> {
        self.parent_id.strip_prefix("t1_")
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.body.as_str(), "[deleted]" | "[removed]")
    }

    pub fn author_label(&self) -> String {
        match &self.author {
            Some(name) if name != "[deleted]" => format!("u/{}", name),
            _ => "[deleted]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_display_and_parse() {
        assert_eq!(Rank::Top(3).to_string(), "3");
        assert_eq!(Rank::OutOfTop.to_string(), "Out of Top 5");
        assert_eq!("2".parse::<Rank>().unwrap(), Rank::Top(2));
        assert_eq!("Out of Top 5".parse::<Rank>().unwrap(), Rank::OutOfTop);
        assert!("0".parse::<Rank>().is_err());
        assert!("first".parse::<Rank>().is_err());
    }

    #[test]
    fn test_rank_from_position() {
        assert_eq!(Rank::from_position(1), Rank::Top(1));
        assert_eq!(Rank::from_position(5), Rank::Top(5));
        assert_eq!(Rank::from_position(6), Rank::OutOfTop);
        assert_eq!(Rank::from_position(0), Rank::OutOfTop);
    }

    #[test]
    fn test_status_from_flags() {
        assert_eq!(
            Status::from_flags(true, true).as_str(),
            "Ranking Changed + Reply Received"
        );
        assert_eq!(Status::from_flags(true, false).as_str(), "Ranking Changed");
        assert_eq!(Status::from_flags(false, true).as_str(), "Reply Received");
        assert_eq!(Status::from_flags(false, false).as_str(), "No Change");
    }

    #[test]
    fn test_tracking_result_serializes_with_sheet_headers() {
        let result = TrackingResult::new(
            "https://www.reddit.com/r/rust/comments/abc/t/def/",
            Status::NoChange,
            Rank::Top(1),
            None,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["Present Rank"], "1");
        assert_eq!(json["Previous Rank"], "N/A");
        assert_eq!(json["Status"], "No Change");
    }

    #[test]
    fn test_comment_parent_helpers() {
        let reply = RedditComment {
            id: "c2".into(),
            parent_id: "t1_c1".into(),
            author: None,
            body: "[removed]".into(),
            score: 1,
            created_utc: 0.0,
            replies: vec![],
        };
        assert!(!reply.is_top_level());
        assert_eq!(reply.parent_comment_id(), Some("c1"));
        assert!(reply.is_deleted());
        assert_eq!(reply.author_label(), "[deleted]");
    }
}
