use crate::core::rank_detector::{RankDetector, RankInspection};
use crate::core::reply_detector::ReplyDetector;
use crate::core::CommentSource;
use crate::domain::model::{Rank, ReplyCheck};
use crate::utils::error::Result;
use std::fmt;

const RULE_WIDTH: usize = 80;
const LISTING_LIMIT: usize = 10;

/// Rank and reply state of one comment as seen through the API, optionally
/// checked against the rank a user sees in the Reddit UI.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub url: String,
    pub inspection: RankInspection,
    pub reply: ReplyCheck,
    pub reply_window_hours: i64,
    pub expected_rank: Option<usize>,
}

impl VerificationReport {
    /// `None` when no expected rank was supplied.
    pub fn matches(&self) -> Option<bool> {
        self.expected_rank
            .map(|expected| self.inspection.position == Some(expected))
    }

    fn write_rank(&self, f: &mut fmt::Formatter<'_>, rule: &str) -> fmt::Result {
        let inspection = &self.inspection;
        let target = &inspection.target;

        writeln!(f, "{}", rule)?;
        writeln!(f, "REDDIT RANKING VERIFICATION REPORT")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "📌 Target Comment ID: {}", target.id)?;
        writeln!(f, "👤 Author: {}", target.author_label())?;
        writeln!(f, "⬆️ Score: {}", target.score)?;
        let preview: String = target.body.chars().take(100).collect();
        writeln!(f, "📝 Body preview: {}...", preview.replace('\n', " "))?;

        match target.parent_comment_id() {
            None => writeln!(f, "📍 Comment Type: TOP-LEVEL")?,
            Some(parent) => {
                writeln!(f, "📍 Comment Type: REPLY")?;
                writeln!(f, "👆 Parent Comment ID: {}", parent)?;
            }
        }

        writeln!(f, "{}", rule)?;
        writeln!(f, "{} (sorted by Best)", inspection.context.to_uppercase())?;
        writeln!(f, "{}", rule)?;
        for line in inspection.listing(LISTING_LIMIT) {
            writeln!(f, "{}", line)?;
        }
        if inspection.comparison.len() > LISTING_LIMIT {
            writeln!(f, "   ...")?;
        }
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(f, "Total compared: {}", inspection.comparison.len())?;

        match (inspection.position, inspection.rank) {
            (Some(pos), Rank::Top(rank)) => {
                writeln!(f, "🎯 POSITION: #{}", pos)?;
                writeln!(f, "✅ Rank: {}", rank)
            }
            (Some(pos), Rank::OutOfTop) => {
                writeln!(f, "🎯 POSITION: #{}", pos)?;
                writeln!(f, "❌ Rank: {} (actual position: #{})", Rank::OutOfTop, pos)
            }
            (None, _) => writeln!(f, "⚠️ Comment not found in {}", inspection.context),
        }
    }

    fn write_reply(&self, f: &mut fmt::Formatter<'_>, rule: &str) -> fmt::Result {
        writeln!(f, "{}", rule)?;
        writeln!(f, "REPLY CHECK (last {} hours)", self.reply_window_hours)?;
        writeln!(f, "{}", rule)?;
        match &self.reply.most_recent_reply {
            Some(timestamp) if self.reply.has_recent_reply => {
                writeln!(f, "💬 Recent reply: YES (most recent: {})", timestamp)
            }
            _ => writeln!(f, "💬 Recent reply: NO"),
        }
    }

    fn write_expectation(&self, f: &mut fmt::Formatter<'_>, rule: &str) -> fmt::Result {
        let Some(expected) = self.expected_rank else {
            return Ok(());
        };
        let detected = self
            .inspection
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "Not found".to_string());

        writeln!(f, "{}", rule)?;
        writeln!(f, "VERIFICATION")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Expected rank (from UI): {}", expected)?;
        writeln!(f, "Detected rank (from API): {}", detected)?;
        if self.matches() == Some(true) {
            writeln!(f, "✅ MATCH - System is working correctly!")
        } else {
            writeln!(f, "⚠️ MISMATCH - Needs investigation")?;
            writeln!(f, "Possible causes:")?;
            writeln!(f, "  1. UI sort changed after API fetch")?;
            writeln!(f, "  2. Comment scores updated between checks")?;
            writeln!(f, "  3. Reddit's 'Best' algorithm differs from API order")
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        self.write_rank(f, &rule)?;
        self.write_reply(f, &rule)?;
        self.write_expectation(f, &rule)
    }
}

/// Ranks the comment, then checks its reply tree, like one row of a batch run
/// without touching the tracking store.
pub async fn verify_comment<C: CommentSource + ?Sized>(
    rank_detector: &RankDetector<C>,
    reply_detector: &ReplyDetector<C>,
    comment_url: &str,
    expected_rank: Option<usize>,
) -> Result<VerificationReport> {
    let inspection = rank_detector.inspect(comment_url).await?;
    let reply = reply_detector.has_recent_reply(comment_url).await;
    Ok(VerificationReport {
        url: comment_url.to_string(),
        inspection,
        reply,
        reply_window_hours: reply_detector.window_hours(),
        expected_rank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{comment, with_replies, FakeSource};
    use chrono::Utc;
    use std::sync::Arc;

    fn source() -> Arc<FakeSource> {
        let recent = Utc::now().timestamp() as f64 - 3600.0;
        let forest = vec![
            comment("aaa", "t3_post1", 0.0),
            with_replies(
                comment("bbb", "t3_post1", 0.0),
                vec![
                    comment("r1", "t1_bbb", 0.0),
                    with_replies(
                        comment("r2", "t1_bbb", 0.0),
                        vec![comment("r3", "t1_r2", recent)],
                    ),
                ],
            ),
        ];
        Arc::new(FakeSource::new().with_post("post1", forest))
    }

    async fn verify(url: &str, expected: Option<usize>) -> Result<VerificationReport> {
        let source = source();
        let ranks = RankDetector::new(Arc::clone(&source));
        let replies = ReplyDetector::new(source);
        verify_comment(&ranks, &replies, url, expected).await
    }

    #[tokio::test]
    async fn test_report_for_reply_with_matching_expectation() {
        let url = "https://www.reddit.com/r/rust/comments/post1/t/r2/";
        let report = verify(url, Some(2)).await.unwrap();

        assert_eq!(report.matches(), Some(true));
        assert!(report.reply.has_recent_reply);
        let text = report.to_string();
        assert!(text.contains("📍 Comment Type: REPLY"));
        assert!(text.contains("👆 Parent Comment ID: bbb"));
        assert!(text.contains("✅ Rank: 2"));
        assert!(text.contains("REPLY CHECK (last 72 hours)"));
        assert!(text.contains("💬 Recent reply: YES"));
        assert!(text.contains("✅ MATCH"));
    }

    #[tokio::test]
    async fn test_report_flags_mismatch_without_reply() {
        let url = "https://www.reddit.com/r/rust/comments/post1/t/aaa/";
        let report = verify(url, Some(3)).await.unwrap();

        assert_eq!(report.matches(), Some(false));
        assert!(!report.reply.has_recent_reply);
        let text = report.to_string();
        assert!(text.contains("TOP-LEVEL"));
        assert!(text.contains("💬 Recent reply: NO"));
        assert!(text.contains("MISMATCH"));
    }

    #[tokio::test]
    async fn test_report_without_expectation_skips_verification() {
        let url = "https://www.reddit.com/r/rust/comments/post1/t/bbb/";
        let report = verify(url, None).await.unwrap();

        assert_eq!(report.matches(), None);
        assert!(!report.to_string().contains("VERIFICATION\n"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        assert!(verify("https://www.reddit.com/r/rust/", None).await.is_err());
    }
}
