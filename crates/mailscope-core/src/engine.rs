//! The streaming scan loop.
//!
//! One pass over the most recent messages of a folder, fetched in
//! bounded batches and folded into an [`Accumulator`]. The loop owns
//! the windowing, ordering, short-circuit, cancellation, and
//! partial-result rules; what is computed per record belongs to the
//! aggregation modes.
//!
//! The sample window is the most recent `sample_limit` messages, and
//! records stream through it in mailbox order (ascending sequence
//! numbers). Match lists and first-seen tie-breaks therefore follow
//! the order the messages arrived in.

use std::fmt;

use mailscope_mime::MessageSummary;
use tracing::{debug, warn};

use crate::aggregate::{Accumulator, ScanMode, ScanReport};
use crate::error::ScanResult;
use crate::source::MessageSource;

/// Default number of recent messages a scan covers.
pub const DEFAULT_SAMPLE_LIMIT: u32 = 1000;

/// Default messages per fetch batch.
pub const DEFAULT_BATCH_SIZE: u32 = 100;

const MAX_BATCH_SIZE: u32 = 500;

/// Where a scan currently is, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Batches are still being fetched and aggregated.
    Scanning,
    /// The pass has ended; no further callbacks follow.
    Done,
}

/// A progress snapshot handed to the scan callback after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Records aggregated so far.
    pub analyzed: u32,
    /// Records the scan set out to cover.
    pub target: u32,
    /// Current phase.
    pub phase: ScanPhase,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            ScanPhase::Scanning => write!(f, "scanning {}/{} messages", self.analyzed, self.target),
            ScanPhase::Done => write!(f, "scanned {} messages", self.analyzed),
        }
    }
}

/// What a finished scan hands back: the mode's report plus how much of
/// the mailbox it actually covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// The mode's aggregate.
    pub report: ScanReport,
    /// Messages in the folder when the scan started.
    pub total: u32,
    /// Records actually aggregated.
    pub analyzed: u32,
    /// True when the scan stopped early through cancellation or a
    /// mid-scan fetch failure. A search that filled its match limit is
    /// complete, not partial.
    pub partial: bool,
}

/// Configured scan runner.
///
/// Holds only the sampling knobs; each [`run`](Self::run) is an
/// independent pass and the engine can be reused across modes.
#[derive(Debug, Clone, Copy)]
pub struct ScanEngine {
    sample_limit: u32,
    batch_size: u32,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ScanEngine {
    /// Creates an engine with the default sample and batch sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many recent messages a scan covers.
    #[must_use]
    pub const fn sample_limit(mut self, limit: u32) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Sets the fetch batch size, clamped to 1..=500 so a single FETCH
    /// response stays bounded.
    #[must_use]
    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Runs one scan over `source` in the given mode.
    ///
    /// The scan covers the most recent `min(sample_limit, count)`
    /// messages and visits them in mailbox order (ascending sequence
    /// numbers). `on_progress` is called after every batch; returning
    /// `false` cancels the scan cooperatively and yields whatever was
    /// aggregated so far as a partial outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only when the scan could not aggregate
    /// anything: the initial batch failed, or the source refused the
    /// range. Once at least one batch landed, later fetch failures
    /// degrade to a partial outcome instead.
    pub async fn run<S, F>(
        &self,
        source: &mut S,
        mode: ScanMode,
        mut on_progress: F,
    ) -> ScanResult<ScanOutcome>
    where
        S: MessageSource,
        F: FnMut(&Progress) -> bool,
    {
        let total = source.message_count();
        let target = total.min(self.sample_limit);
        debug!(total, target, batch_size = self.batch_size, "starting scan");

        let mut acc = Accumulator::for_mode(mode);
        let mut analyzed: u32 = 0;
        let mut partial = false;
        let mut batches_done: u32 = 0;

        // Sequence numbers are 1-based; the sample window is the top
        // `target` of them, walked in ascending order.
        let mut lower = if target > 0 { total - (target - 1) } else { 1 };
        while target > 0 && lower <= total && !acc.is_complete() {
            let last = lower.saturating_add(self.batch_size - 1).min(total);
            match source.fetch_headers(lower, last).await {
                Ok(batch) => {
                    batches_done += 1;
                    for (_, raw) in batch {
                        acc.observe(MessageSummary::parse(&raw));
                        analyzed += 1;
                        if acc.is_complete() {
                            break;
                        }
                    }
                    let snapshot = Progress {
                        analyzed,
                        target,
                        phase: ScanPhase::Scanning,
                    };
                    if !on_progress(&snapshot) {
                        debug!(analyzed, "scan cancelled");
                        partial = true;
                        break;
                    }
                }
                Err(err) => {
                    if batches_done == 0 {
                        return Err(err.into());
                    }
                    warn!(error = %err, analyzed, "batch fetch failed, keeping partial results");
                    partial = true;
                    break;
                }
            }
            if last == total {
                break;
            }
            lower = last + 1;
        }

        on_progress(&Progress {
            analyzed,
            target,
            phase: ScanPhase::Done,
        });

        Ok(ScanOutcome {
            report: acc.finalize(),
            total,
            analyzed,
            partial,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// In-memory source backed by a list of (sender, subject) pairs,
    /// message `i` being 1-based; optionally failing every fetch after
    /// the first `fail_after` calls, or lying about its message count.
    struct FakeSource {
        messages: Vec<(String, String)>,
        fail_after: Option<u32>,
        reported_count: Option<u32>,
        fetches: u32,
    }

    impl FakeSource {
        fn new(messages: &[(&str, &str)]) -> Self {
            Self {
                messages: messages
                    .iter()
                    .map(|(s, j)| ((*s).to_string(), (*j).to_string()))
                    .collect(),
                fail_after: None,
                reported_count: None,
                fetches: 0,
            }
        }

        /// `count` messages, all from `a@x.com`, subjects `msg 1..`.
        fn uniform(count: u32) -> Self {
            let messages: Vec<(String, String)> = (1..=count)
                .map(|i| ("a@x.com".to_string(), format!("msg {i}")))
                .collect();
            Self {
                messages,
                fail_after: None,
                reported_count: None,
                fetches: 0,
            }
        }
    }

    impl MessageSource for FakeSource {
        fn message_count(&self) -> u32 {
            self.reported_count
                .unwrap_or_else(|| u32::try_from(self.messages.len()).unwrap())
        }

        async fn fetch_headers(
            &mut self,
            first: u32,
            last: u32,
        ) -> mailscope_imap::Result<Vec<(u32, Vec<u8>)>> {
            self.fetches += 1;
            if let Some(limit) = self.fail_after
                && self.fetches > limit
            {
                return Err(mailscope_imap::Error::Protocol("link dropped".to_string()));
            }
            Ok((first..=last)
                .map(|seq| {
                    let (sender, subject) = &self.messages[(seq - 1) as usize];
                    let raw = format!("From: {sender}\r\nSubject: {subject}\r\n\r\n");
                    (seq, raw.into_bytes())
                })
                .collect())
        }
    }

    fn listing_subjects(outcome: &ScanOutcome) -> Vec<String> {
        let ScanReport::SenderCount {
            messages: Some(listed),
            ..
        } = &outcome.report
        else {
            panic!("wrong report variant");
        };
        listed.iter().map(|m| m.subject.clone()).collect()
    }

    #[tokio::test]
    async fn test_empty_mailbox_yields_empty_complete_outcome() {
        let mut source = FakeSource::uniform(0);
        let outcome = ScanEngine::new()
            .run(&mut source, ScanMode::Statistics, |_| true)
            .await
            .unwrap();

        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.analyzed, 0);
        assert!(!outcome.partial);
        assert_eq!(source.fetches, 0);
        assert_eq!(
            outcome.report,
            ScanReport::Statistics {
                top_senders: vec![],
                top_keywords: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_covers_most_recent_window_in_mailbox_order() {
        let mut source = FakeSource::uniform(10);
        let engine = ScanEngine::new().sample_limit(4).batch_size(3);
        let outcome = engine
            .run(
                &mut source,
                ScanMode::SenderListing {
                    sender: "a@x.com".to_string(),
                },
                |_| true,
            )
            .await
            .unwrap();

        assert_eq!(outcome.total, 10);
        assert_eq!(outcome.analyzed, 4);
        assert!(!outcome.partial);
        // The window is the most recent 4 messages (7..=10), visited
        // ascending: batches 7..=9 then 10..=10.
        assert_eq!(listing_subjects(&outcome), ["msg 7", "msg 8", "msg 9", "msg 10"]);
        assert_eq!(source.fetches, 2);
    }

    #[tokio::test]
    async fn test_small_mailbox_is_covered_entirely() {
        let mut source = FakeSource::uniform(5);
        let outcome = ScanEngine::new()
            .sample_limit(1000)
            .run(&mut source, ScanMode::Statistics, |_| true)
            .await
            .unwrap();

        assert_eq!(outcome.analyzed, 5);
        assert!(!outcome.partial);
        assert_eq!(source.fetches, 1);
    }

    #[tokio::test]
    async fn test_subject_search_matches_in_mailbox_order() {
        let mut source = FakeSource::new(&[
            ("a@x.com", "Weekly Update"),
            ("b@x.com", "weekly report"),
            ("a@x.com", "Invoice due"),
        ]);
        let outcome = ScanEngine::new()
            .run(
                &mut source,
                ScanMode::SubjectSearch {
                    keyword: "weekly".to_string(),
                    limit: 10,
                },
                |_| true,
            )
            .await
            .unwrap();

        let ScanReport::SubjectSearch { matches, .. } = outcome.report else {
            panic!("wrong report variant");
        };
        let subjects: Vec<&str> = matches.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, ["Weekly Update", "weekly report"]);
    }

    #[tokio::test]
    async fn test_subject_search_short_circuits() {
        let mut source = FakeSource::uniform(10);
        let engine = ScanEngine::new().batch_size(3);
        let outcome = engine
            .run(
                &mut source,
                ScanMode::SubjectSearch {
                    keyword: "msg 2".to_string(),
                    limit: 1,
                },
                |_| true,
            )
            .await
            .unwrap();

        // The second message matches, so two records settle the scan
        // and only the first batch is ever fetched.
        assert_eq!(outcome.analyzed, 2);
        assert!(!outcome.partial);
        assert_eq!(source.fetches, 1);
        let ScanReport::SubjectSearch { matches, .. } = outcome.report else {
            panic!("wrong report variant");
        };
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].subject, "msg 2");
    }

    #[tokio::test]
    async fn test_zero_limit_search_fetches_nothing() {
        let mut source = FakeSource::uniform(10);
        let outcome = ScanEngine::new()
            .run(
                &mut source,
                ScanMode::SubjectSearch {
                    keyword: "msg".to_string(),
                    limit: 0,
                },
                |_| true,
            )
            .await
            .unwrap();

        assert_eq!(outcome.analyzed, 0);
        assert_eq!(source.fetches, 0);
    }

    #[tokio::test]
    async fn test_statistics_runs_are_idempotent() {
        let messages: &[(&str, &str)] = &[
            ("a@x.com", "Weekly Update"),
            ("b@x.com", "weekly report"),
            ("a@x.com", "Invoice due"),
            ("c@x.com", "Invoice reminder"),
            ("b@x.com", "lunch?"),
        ];
        let engine = ScanEngine::new().batch_size(2);

        let mut first = FakeSource::new(messages);
        let mut second = FakeSource::new(messages);
        let one = engine
            .run(&mut first, ScanMode::Statistics, |_| true)
            .await
            .unwrap();
        let two = engine
            .run(&mut second, ScanMode::Statistics, |_| true)
            .await
            .unwrap();

        // Identical mailbox, identical tables, ordering included.
        assert_eq!(one, two);
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_results() {
        let mut source = FakeSource::uniform(10);
        let engine = ScanEngine::new().batch_size(3);
        let outcome = engine
            .run(&mut source, ScanMode::Statistics, |p| {
                p.phase == ScanPhase::Done || p.analyzed < 3
            })
            .await
            .unwrap();

        // Cancelled after the first batch.
        assert_eq!(outcome.analyzed, 3);
        assert!(outcome.partial);
        assert_eq!(source.fetches, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_after_first_batch_is_partial() {
        let mut source = FakeSource::uniform(10);
        source.fail_after = Some(1);
        let engine = ScanEngine::new().batch_size(3);
        let outcome = engine
            .run(
                &mut source,
                ScanMode::SenderCount {
                    sender: "a@x.com".to_string(),
                    include_list: false,
                },
                |_| true,
            )
            .await
            .unwrap();

        assert_eq!(outcome.analyzed, 3);
        assert!(outcome.partial);
        let ScanReport::SenderCount { count, .. } = outcome.report else {
            panic!("wrong report variant");
        };
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_on_first_batch_is_an_error() {
        let mut source = FakeSource::uniform(10);
        source.fail_after = Some(0);
        let result = ScanEngine::new()
            .run(&mut source, ScanMode::Statistics, |_| true)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_progress_reports_done_phase_last() {
        let mut source = FakeSource::uniform(4);
        let mut phases = Vec::new();
        ScanEngine::new()
            .batch_size(2)
            .run(&mut source, ScanMode::Statistics, |p| {
                phases.push(p.phase);
                true
            })
            .await
            .unwrap();

        assert_eq!(
            phases,
            [ScanPhase::Scanning, ScanPhase::Scanning, ScanPhase::Done]
        );
    }

    #[tokio::test]
    async fn test_zero_sample_limit_on_huge_mailbox_count() {
        // A misreported EXISTS near u32::MAX must not overflow the
        // window arithmetic when nothing is sampled.
        let mut source = FakeSource::new(&[]);
        source.reported_count = Some(u32::MAX);
        let outcome = ScanEngine::new()
            .sample_limit(0)
            .run(&mut source, ScanMode::Statistics, |_| true)
            .await
            .unwrap();

        assert_eq!(outcome.total, u32::MAX);
        assert_eq!(outcome.analyzed, 0);
        assert_eq!(source.fetches, 0);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let engine = ScanEngine::new().batch_size(0);
        assert_eq!(engine.batch_size, 1);
        let engine = ScanEngine::new().batch_size(100_000);
        assert_eq!(engine.batch_size, MAX_BATCH_SIZE);
    }

    #[test]
    fn test_progress_display() {
        let scanning = Progress {
            analyzed: 30,
            target: 100,
            phase: ScanPhase::Scanning,
        };
        assert_eq!(scanning.to_string(), "scanning 30/100 messages");
        let done = Progress {
            analyzed: 100,
            target: 100,
            phase: ScanPhase::Done,
        };
        assert_eq!(done.to_string(), "scanned 100 messages");
    }
}
