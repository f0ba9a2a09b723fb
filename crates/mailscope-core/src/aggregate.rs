//! Aggregation modes and their accumulators.
//!
//! Each scan mode is a tagged variant with one accumulator folding
//! [`MessageSummary`] records as they stream in, and a `finalize` step
//! producing the mode's report. Keeping the modes behind one
//! observe/finalize surface lets every mode be unit-tested by feeding
//! synthetic records, no mailbox involved.

use std::collections::HashMap;

use mailscope_mime::MessageSummary;

/// Number of entries reported by the statistics tables.
pub const TOP_N: usize = 10;

/// Hard cap on listed records for sender modes. The numeric count keeps
/// counting past this; only the listing stops growing.
pub const LIST_CAP: usize = 50;

/// Minimum token length kept by the subject tokenizer.
const MIN_TOKEN_LEN: usize = 3;

/// Tokens discarded by the subject tokenizer.
///
/// The set is fixed and deterministic so statistics are reproducible
/// across runs; it was carried over from the tool this scanner
/// replaces rather than derived from any corpus.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "was", "one", "our",
    "out", "day", "get", "has", "him", "his", "how", "its", "new", "now", "old", "see", "two",
    "who", "boy", "did", "may", "say", "she", "use", "her", "way", "will", "your",
];

/// Splits a subject into lowercase alphanumeric keywords, dropping
/// stop words and tokens shorter than 3 characters.
pub fn tokenize_subject(subject: &str) -> impl Iterator<Item = String> {
    subject
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN && !STOP_WORDS.contains(t))
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

/// What to compute over the scanned messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Top senders and top subject keywords.
    Statistics,
    /// Count messages from one sender, optionally listing them.
    SenderCount {
        /// Sender address to match, case-insensitively and exactly.
        sender: String,
        /// Whether to also collect a capped listing.
        include_list: bool,
    },
    /// Collect messages whose subject contains a keyword.
    SubjectSearch {
        /// Literal substring to match, case-insensitively. Never a
        /// regex: user-supplied search terms must not surprise.
        keyword: String,
        /// Stop scanning once this many matches are collected.
        limit: usize,
    },
    /// Like `SenderCount` with the listing always on.
    SenderListing {
        /// Sender address to match.
        sender: String,
    },
}

/// The aggregate a finished scan hands back, one variant per mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanReport {
    /// Frequency tables from `ScanMode::Statistics`.
    Statistics {
        /// Top senders by message count, descending, ties in
        /// first-seen order.
        top_senders: Vec<(String, u64)>,
        /// Top subject keywords by frequency, same ordering rules.
        top_keywords: Vec<(String, u64)>,
    },
    /// Result of the sender modes.
    SenderCount {
        /// The matched sender address as given.
        sender: String,
        /// Exact number of matches over the scanned range; not capped.
        count: u64,
        /// Scan-ordered listing capped at [`LIST_CAP`], when requested.
        messages: Option<Vec<MessageSummary>>,
    },
    /// Result of `ScanMode::SubjectSearch`.
    SubjectSearch {
        /// The keyword as given.
        keyword: String,
        /// Matches in scan order, at most the requested limit.
        matches: Vec<MessageSummary>,
    },
}

/// Frequency table with stable first-seen tie-breaking.
#[derive(Debug, Default)]
pub(crate) struct FrequencyTable {
    entries: HashMap<String, Entry>,
}

#[derive(Debug)]
pub(crate) struct Entry {
    count: u64,
    first_seen: usize,
}

impl FrequencyTable {
    fn observe(&mut self, key: String) {
        let next_index = self.entries.len();
        self.entries
            .entry(key)
            .or_insert(Entry {
                count: 0,
                first_seen: next_index,
            })
            .count += 1;
    }

    /// Top `n` entries by descending count; equal counts keep the
    /// order the keys were first observed in.
    fn top(self, n: usize) -> Vec<(String, u64)> {
        let mut all: Vec<(String, Entry)> = self.entries.into_iter().collect();
        all.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));
        all.into_iter()
            .take(n)
            .map(|(key, entry)| (key, entry.count))
            .collect()
    }
}

/// The running aggregate for one scan, tagged by mode.
#[derive(Debug)]
pub(crate) enum Accumulator {
    Statistics {
        senders: FrequencyTable,
        keywords: FrequencyTable,
    },
    SenderCount {
        target: String,
        include_list: bool,
        count: u64,
        messages: Vec<MessageSummary>,
    },
    SubjectSearch {
        keyword: String,
        keyword_lower: String,
        limit: usize,
        matches: Vec<MessageSummary>,
    },
}

impl Accumulator {
    pub(crate) fn for_mode(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Statistics => Self::Statistics {
                senders: FrequencyTable::default(),
                keywords: FrequencyTable::default(),
            },
            ScanMode::SenderCount {
                sender,
                include_list,
            } => Self::SenderCount {
                target: sender,
                include_list,
                count: 0,
                messages: Vec::new(),
            },
            ScanMode::SenderListing { sender } => Self::SenderCount {
                target: sender,
                include_list: true,
                count: 0,
                messages: Vec::new(),
            },
            ScanMode::SubjectSearch { keyword, limit } => Self::SubjectSearch {
                keyword_lower: keyword.to_lowercase(),
                keyword,
                limit,
                matches: Vec::new(),
            },
        }
    }

    /// Folds one record into the aggregate.
    pub(crate) fn observe(&mut self, record: MessageSummary) {
        match self {
            Self::Statistics { senders, keywords } => {
                if !record.sender.is_empty() {
                    senders.observe(record.sender.to_lowercase());
                }
                for token in tokenize_subject(&record.subject) {
                    keywords.observe(token);
                }
            }
            Self::SenderCount {
                target,
                include_list,
                count,
                messages,
            } => {
                if record.sender.eq_ignore_ascii_case(target) {
                    *count += 1;
                    if *include_list && messages.len() < LIST_CAP {
                        messages.push(record);
                    }
                }
            }
            Self::SubjectSearch {
                keyword_lower,
                limit,
                matches,
                ..
            } => {
                if matches.len() < *limit && record.subject.to_lowercase().contains(&**keyword_lower)
                {
                    matches.push(record);
                }
            }
        }
    }

    /// True once further records cannot change the result, letting the
    /// scan short-circuit.
    pub(crate) fn is_complete(&self) -> bool {
        match self {
            Self::SubjectSearch { limit, matches, .. } => matches.len() >= *limit,
            Self::Statistics { .. } | Self::SenderCount { .. } => false,
        }
    }

    /// Produces the mode's report.
    pub(crate) fn finalize(self) -> ScanReport {
        match self {
            Self::Statistics { senders, keywords } => ScanReport::Statistics {
                top_senders: senders.top(TOP_N),
                top_keywords: keywords.top(TOP_N),
            },
            Self::SenderCount {
                target,
                include_list,
                count,
                messages,
            } => ScanReport::SenderCount {
                sender: target,
                count,
                messages: include_list.then_some(messages),
            },
            Self::SubjectSearch {
                keyword, matches, ..
            } => ScanReport::SubjectSearch { keyword, matches },
        }
    }
}
