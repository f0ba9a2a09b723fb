//! Plain-text rendering of scan reports.

use chrono::{DateTime, FixedOffset};
use mailscope_core::{MessageSummary, ScanOutcome, ScanReport};

/// Listed rows are capped; counts always reflect the full result.
const DISPLAY_CAP: usize = 50;

/// Subjects wider than this are cut with an ellipsis.
const SUBJECT_WIDTH: usize = 60;

/// Prints the report of a finished scan, with a coverage footer.
pub fn print_outcome(outcome: &ScanOutcome) {
    match &outcome.report {
        ScanReport::Statistics {
            top_senders,
            top_keywords,
        } => print_statistics(top_senders, top_keywords),
        ScanReport::SenderCount {
            sender,
            count,
            messages,
        } => {
            println!("\n{count} messages from {sender}");
            if let Some(listed) = messages {
                print_listing(listed, usize::try_from(*count).unwrap_or(usize::MAX));
            }
        }
        ScanReport::SubjectSearch { keyword, matches } => {
            println!("\n{} messages with \"{keyword}\" in the subject", matches.len());
            print_listing(matches, matches.len());
        }
    }

    if outcome.partial {
        println!("note: scan stopped early; results are partial");
    }
    println!(
        "(scanned {} of {} messages in the folder)",
        outcome.analyzed, outcome.total
    );
}

fn print_statistics(top_senders: &[(String, u64)], top_keywords: &[(String, u64)]) {
    println!("\nTop senders");
    println!("{:-<48}", "");
    if top_senders.is_empty() {
        println!("(none)");
    }
    for (rank, (sender, count)) in top_senders.iter().enumerate() {
        println!("{:>2}. {:<38} {count:>5}", rank + 1, sender);
    }

    println!("\nTop subject keywords");
    println!("{:-<48}", "");
    if top_keywords.is_empty() {
        println!("(none)");
    }
    for (rank, (keyword, count)) in top_keywords.iter().enumerate() {
        println!("{:>2}. {:<38} {count:>5}", rank + 1, keyword);
    }
}

fn print_listing(messages: &[MessageSummary], total: usize) {
    for (index, message) in messages.iter().take(DISPLAY_CAP).enumerate() {
        println!(
            "{:>3}. {:<17} {:<32} {}",
            index + 1,
            format_date(message.date.as_ref()),
            clip(&message.sender, 32),
            clip(&message.subject, SUBJECT_WIDTH),
        );
    }
    let shown = messages.len().min(DISPLAY_CAP);
    if total > shown {
        println!("... and {} more", total - shown);
    }
}

fn format_date(date: Option<&DateTime<FixedOffset>>) -> String {
    date.map_or_else(
        || "unknown date".to_string(),
        |d| d.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Cuts a string to `width` characters, ellipsis included.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_text_unchanged() {
        assert_eq!(clip("hello", 60), "hello");
    }

    #[test]
    fn test_clip_long_text_keeps_width() {
        let long = "x".repeat(100);
        let clipped = clip(&long, 60);
        assert_eq!(clipped.chars().count(), 60);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn test_clip_is_char_boundary_safe() {
        let long = "é".repeat(100);
        let clipped = clip(&long, 10);
        assert_eq!(clipped.chars().count(), 10);
    }

    #[test]
    fn test_format_date_fallback() {
        assert_eq!(format_date(None), "unknown date");
    }
}
