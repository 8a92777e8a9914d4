use unicode_width::UnicodeWidthStr;

use crate::gateway::models::*;
use crate::view::{Notification, ViewMode, ViewState};

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Format a transcript list as a table.
pub fn print_transcript_list(results: &[Transcript]) {
    if results.is_empty() {
        println!("No transcripts found.");
        return;
    }

    println!("{} transcript{}:\n", results.len(), plural(results.len()));

    println!("  {:<44} {:<12} {:<10}", "TITLE", "CREATED", "STATUS");
    println!("  {}", "-".repeat(68));

    for t in results {
        let date_short = t.created_at.get(..10).unwrap_or(&t.created_at);
        println!(
            "  {:<44} {:<12} {:<10}",
            truncate(&t.title, 42),
            date_short,
            t.status_label(),
        );
        println!("  id: {}\n", t.id);
    }
}

/// Print the history view: mode header, list, pagination hint.
pub fn print_history(view: &ViewState) {
    match view.mode {
        ViewMode::Searching => println!("Search results for \"{}\"", view.search_query),
        ViewMode::Listing => match view.date_range {
            Some(ref r) => println!("Transcripts from {} to {}", r.from, r.to),
            None => println!(
                "History (sorted {}, page {})",
                view.sort_key.as_str(),
                view.page + 1
            ),
        },
        ViewMode::Idle => {}
    }
    print_transcript_list(&view.transcripts);
    if view.mode == ViewMode::Listing && view.date_range.is_none() && view.has_more {
        println!("More transcripts available.");
    }
}

/// Format a single transcript's details for `mta show`.
pub fn print_transcript_detail(t: &Transcript) {
    println!("Transcript: {}", t.title);
    println!("  ID:       {}", t.id);
    println!("  Created:  {}", t.created_at);
    if let Some(ref updated) = t.updated_at {
        println!("  Updated:  {}", updated);
    }
    println!("  Status:   {}", t.status_label());
    println!("  Length:   {} chars", t.content.chars().count());

    if let Some(ref summary) = t.summary {
        if !summary.is_empty() {
            println!("\nSummary:");
            for line in summary.lines() {
                println!("  {line}");
            }
        }
    }

    if let Some(ref points) = t.key_points {
        print_key_points(points);
    }
    if let Some(ref items) = t.action_items {
        print_action_items(items);
    }
}

/// Print an analysis result.
pub fn print_analysis(result: &AnalysisResult) {
    println!("Summary:");
    for line in result.summary.lines() {
        println!("  {line}");
    }

    let mut facts = Vec::new();
    if let Some(d) = result.duration {
        facts.push(format!("duration {d} min"));
    }
    if let Some(p) = result.participant_count {
        facts.push(format!("{p} participant{}", plural(p as usize)));
    }
    if !facts.is_empty() {
        println!("  ({})", facts.join(", "));
    }

    print_key_points(&result.key_points);
    print_action_items(&result.action_items);
}

fn print_key_points(points: &[String]) {
    if points.is_empty() {
        return;
    }
    println!("\nKey Points ({}):", points.len());
    for p in points {
        println!("  - {}", truncate(p, 76));
    }
}

fn print_action_items(items: &[ActionItem]) {
    if items.is_empty() {
        return;
    }
    println!("\nAction Items ({}):", items.len());
    println!(
        "  {:<40} {:<14} {:<12} {:<8} {:<12}",
        "DESCRIPTION", "OWNER", "DEADLINE", "PRIORITY", "STATUS"
    );
    println!("  {}", "-".repeat(88));
    for ai in items {
        println!(
            "  {:<40} {:<14} {:<12} {:<8} {:<12}",
            truncate(&ai.description, 38),
            truncate(ai.owner.as_deref().unwrap_or("-"), 12),
            ai.deadline.as_deref().unwrap_or("-"),
            ai.priority.as_str(),
            ai.status.as_str(),
        );
    }
}

pub fn print_action_item(ai: &ActionItem) {
    print_action_items(std::slice::from_ref(ai));
}

/// Notifications go to stderr so stdout stays clean for `--json`.
pub fn print_notification(n: &Notification) {
    if n.is_error() {
        eprintln!("Error: {}", n.message);
    } else {
        eprintln!("{}", n.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long meeting title", 10), "a very ...");
        assert_eq!(UnicodeWidthStr::width(truncate("会議の議事録とアクション", 10).as_str()), 9);
    }
}
