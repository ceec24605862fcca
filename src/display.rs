//! Colored CLI display for session listings.
//!
//! Used by the one-shot scan command; the serve path reports through
//! tracing and the HTTP API instead.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::store::{Session, SessionStatus};

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of chars, adding ellipsis.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Compact "time since" form for a last-activity timestamp.
#[must_use]
pub fn format_age(last_activity: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - last_activity).num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn status_tag(status: SessionStatus) -> String {
    match status {
        SessionStatus::Active => "[ACTIVE]".green().bold().to_string(),
        SessionStatus::Idle => "[IDLE]".yellow().bold().to_string(),
        SessionStatus::Completed => "[DONE]".blue().bold().to_string(),
        SessionStatus::Error => "[ERROR]".red().bold().to_string(),
    }
}

/// Print one session as a short block.
pub fn print_session(session: &Session, now: DateTime<Utc>) {
    let model = session.model_short.as_deref().unwrap_or("unknown model");
    let marker = if session.is_sub_agent { " agent" } else { "" };

    println!(
        "{} {} {}{}  {}  ${:.4}  {} tok",
        status_tag(session.status),
        truncate(&session.id, 20).dimmed(),
        model.cyan(),
        marker.magenta(),
        format_age(session.last_activity, now).dimmed(),
        session.estimated_cost,
        session.tokens.total,
    );

    if let Some(cwd) = &session.cwd {
        let branch = session
            .git_branch
            .as_deref()
            .map_or(String::new(), |branch| format!(" ({branch})"));
        println!(
            "    {}{}",
            truncate(cwd, DEFAULT_MAX_LEN).dimmed(),
            branch.dimmed()
        );
    }
    if let Some(prompt) = &session.last_prompt {
        println!("    prompt: {}", truncate(prompt, DEFAULT_MAX_LEN));
    }
    if let Some(tool) = &session.current_tool {
        let detail = tool
            .detail
            .as_deref()
            .map_or(String::new(), |detail| format!(" ({})", truncate(detail, 50)));
        println!("    {} {}{}", "tool:".cyan(), tool.name.bold(), detail.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print the session list with a trailing count line.
pub fn print_sessions(sessions: &[Session], now: DateTime<Utc>) {
    for session in sessions {
        print_session(session, now);
    }
    let active = sessions
        .iter()
        .filter(|session| session.status == SessionStatus::Active)
        .count();
    println!(
        "{} session(s), {} active",
        sessions.len().bold(),
        active.to_string().green()
    );
    let _ = io::stdout().flush();
}
