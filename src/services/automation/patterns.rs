//! Prompt activity pattern analysis.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::{Prompt, PromptStatus};
use crate::services::generation::strip_markup;

/// Summary of recent prompt activity. Read-only, never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    /// Lookback window in days
    pub window_days: i64,
    /// Prompts created in the window (debug sessions excluded)
    pub total_prompts: usize,
    /// Of those, how many are done
    pub completed: usize,
    /// completed / total, 0 when the window is empty
    pub completion_rate: f64,
    /// Up to three most active creation hours (0-23), busiest first
    pub top_hours: Vec<u32>,
    /// Up to ten most frequent keywords longer than three characters
    pub top_keywords: Vec<(String, usize)>,
    /// Mean hours from creation to completion for done prompts
    pub avg_completion_hours: Option<f64>,
}

/// Analyze prompts created inside the lookback window.
pub fn analyze(rows: &[Prompt], window_days: i64, now: DateTime<Utc>) -> PatternReport {
    let cutoff = now - Duration::days(window_days);
    let window: Vec<&Prompt> = rows
        .iter()
        .filter(|p| !p.is_debug_session && p.created_at >= cutoff)
        .collect();

    let completed: Vec<&&Prompt> = window
        .iter()
        .filter(|p| p.status == PromptStatus::Done)
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let completion_rate = if window.is_empty() {
        0.0
    } else {
        completed.len() as f64 / window.len() as f64
    };

    let avg_completion_hours = if completed.is_empty() {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        let total_hours: f64 = completed
            .iter()
            .map(|p| (p.updated_at - p.created_at).num_minutes() as f64 / 60.0)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        Some(total_hours / completed.len() as f64)
    };

    PatternReport {
        window_days,
        total_prompts: window.len(),
        completed: completed.len(),
        completion_rate,
        top_hours: top_hours(&window),
        top_keywords: top_keywords(&window),
        avg_completion_hours,
    }
}

fn top_hours(window: &[&Prompt]) -> Vec<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for prompt in window {
        *counts.entry(prompt.created_at.hour()).or_default() += 1;
    }
    let mut hours: Vec<(u32, usize)> = counts.into_iter().collect();
    // Busiest first, earliest hour on ties so the output is stable
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours.into_iter().take(3).map(|(hour, _)| hour).collect()
}

fn top_keywords(window: &[&Prompt]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for prompt in window {
        let text = match &prompt.description {
            Some(desc) => format!("{} {}", prompt.title, strip_markup(desc)),
            None => prompt.title.clone(),
        };
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 3)
        {
            *counts.entry(word.to_string()).or_default() += 1;
        }
    }
    let mut keywords: Vec<(String, usize)> = counts.into_iter().collect();
    keywords.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    keywords.truncate(10);
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PromptId;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn prompt_at(title: &str, created_at: DateTime<Utc>) -> Prompt {
        let mut p = Prompt::new(Uuid::new_v4(), title);
        p.id = PromptId::persisted(Uuid::new_v4());
        p.created_at = created_at;
        p.updated_at = created_at;
        p
    }

    #[test]
    fn test_window_filtering() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let inside = prompt_at("Recent work", now - Duration::days(2));
        let outside = prompt_at("Old work", now - Duration::days(30));
        let mut debug = prompt_at("Debug scratch", now - Duration::days(1));
        debug.is_debug_session = true;

        let report = analyze(&[inside, outside, debug], 7, now);
        assert_eq!(report.total_prompts, 1);
    }

    #[test]
    fn test_completion_rate_and_duration() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut done = prompt_at("Shipped", now - Duration::days(3));
        done.status = PromptStatus::Done;
        done.updated_at = done.created_at + Duration::hours(6);
        let open = prompt_at("Open", now - Duration::days(1));

        let report = analyze(&[done, open], 7, now);
        assert_eq!(report.completed, 1);
        assert!((report.completion_rate - 0.5).abs() < f64::EPSILON);
        assert!((report.avg_completion_hours.unwrap() - 6.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_window() {
        let report = analyze(&[], 7, Utc::now());
        assert_eq!(report.total_prompts, 0);
        assert!(report.completion_rate.abs() < f64::EPSILON);
        assert!(report.avg_completion_hours.is_none());
        assert!(report.top_hours.is_empty());
    }

    #[test]
    fn test_top_hours_ranked_by_volume() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 23, 0, 0).unwrap();
        let at_hour = |h: u32| {
            Utc.with_ymd_and_hms(2025, 6, 14, h, 30, 0).unwrap()
        };
        let rows = vec![
            prompt_at("a", at_hour(9)),
            prompt_at("b", at_hour(9)),
            prompt_at("c", at_hour(9)),
            prompt_at("d", at_hour(14)),
            prompt_at("e", at_hour(14)),
            prompt_at("f", at_hour(20)),
        ];

        let report = analyze(&rows, 7, now);
        assert_eq!(report.top_hours, vec![9, 14, 20]);
    }

    #[test]
    fn test_keywords_skip_short_words_and_markup() {
        let now = Utc::now();
        let mut row = prompt_at("Improve billing flows", now - Duration::hours(1));
        row.description = Some("<p>billing exports and billing reports</p>".to_string());

        let report = analyze(&[row], 7, now);
        let billing = report
            .top_keywords
            .iter()
            .find(|(word, _)| word == "billing")
            .unwrap();
        assert_eq!(billing.1, 3);
        assert!(!report.top_keywords.iter().any(|(word, _)| word == "and"));
    }
}
