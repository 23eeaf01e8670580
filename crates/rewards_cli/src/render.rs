//! Plain-text presentation of board sections.
//!
//! # Responsibility
//! - Turn core values into the lines printed by each subcommand.
//! - Stay free of I/O so every line format is unit-testable.

use chrono::{DateTime, Utc};
use rewards_core::{
    CompletionOutcome, CompletionRecord, GoalError, GoalProgress, RetrievalError, Section, Task,
    TotalSource,
};

const BAR_WIDTH: usize = 20;

pub fn task_lines(tasks: Option<&Section<Vec<Task>>>) -> Vec<String> {
    let Some(section) = tasks else {
        return vec!["Loading tasks...".to_string()];
    };
    if section.data.is_empty() {
        return vec!["No tasks found.".to_string()];
    }

    let mut lines = Vec::new();
    for task in &section.data {
        lines.push(format!("[{}] {} — {} pts", task.id, task.name, task.points));
        let mut details = Vec::new();
        if !task.category.is_empty() {
            details.push(format!("Category: {}", task.category));
        }
        if !task.recurrence.is_empty() {
            details.push(format!("Recurrence: {}", task.recurrence));
        }
        if !details.is_empty() {
            lines.push(format!("    {}", details.join(" | ")));
        }
        if let Some(description) = &task.description {
            lines.push(format!("    {description}"));
        }
    }
    lines
}

pub fn history_lines(history: &[CompletionRecord]) -> Vec<String> {
    if history.is_empty() {
        return vec!["No completed tasks yet.".to_string()];
    }
    history
        .iter()
        .map(|record| {
            let name = match &record.task_name {
                Some(name) => name.clone(),
                None => format!("task #{}", record.event.task_id),
            };
            let points = record
                .task_points
                .map_or_else(|| "?".to_string(), |points| points.to_string());
            format!(
                "✅ {name} — {points} pts ({})",
                format_day(record.event.completed_at)
            )
        })
        .collect()
}

pub fn total_line(total: u64, source: TotalSource) -> String {
    match source {
        TotalSource::View => format!("Total points: {total}"),
        TotalSource::Ledger => format!("Total points: {total} (from history)"),
    }
}

pub fn goal_lines(goals: &[Result<GoalProgress, GoalError>]) -> Vec<String> {
    goals
        .iter()
        .map(|result| match result {
            Ok(progress) => format!(
                "{}: {} / {} points {} {:.1}%",
                progress.label,
                progress.total,
                progress.target,
                progress_bar(progress.percent),
                progress.percent
            ),
            Err(err) => {
                let GoalError::InvalidGoal { label, .. } = err;
                format!("{label}: unavailable ({err})")
            }
        })
        .collect()
}

pub fn outcome_line(outcome: &CompletionOutcome, points: Option<u32>) -> String {
    match outcome {
        CompletionOutcome::Recorded(_) => match points {
            Some(points) => format!("Task completed! +{points} pts"),
            None => "Task completed!".to_string(),
        },
        CompletionOutcome::Duplicate(_) => "This task was already completed today.".to_string(),
    }
}

pub fn warning_line(warning: &RetrievalError) -> String {
    format!("warning: {warning}")
}

/// Completion date as `dd/mm/yyyy`.
pub fn format_day(instant: DateTime<Utc>) -> String {
    instant.format("%d/%m/%Y").to_string()
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
