//! Human-readable tables for run results and history

use mcp_judge_core::report::RunRecord;
use mcp_judge_core::runner::{ModelRun, QuestionResult, RunSummary};

const QUESTION_WIDTH: usize = 50;
const REASON_WIDTH: usize = 40;

/// Shorten `text` to at most `max` characters, ending in "..." when cut.
/// Newlines are flattened so each row stays on one line.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn print_summary(summary: &RunSummary) {
    println!("\n--- {} ---", summary.model);
    println!(
        "Passed: {}/{} ({:.1}%)",
        summary.passed, summary.total, summary.success_rate
    );
    println!("Failed: {}", summary.failed);
    if summary.errored > 0 {
        println!("Errors: {}", summary.errored);
    }
}

pub fn print_results_table(results: &[QuestionResult]) {
    println!(
        "{:<4} {:<50} {:<10} {:<5} {}",
        "#", "Question", "Score", "Pass", "Reason"
    );
    println!("{}", "-".repeat(4 + 1 + 50 + 1 + 10 + 1 + 5 + 1 + REASON_WIDTH));

    for result in results {
        let score = match &result.score {
            Some(score) => score.to_string(),
            None => "-".to_string(),
        };
        let pass = if result.error {
            "ERR"
        } else if result.passed {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<4} {:<50} {:<10} {:<5} {}",
            result.question_index + 1,
            truncate(&result.question, QUESTION_WIDTH),
            truncate(&score, 10),
            pass,
            truncate(&result.reasoning, REASON_WIDTH)
        );
    }
}

pub fn print_run(run: &ModelRun) {
    print_summary(&run.summary());
    println!();
    print_results_table(&run.results);
}

pub fn print_history(records: &[RunRecord]) {
    println!(
        "{:<30} {:<20} {:<20} {:<8} {:<8}",
        "Run", "Timestamp", "Model", "Passed", "Rate"
    );
    println!("{}", "-".repeat(90));

    for record in records {
        let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let marker = if record.cancelled { " (cancelled)" } else { "" };
        for summary in &record.summaries {
            let passed = format!("{}/{}", summary.passed, summary.total);
            let rate = format!("{:.1}%", summary.success_rate);
            println!(
                "{:<30} {:<20} {:<20} {:<8} {:<8}{}",
                record.run_id,
                timestamp,
                truncate(&summary.model, 20),
                passed,
                rate,
                marker
            );
        }
    }
}

pub fn print_record(record: &RunRecord) {
    println!("Run: {}", record.run_id);
    println!("Timestamp: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Evaluator: {}", record.evaluator);
    println!("Questions: {}", record.questions_file);
    if record.cancelled {
        println!("Cancelled: yes");
    }

    for summary in &record.summaries {
        println!("\n--- {} ---", summary.model);
        println!(
            "Passed: {}/{} ({:.1}%)",
            summary.passed, summary.total, summary.success_rate
        );
        println!("Failed: {}", summary.failed);
        if summary.errored > 0 {
            println!("Errors: {}", summary.errored);
        }
    }
}
