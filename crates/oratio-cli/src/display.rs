//! Terminal rendering of run reports and corpus summaries.

use oratio_engine::{RunReport, RunStatus};
use oratio_store::ClassificationSummary;

const RULE_WIDTH: usize = 70;

/// Print the terminal accounting of one classification run.
pub fn print_run_report(report: &RunReport) {
    println!("{}", "=".repeat(RULE_WIDTH));
    match report.status {
        RunStatus::Completed => println!("CLASSIFICATION COMPLETE"),
        RunStatus::BudgetAborted => println!("CLASSIFICATION ABORTED: BUDGET CEILING REACHED"),
    }
    println!("{}", "=".repeat(RULE_WIDTH));
    println!();
    println!("  {:<26} {}", "debates found", report.total_debates);
    println!("  {:<26} {}", "processed", report.processed);
    println!("  {:<26} {}", "skipped (no keywords)", report.skipped);
    println!("  {:<26} {}", "LLM analyzed", report.llm_analyzed);
    println!("  {:<26} {}", "related", report.related);
    println!();
    println!("  {:<26} {}", "input tokens", report.input_tokens);
    println!("  {:<26} {}", "output tokens", report.output_tokens);
    println!(
        "  {:<26} ${:.2} of ${:.2}",
        "cost", report.cost_usd, report.budget_usd
    );

    if report.status == RunStatus::BudgetAborted {
        println!();
        println!(
            "  {} of {} debates remain unprocessed; re-run with a narrower",
            report.remaining(),
            report.total_debates
        );
        println!("  date filter or a fresh budget to continue");
    }
}

/// Print related/total counts for a classified corpus.
pub fn print_summary(summary: &ClassificationSummary) {
    println!();
    println!("{}", "-".repeat(RULE_WIDTH));
    println!(
        "  {:<26} {} of {}",
        "related debates", summary.related_debates, summary.total_debates
    );
    println!(
        "  {:<26} {} of {}",
        "related speeches", summary.related_speeches, summary.total_speeches
    );
    println!("{}", "-".repeat(RULE_WIDTH));
}
