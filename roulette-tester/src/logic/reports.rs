use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::logic::ScenarioResult;

fn totals(results: &[ScenarioResult]) -> (usize, usize, usize, usize) {
    let passed = results.iter().filter(|r| r.passed).count();
    let iterations = results.iter().map(|r| r.iterations_run).sum();
    let successes = results.iter().map(|r| r.successful_iterations).sum();
    (passed, results.len(), successes, iterations)
}

/// # Errors
///
/// Returns an error if the writer fails.
pub fn generate_console_report(
    out: &mut impl Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "{}", "📊 Roulette Test Report".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;

    for result in results {
        let badge = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        writeln!(
            out,
            "{badge} {} (seed {}) {}/{} iterations, avg {:?}",
            result.scenario_name.bright_white(),
            result.seed,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration
        )?;
        for failure in result.failures.iter().take(5) {
            writeln!(out, "    {} {failure}", "↳".red())?;
        }
        if result.failures.len() > 5 {
            writeln!(out, "    … {} more", result.failures.len() - 5)?;
        }
    }

    let (passed, total, successes, iterations) = totals(results);
    writeln!(out)?;
    let summary = format!("{passed}/{total} scenario runs passed ({successes}/{iterations} iterations)");
    if passed == total {
        writeln!(out, "✅ {}", summary.green())?;
    } else {
        writeln!(out, "❌ {}", summary.red())?;
    }
    writeln!(out, "⏱️  Scenario time: {total_duration:?}")?;
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or the writer fails.
pub fn generate_json_report(out: &mut impl Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the writer fails.
pub fn generate_markdown_report(out: &mut impl Write, results: &[ScenarioResult]) -> Result<()> {
    let (passed, total, successes, iterations) = totals(results);
    writeln!(out, "# Champion Roulette Logic Test Results\n")?;
    writeln!(out, "Generated {}\n", chrono::Utc::now().to_rfc3339())?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- Scenario runs passed: {passed}/{total}")?;
    writeln!(out, "- Iterations passed: {successes}/{iterations}\n")?;
    writeln!(out, "## Detailed Results\n")?;
    writeln!(out, "| Scenario | Seed | Status | Iterations | Avg |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {} | {} | {status} | {}/{} | {:?} |",
            result.scenario_name,
            result.seed,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration
        )?;
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failed {
            writeln!(out, "### {} (seed {})\n", result.scenario_name, result.seed)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
