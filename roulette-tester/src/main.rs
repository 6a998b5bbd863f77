mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{all_scenario_keys, get_scenario, list_scenarios};
use common::{RosterSource, load_roster, split_csv};
use logic::{LogicTester, ScenarioResult, TesterAssets, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "roulette-tester", version)]
#[command(about = "Seeded scenario runner for the Champion Roulette engine")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Champion roster to roll from
    #[arg(long, value_enum, default_value_t = RosterSource::Fixture)]
    roster: RosterSource,

    /// Session config JSON overriding timing and pool defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();

    let config = TesterAssets::load_config(args.config.as_deref())?;
    let roster = load_roster(args.roster).await?;
    let assets = TesterAssets::new(roster, config);
    println!(
        "🎲 Seeds: {} | champions: {} | deck size: {}",
        seed_infos
            .iter()
            .map(|s| s.token.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        assets.roster().len(),
        assets.config().default_pool_size
    );
    log::info!(
        "running {} scenario(s) over {} seed(s)",
        scenarios.len(),
        seeds.len()
    );
    let tester = LogicTester::new(assets, args.verbose);

    let results = run_logic_scenarios(&args, &scenarios, &seeds, &tester);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎰 Champion Roulette Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in all_scenario_keys() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    tester: &LogicTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Champion Roulette Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_game::{FIXTURE_ROSTER_DATA, SessionConfig, parse_ddragon_roster};
    use std::sync::Arc;

    fn base_args() -> Args {
        Args {
            scenarios: "deck-clamp".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            output: None,
            roster: RosterSource::Fixture,
            config: None,
            verbose: false,
        }
    }

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "roulette-tester-{label}-{}.out",
            std::process::id()
        ))
    }

    fn fixture_tester() -> LogicTester {
        let roster: Arc<[_]> = parse_ddragon_roster(FIXTURE_ROSTER_DATA).unwrap().into();
        LogicTester::new(TesterAssets::new(roster, SessionConfig::default()), false)
    }

    #[test]
    fn expand_all_includes_every_scenario_once() {
        let scenarios = expand_scenarios("cancellation,all");
        assert_eq!(scenarios.len(), 9);
        assert_eq!(scenarios[0], "cancellation");
        assert_eq!(
            scenarios.iter().filter(|s| *s == "cancellation").count(),
            1
        );
    }

    #[test]
    fn args_parse_roster_and_config() {
        let args = Args::try_parse_from([
            "roulette-tester",
            "--roster",
            "live",
            "--config",
            "session.json",
            "--report",
            "markdown",
        ])
        .unwrap();
        assert_eq!(args.roster, RosterSource::Live);
        assert_eq!(args.config, Some(PathBuf::from("session.json")));
        assert!(Args::try_parse_from(["roulette-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn json_report_writes_to_file() {
        let path = temp_file("json");
        let mut args = base_args();
        args.output = Some(path.clone());
        let results = run_logic_scenarios(&args, &["deck-clamp".into()], &[1], &fixture_tester());
        write_reports(&args, &results, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["passed"], true);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn markdown_report_handles_no_results() {
        let path = temp_file("markdown");
        let mut args = base_args();
        args.report = "markdown".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_No scenarios executed._"));
        assert!(content.contains("Total time"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn list_scenarios_writes_every_key() {
        let path = temp_file("list");
        let mut args = base_args();
        args.list_scenarios = true;
        args.output = Some(path.clone());
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        for (key, _) in list_scenarios() {
            assert!(content.contains(key), "{key}");
        }
        let _ = std::fs::remove_file(path);
    }
}
