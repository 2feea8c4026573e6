//! synthsim command-line front end.
//!
//! Usage:
//!   synthsim run --config run.toml --output results.csv
//!   synthsim sweep --config run.toml --roll-months 1,3,6,12 --margin-pct 0.2,0.25
//!   synthsim carry --config run.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use synthsim::carry::overlay::CarryOverlayResult;
use synthsim::io::write_results_file;
use synthsim::metrics::{yearly_comparison, Metrics};
use synthsim::simulation::{initial_margin_check, simulate, BenchmarkReport, MarginBreachPolicy};
use synthsim::sweep::{run_sweep, SweepGrid};
use synthsim::RunConfig;

/// Funding simulator for synthetic long equity exposure
#[derive(Parser, Debug)]
#[command(name = "synthsim")]
#[command(about = "Simulate rolls, margin and cash yield of a synthetic long position")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one simulation
    Run {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Results CSV; overrides [output] results_csv
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a grid of parameter variations in parallel
    Sweep {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Roll intervals in months
        #[arg(long, value_delimiter = ',')]
        roll_months: Vec<u32>,

        /// Margin requirements as fractions of notional
        #[arg(long, value_delimiter = ',')]
        margin_pct: Vec<f64>,

        /// Also run every point with liquidation on breach
        #[arg(long)]
        with_liquidation: bool,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the annualized carry curve
    Carry {
        /// Run configuration (TOML) with a [carry] section
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            output,
            json,
        } => run(config, output, json),
        Commands::Sweep {
            config,
            roll_months,
            margin_pct,
            with_liquidation,
            json,
        } => sweep(config, roll_months, margin_pct, with_liquidation, json),
        Commands::Carry { config } => carry(config),
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn run(config_path: PathBuf, output: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let prices = config
        .load_prices()
        .with_context(|| format!("Failed to load prices: {}", config.data.prices_csv.display()))?;
    let rates = config.load_rates().context("Failed to load rates")?;

    let feasibility = initial_margin_check(&prices, &config.simulation);
    if let Some(shortfall) = feasibility.shortfall {
        tracing::warn!(
            initial_margin = feasibility.initial_margin,
            starting_capital = feasibility.starting_capital,
            shortfall,
            "starting cash is below the initial margin"
        );
    }

    let result = simulate(&prices, &config.simulation, rates.as_ref())?;
    info!(
        rows = result.rows.len(),
        rolls = result.roll_events.len(),
        "simulation complete"
    );

    let overlay = config
        .carry_overlay()?
        .map(|overlay| overlay.apply(&result));

    if let Some(path) = output.or_else(|| config.output.results_csv.clone()) {
        write_results_file(&result.rows, &path)
            .with_context(|| format!("Failed to write results: {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }

    let dates = result.dates();
    let yearly = yearly_comparison(&dates, &result.synthetic_equity(), &result.benchmark_equity());
    let benchmarks = config
        .benchmark_reports(&dates)
        .context("Failed to load benchmark series")?;

    if json || config.output.json {
        let summary = json!({
            "feasibility": feasibility,
            "metrics": result.metrics,
            "yearly": yearly,
            "benchmarks": benchmarks,
            "carry": overlay.as_ref().map(|o| json!({
                "total_carry_cost": o.total_carry_cost,
                "total_roll_cost": o.total_roll_cost,
                "adjusted": o.adjusted,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_metrics(&result.metrics);
    if let Some(overlay) = &overlay {
        print_overlay(overlay);
    }
    if !benchmarks.is_empty() {
        print_benchmarks(&benchmarks);
    }
    if !yearly.is_empty() {
        println!();
        print!("{:<6} {:>11} {:>11} {:>9}", "Year", "Synthetic%", "Benchmark%", "Excess");
        for b in &benchmarks {
            print!(" {:>10}", format!("{}%", b.name));
        }
        println!();
        for y in &yearly {
            print!(
                "{:<6} {:>11.2} {:>11.2} {:>+9.2}",
                y.year, y.synthetic_pct, y.benchmark_pct, y.excess_pp
            );
            for b in &benchmarks {
                match b.yearly.iter().find(|r| r.year == y.year) {
                    Some(r) => print!(" {:>10.2}", r.return_pct),
                    None => print!(" {:>10}", "-"),
                }
            }
            println!();
        }
    }
    Ok(())
}

fn print_benchmarks(benchmarks: &[BenchmarkReport]) {
    println!();
    println!("=== Equal-cash benchmarks ===");
    println!("{:<10} {:>14} {:>9} {:>9}", "Name", "Final", "CAGR%", "MaxDD%");
    for b in benchmarks {
        println!(
            "{:<10} {:>14.2} {:>9.2} {:>9.2}",
            b.name,
            b.summary.final_value,
            b.summary.cagr * 100.0,
            b.summary.max_drawdown * 100.0
        );
    }
}

fn print_metrics(m: &Metrics) {
    println!("=== Synthetic vs Buy & Hold ===");
    println!(
        "Final equity:        {:>14.2} {:>14.2}",
        m.final_synthetic_equity, m.final_benchmark_equity
    );
    println!(
        "CAGR:                {:>13.2}% {:>13.2}%",
        m.cagr_synthetic * 100.0,
        m.cagr_benchmark * 100.0
    );
    println!(
        "Max drawdown:        {:>13.2}% {:>13.2}%",
        m.max_drawdown_synthetic * 100.0,
        m.max_drawdown_benchmark * 100.0
    );
    println!("Peak margin req:     {:>14.2}", m.peak_margin_requirement);
    println!("Total top-ups:       {:>14.2}", m.peak_cumulative_topup);
    println!("Largest top-up:      {:>14.2}", m.peak_single_topup);
    println!("Margin calls:        {:>14}", m.margin_call_count);
    println!("Rolls:               {:>14}", m.roll_count);
    match m.liquidation_date {
        Some(date) => println!("Liquidated on:       {:>14}", date.to_string()),
        None => println!("Liquidated:          {:>14}", "no"),
    }
}

fn print_overlay(overlay: &CarryOverlayResult) {
    println!();
    println!("=== Carry overlay ===");
    println!("Carry cost:          {:>14.2}", overlay.total_carry_cost);
    println!("Roll friction:       {:>14.2}", overlay.total_roll_cost);
    println!("Adjusted equity:     {:>14.2}", overlay.adjusted.final_value);
    println!("Adjusted CAGR:       {:>13.2}%", overlay.adjusted.cagr * 100.0);
    println!("Adjusted max DD:     {:>13.2}%", overlay.adjusted.max_drawdown * 100.0);
}

fn sweep(
    config_path: PathBuf,
    roll_months: Vec<u32>,
    margin_pct: Vec<f64>,
    with_liquidation: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let prices = config.load_prices().context("Failed to load prices")?;
    let rates = config.load_rates().context("Failed to load rates")?;

    let mut grid = SweepGrid::new(config.simulation.clone())
        .roll_intervals(roll_months)
        .margin_pcts(margin_pct);
    if with_liquidation {
        grid = grid.policies([MarginBreachPolicy::TopUp, MarginBreachPolicy::Liquidate]);
    }

    let outcomes = run_sweep(&prices, rates.as_ref(), &grid);
    info!(points = outcomes.len(), "sweep complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    println!(
        "{:>5} {:>7} {:>10} {:>9} {:>9} {:>12} {:>6} {:>11}",
        "Roll", "Margin", "Policy", "CAGR%", "MaxDD%", "TopUps", "Calls", "Liquidated"
    );
    for outcome in &outcomes {
        let p = &outcome.params;
        let policy = match p.margin_breach_policy {
            MarginBreachPolicy::TopUp => "top_up",
            MarginBreachPolicy::Liquidate => "liquidate",
        };
        match (&outcome.metrics, &outcome.error) {
            (Some(m), _) => println!(
                "{:>5} {:>7.3} {:>10} {:>9.2} {:>9.2} {:>12.2} {:>6} {:>11}",
                p.roll_interval_months,
                p.margin_pct,
                policy,
                m.cagr_synthetic * 100.0,
                m.max_drawdown_synthetic * 100.0,
                m.peak_cumulative_topup,
                m.margin_call_count,
                m.liquidation_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            (None, error) => println!(
                "{:>5} {:>7.3} {:>10} error: {}",
                p.roll_interval_months,
                p.margin_pct,
                policy,
                error.as_deref().unwrap_or("unknown")
            ),
        }
    }
    Ok(())
}

fn carry(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let curve = config
        .carry_curve()?
        .context("Config has no [carry] section")?;

    println!("{:>7} {:>12}", "Tenor", "Annual%");
    for &(tenor, rate) in curve.points() {
        println!("{:>6}m {:>12.3}", tenor, rate * 100.0);
    }

    if let Some(overlay) = config.carry_overlay()? {
        println!();
        println!(
            "Carry at target tenor: {:.3}% per year, {:.2} per roll",
            overlay.annual_carry_rate * 100.0,
            overlay.cost_per_roll
        );
    }
    Ok(())
}
