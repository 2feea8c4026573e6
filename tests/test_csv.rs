//! Integration tests for CSV loading, export and the CSV-backed feed.

use std::fs;

use chrono::NaiveDate;

use synthsim::core::types::Date;
use synthsim::feed::{CsvDirectoryFeed, PriceFeed, SeriesRequest};
use synthsim::io::{read_prices_file, read_rates_file, read_results_file, write_results_file, RateUnits};
use synthsim::simulation::{simulate, MarginBreachPolicy, SimulationParameters};
use synthsim::RunConfig;

fn d(y: i32, m: u32, day: u32) -> Date {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const PRICES: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,472.2,473.6,470.5,472.65,466.1,123
2024-01-03,470.4,471.1,468.1,468.79,462.3,123
2024-01-04,468.3,470.9,467.0,467.28,460.8,123
2024-01-05,467.4,470.4,466.4,467.92,461.4,123
2024-01-08,468.4,474.7,468.3,474.60,468.0,123
";

const SSO: &str = "\
Date,Close,Adj Close
2024-01-03,70.0,50.0
2024-01-04,71.0,49.0
2024-01-05,72.0,51.0
";

const RATES: &str = "\
Date,Close
2024-01-02,5.21
2024-01-05,5.23
";

#[test]
fn test_results_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let prices_path = dir.path().join("SPY.csv");
    let rates_path = dir.path().join("IRX.csv");
    fs::write(&prices_path, PRICES).unwrap();
    fs::write(&rates_path, RATES).unwrap();

    let prices = read_prices_file(&prices_path).unwrap();
    let rates = read_rates_file(&rates_path, RateUnits::Percent).unwrap();
    assert_eq!(prices.len(), 5);
    assert_eq!(prices.adj_close()[0], 466.1);

    // 12k barely covers the 11,816.25 initial margin, so the 2024-01-03 drop breaches it.
    let base = SimulationParameters {
        initial_cash: 12_000.0,
        ..Default::default()
    };
    let topped_up = simulate(&prices, &base, Some(&rates)).unwrap();
    assert!((topped_up.rows[0].effective_annual_rate - 0.0521).abs() < 1e-12);
    assert!(topped_up.rows[1].cumulative_topup > 0.0);
    assert!(topped_up.rows.iter().all(|r| !r.liquidated));

    let liquidated = simulate(
        &prices,
        &base.clone().with_policy(MarginBreachPolicy::Liquidate),
        Some(&rates),
    )
    .unwrap();
    assert_eq!(liquidated.liquidation_index(), Some(1));

    for (name, result) in [("topup", &topped_up), ("liquidate", &liquidated)] {
        let out = dir.path().join(format!("{name}.csv"));
        write_results_file(&result.rows, &out).unwrap();

        let header = fs::read_to_string(&out).unwrap();
        assert!(header.starts_with(
            "date,underlying_close,synthetic_notional,margin_requirement,synthetic_equity,\
             free_cash,cumulative_topup,liquidated,benchmark_equity,effective_annual_rate"
        ));

        // Every field, floats included, reloads exactly.
        let loaded = read_results_file(&out).unwrap();
        assert_eq!(loaded, result.rows);
    }
}

#[test]
fn test_csv_feed_window() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("SPY.csv"), PRICES).unwrap();

    let feed = CsvDirectoryFeed::new(dir.path());
    let series = feed
        .get_series(&SeriesRequest::daily("spy", d(2024, 1, 3), d(2024, 1, 5)))
        .unwrap();
    assert_eq!(series.dates(), &[d(2024, 1, 3), d(2024, 1, 4), d(2024, 1, 5)]);
}

#[test]
fn test_run_config_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("SPY.csv"), PRICES).unwrap();
    fs::write(dir.path().join("IRX.csv"), RATES).unwrap();
    fs::create_dir(dir.path().join("etf")).unwrap();
    fs::write(dir.path().join("etf").join("SSO.csv"), SSO).unwrap();
    let config_path = dir.path().join("run.toml");
    fs::write(
        &config_path,
        r#"
[simulation]
initial_cash = 40000
roll_interval_months = 1

[data]
prices_csv = "SPY.csv"
rates_csv = "IRX.csv"
rate_units = "percent"
end = "2024-01-05"

[[data.benchmarks]]
name = "SSO"
csv = "etf/SSO.csv"

[carry]
reference_spot = 472.65
roll_cost_per_contract = 2.0
points = [{ tenor_months = 1, net_debit = 300.0 }, { tenor_months = 3, net_debit = 700.0 }]
"#,
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let prices = config.load_prices().unwrap();
    assert_eq!(prices.len(), 4);

    let rates = config.load_rates().unwrap();
    let result = simulate(&prices, &config.simulation, rates.as_ref()).unwrap();
    let overlay = config.carry_overlay().unwrap().unwrap();
    let expected_rate = 300.0 / 47_265.0 / (1.0 / 12.0);
    assert!((overlay.annual_carry_rate - expected_rate).abs() < 1e-9);

    let adjusted = overlay.apply(&result);
    assert_eq!(adjusted.rows.len(), 4);
    assert!(adjusted.total_carry_cost > 0.0);
    assert_eq!(adjusted.total_roll_cost, 0.0);

    // SSO lists a day late and is back-filled onto the first run date.
    let reports = config.benchmark_reports(&result.dates()).unwrap();
    assert_eq!(reports.len(), 1);
    let sso = &reports[0];
    assert_eq!(sso.name, "SSO");
    assert_eq!(sso.curve, vec![40_000.0, 40_000.0, 39_200.0, 40_800.0]);
    assert!((sso.summary.final_value - 40_800.0).abs() < 1e-9);
    assert!((sso.summary.max_drawdown + 0.02).abs() < 1e-12);
    assert!(sso.summary.cagr > 0.0);
    assert!(sso.yearly.is_empty());

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[0]["name"], "SSO");
    assert!(json[0]["summary"]["final_value"].is_number());
    assert!(json[0].get("curve").is_none());
}

#[test]
fn test_benchmark_without_overlap_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("SPY.csv"), PRICES).unwrap();
    fs::write(dir.path().join("OLD.csv"), "Date,Close\n2019-01-02,10.0\n").unwrap();
    let config_path = dir.path().join("run.toml");
    fs::write(
        &config_path,
        "[data]\nprices_csv = \"SPY.csv\"\nbenchmarks = [{ name = \"OLD\", csv = \"OLD.csv\" }]\n",
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let prices = config.load_prices().unwrap();
    let err = config.benchmark_reports(prices.dates()).unwrap_err();
    assert!(matches!(err, synthsim::SimError::DataUnavailable { .. }));
}
