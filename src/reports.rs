use crate::api::{
    DEFAULT_AGGREGATE_YEARS, DEFAULT_FORECAST_YEARS, DEFAULT_REGIONS, DEFAULT_SEASON,
    DEFAULT_SEASONS,
};
use crate::forecast::{forecast_by_crop, forecast_year};
use crate::output::{preview_table, write_csv, write_json};
use crate::types::{AggregateRow, ForecastRow, InsightsSummary, Record};
use crate::util::{format_int, format_number, round2};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::error;

/// Keep the records whose region, season and year are all requested.
///
/// Matching is exact and case-sensitive; the output keeps dataset order.
pub fn filter_rows<'a>(
    data: &'a [Record],
    regions: &[String],
    seasons: &[String],
    years: &[i32],
) -> Vec<&'a Record> {
    let regions: HashSet<&str> = regions.iter().map(String::as_str).collect();
    let seasons: HashSet<&str> = seasons.iter().map(String::as_str).collect();
    let years: HashSet<i32> = years.iter().copied().collect();

    data.iter()
        .filter(|r| {
            regions.contains(r.region.as_str())
                && seasons.contains(r.season.as_str())
                && years.contains(&r.year)
        })
        .collect()
}

/// Total supply and demand per crop, sorted by crop name.
pub fn aggregate_by_crop(rows: &[&Record]) -> Vec<AggregateRow> {
    #[derive(Default)]
    struct Acc {
        supply: f64,
        demand: f64,
    }

    let mut map: HashMap<&str, Acc> = HashMap::new();
    for r in rows {
        let e = map.entry(r.crop.as_str()).or_default();
        e.supply += r.supply();
        e.demand += r.demand();
    }

    let mut out: Vec<AggregateRow> = map
        .into_iter()
        .map(|(crop, acc)| AggregateRow {
            crop: crop.to_string(),
            total_supply_t: round2(acc.supply),
            total_demand_t: round2(acc.demand),
            positive_gap_t: round2(positive_gap(acc.supply, acc.demand)),
        })
        .collect();
    out.sort_by(|a, b| a.crop.cmp(&b.crop));
    out
}

/// Unmet demand; a surplus reports zero.
pub fn positive_gap(supply: f64, demand: f64) -> f64 {
    (demand - supply).max(0.0)
}

/// `forecast_year` is passed in because an empty forecast still has a horizon.
pub fn generate_summary(
    aggregate: &[AggregateRow],
    forecast: &[ForecastRow],
    forecast_year: Option<i32>,
) -> InsightsSummary {
    InsightsSummary {
        crops: aggregate.len(),
        total_supply_t: round2(aggregate.iter().map(|r| r.total_supply_t).sum()),
        total_demand_t: round2(aggregate.iter().map(|r| r.total_demand_t).sum()),
        total_positive_gap_t: round2(aggregate.iter().map(|r| r.positive_gap_t).sum()),
        forecast_year,
        total_forecast_gap_t: round2(forecast.iter().map(|r| r.forecast_positive_gap_t).sum()),
    }
}

pub const AGGREGATE_REPORT_FILE: &str = "aggregate_report.csv";
pub const FORECAST_REPORT_FILE: &str = "forecast_report.csv";
pub const SUMMARY_FILE: &str = "insights_summary.json";

/// Run the default aggregate and forecast, print a preview of each, and
/// write them under `out_dir`.
///
/// Every output is attempted; the returned list holds one outcome per file.
pub fn write_report(
    dataset: &[Record],
    out_dir: &Path,
    preview_rows: usize,
) -> Vec<(PathBuf, Result<(), Box<dyn Error>>)> {
    let regions: Vec<String> = DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect();
    let seasons: Vec<String> = DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect();

    let rows = filter_rows(dataset, &regions, &seasons, &DEFAULT_AGGREGATE_YEARS);
    let aggregate = aggregate_by_crop(&rows);

    let forecast_seasons = [DEFAULT_SEASON.to_string()];
    let rows = filter_rows(dataset, &regions, &forecast_seasons, &DEFAULT_FORECAST_YEARS);
    let forecast = forecast_by_crop(&rows, &DEFAULT_FORECAST_YEARS, DEFAULT_SEASON);

    if let Err(e) = std::fs::create_dir_all(out_dir) {
        error!("Cannot create {}: {e}", out_dir.display());
    }
    let mut outcomes = Vec::with_capacity(3);

    println!("Historical Supply vs Demand");
    println!(
        "({} | {} | {:?})\n",
        regions.join(", "),
        seasons.join(", "),
        DEFAULT_AGGREGATE_YEARS
    );
    println!("{}\n", preview_table(&aggregate, preview_rows));
    let file = out_dir.join(AGGREGATE_REPORT_FILE);
    let result = write_csv(&file, &aggregate);
    report_outcome(&file, &result);
    outcomes.push((file, result));

    println!("Next-Year Forecast");
    println!("({} season, trained on {:?})\n", DEFAULT_SEASON, DEFAULT_FORECAST_YEARS);
    println!("{}\n", preview_table(&forecast, preview_rows));
    let file = out_dir.join(FORECAST_REPORT_FILE);
    let result = write_csv(&file, &forecast);
    report_outcome(&file, &result);
    outcomes.push((file, result));

    let summary = generate_summary(
        &aggregate,
        &forecast,
        forecast_year(&DEFAULT_FORECAST_YEARS),
    );
    let file = out_dir.join(SUMMARY_FILE);
    let result = write_json(&file, &summary);
    report_outcome(&file, &result);
    outcomes.push((file, result));

    println!(
        "Summary Stats: {{\"crops\": {}, \"total_positive_gap_t\": {}, \"total_forecast_gap_t\": {}}}\n",
        format_int(summary.crops),
        format_number(summary.total_positive_gap_t, 2),
        format_number(summary.total_forecast_gap_t, 2)
    );
    outcomes
}

fn report_outcome(file: &Path, result: &Result<(), Box<dyn Error>>) {
    match result {
        Ok(()) => println!("(Exported to {})\n", file.display()),
        Err(e) => error!("Write error for {}: {e}", file.display()),
    }
}
