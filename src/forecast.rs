// Next-year supply/demand projection.
//
// Each crop gets its own ordinary least-squares line per series, but every
// crop is evaluated at the same horizon: one year past the latest requested
// year, whether or not that crop has data for it.
use crate::reports::positive_gap;
use crate::types::{ForecastRow, Record};
use crate::util::round2;
use std::collections::{BTreeMap, HashMap};

/// One year past the latest target year, or `None` for an empty request.
pub fn forecast_year(target_years: &[i32]) -> Option<i32> {
    target_years.iter().copied().max().map(|y| y.saturating_add(1))
}

/// Project supply and demand for every crop present in `rows`.
pub fn forecast_by_crop(rows: &[&Record], target_years: &[i32], season: &str) -> Vec<ForecastRow> {
    #[derive(Default)]
    struct Acc {
        supply: f64,
        demand: f64,
    }

    let Some(next_year) = forecast_year(target_years) else {
        return Vec::new();
    };

    // BTreeMap keeps each crop's years ascending for the fit.
    let mut by_crop_year: HashMap<&str, BTreeMap<i32, Acc>> = HashMap::new();
    for r in rows {
        let e = by_crop_year
            .entry(r.crop.as_str())
            .or_default()
            .entry(r.year)
            .or_default();
        e.supply += r.supply();
        e.demand += r.demand();
    }

    let mut out: Vec<ForecastRow> = by_crop_year
        .into_iter()
        .map(|(crop, years)| {
            let xs: Vec<f64> = years.keys().map(|y| f64::from(*y)).collect();
            let supply: Vec<f64> = years.values().map(|a| a.supply).collect();
            let demand: Vec<f64> = years.values().map(|a| a.demand).collect();

            let s_pred = linear_forecast(&xs, &supply, f64::from(next_year));
            let d_pred = linear_forecast(&xs, &demand, f64::from(next_year));

            ForecastRow {
                crop: crop.to_string(),
                forecast_year: next_year,
                forecast_season: season.to_string(),
                forecast_supply_t: round2(s_pred),
                forecast_demand_t: round2(d_pred),
                forecast_positive_gap_t: round2(positive_gap(s_pred, d_pred)),
            }
        })
        .collect();
    out.sort_by(|a, b| a.crop.cmp(&b.crop));
    out
}

/// Least-squares line through `(xs, ys)` evaluated at `at`, floored at zero.
///
/// With fewer than two points the series is projected flat from its last
/// value. `xs` must be sorted ascending and distinct.
pub fn linear_forecast(xs: &[f64], ys: &[f64], at: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return ys[..n].last().copied().unwrap_or(0.0).max(0.0);
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;
    let (mut num, mut den) = (0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x).powi(2);
    }
    let slope = if den == 0.0 { 0.0 } else { num / den };
    let intercept = mean_y - slope * mean_x;

    (intercept + slope * at).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::record;

    #[test]
    fn two_points_give_the_exact_line() {
        let data = vec![
            record("Ratnapura", "Maha", "Rice", 2023, Some(100.0), Some(120.0)),
            record("Ratnapura", "Maha", "Rice", 2024, Some(140.0), Some(130.0)),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let out = forecast_by_crop(&rows, &[2023, 2024], "Maha");

        assert_eq!(
            out,
            vec![ForecastRow {
                crop: "Rice".into(),
                forecast_year: 2025,
                forecast_season: "Maha".into(),
                forecast_supply_t: 180.0,
                forecast_demand_t: 140.0,
                forecast_positive_gap_t: 0.0,
            }]
        );
    }

    #[test]
    fn single_year_is_projected_flat() {
        let data = vec![
            record("Kegalle", "Maha", "Tea", 2022, Some(12.5), Some(30.0)),
            record("Ratnapura", "Maha", "Tea", 2022, Some(7.5), None),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let out = forecast_by_crop(&rows, &[2022, 2023, 2024, 2025], "Maha");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].forecast_year, 2026);
        assert_eq!(out[0].forecast_supply_t, 20.0);
        assert_eq!(out[0].forecast_demand_t, 30.0);
        assert_eq!(out[0].forecast_positive_gap_t, 10.0);
    }

    #[test]
    fn horizon_is_shared_across_crops() {
        let data = vec![
            record("A", "Yala", "Rice", 2022, Some(10.0), Some(10.0)),
            record("A", "Yala", "Rice", 2023, Some(20.0), Some(10.0)),
            record("A", "Yala", "Bean", 2024, Some(5.0), Some(6.0)),
            record("A", "Yala", "Bean", 2025, Some(5.0), Some(8.0)),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let out = forecast_by_crop(&rows, &[2022, 2023, 2024, 2025], "Yala");

        assert_eq!(out[0].crop, "Bean");
        assert_eq!(out[1].crop, "Rice");
        assert!(out.iter().all(|r| r.forecast_year == 2026));
        // Rice's line is evaluated at 2026, three years past its own data.
        assert_eq!(out[1].forecast_supply_t, 50.0);
        assert_eq!(out[0].forecast_demand_t, 10.0);
    }

    #[test]
    fn falling_trend_is_floored_at_zero() {
        let data = vec![
            record("A", "Maha", "Rice", 2023, Some(100.0), Some(50.0)),
            record("A", "Maha", "Rice", 2024, Some(10.0), Some(40.0)),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let out = forecast_by_crop(&rows, &[2023, 2024], "Maha");

        assert_eq!(out[0].forecast_supply_t, 0.0);
        assert_eq!(out[0].forecast_demand_t, 30.0);
        assert_eq!(out[0].forecast_positive_gap_t, 30.0);
    }

    #[test]
    fn same_year_rows_are_summed_before_fitting() {
        let data = vec![
            record("A", "Maha", "Rice", 2023, Some(60.0), Some(0.0)),
            record("B", "Maha", "Rice", 2023, Some(40.0), Some(0.0)),
            record("A", "Maha", "Rice", 2024, Some(110.0), Some(0.0)),
        ];
        let rows: Vec<&Record> = data.iter().collect();
        let out = forecast_by_crop(&rows, &[2023, 2024], "Maha");

        assert_eq!(out[0].forecast_supply_t, 120.0);
    }

    #[test]
    fn no_target_years_means_no_forecast() {
        let data = vec![record("A", "Maha", "Rice", 2023, Some(1.0), Some(1.0))];
        let rows: Vec<&Record> = data.iter().collect();
        assert!(forecast_by_crop(&rows, &[], "Maha").is_empty());
        assert_eq!(forecast_year(&[]), None);
        assert_eq!(forecast_year(&[2025, 2022]), Some(2026));
    }

    #[test]
    fn linear_forecast_edge_cases() {
        assert_eq!(linear_forecast(&[], &[], 2025.0), 0.0);
        assert_eq!(linear_forecast(&[2024.0], &[-3.0], 2025.0), 0.0);
        assert_eq!(linear_forecast(&[2020.0, 2020.0], &[1.0, 3.0], 2025.0), 2.0);
        let v = linear_forecast(&[2021.0, 2022.0, 2023.0], &[1.0, 2.0, 3.0], 2024.0);
        assert!((v - 4.0).abs() < 1e-9);
    }
}
