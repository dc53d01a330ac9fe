use crate::error::LoadError;
use crate::types::{RawRow, Record};
use crate::util::{format_int, parse_f64_safe, parse_i32_safe};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

/// Read and clean every row of the dataset at `path`.
///
/// Rows that fail to decode, or whose `Year` is not a whole number, are
/// counted in the report and skipped. Numeric columns never cause a skip.
pub fn load_and_clean(path: &Path) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.display().to_string(),
            source,
        })?;
    rdr.headers()?;

    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;
    let mut records: Vec<Record> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = total_rows, "skipping undecodable dataset row: {e}");
                skipped_rows += 1;
                continue;
            }
        };

        let Some(year) = parse_i32_safe(row.year.as_deref()) else {
            warn!(
                row = total_rows,
                year = ?row.year,
                "skipping dataset row without a whole-number Year"
            );
            skipped_rows += 1;
            continue;
        };

        records.push(Record {
            region: clean_text(row.region),
            season: clean_text(row.season),
            crop: clean_text(row.crop),
            year,
            area_cultivated_ha: parse_f64_safe(row.area_cultivated_ha.as_deref()),
            yield_t_per_ha: parse_f64_safe(row.yield_t_per_ha.as_deref()),
            total_production_t: parse_f64_safe(row.total_production_t.as_deref()),
            total_demand_t: parse_f64_safe(row.total_demand_t.as_deref()),
            market_price_rs_per_kg: parse_f64_safe(row.market_price_rs_per_kg.as_deref()),
            supply_demand_gap_pct: parse_f64_safe(row.supply_demand_gap_pct.as_deref()),
        });
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        skipped_rows,
    };
    Ok((records, report))
}

/// Startup entry point: a dataset that cannot be read degrades to an empty
/// one so every endpoint keeps answering with empty results.
pub fn load_or_empty(path: &Path) -> Vec<Record> {
    match load_and_clean(path) {
        Ok((records, report)) => {
            info!(
                "Loaded dataset rows: {} ({} read, {} skipped)",
                format_int(report.loaded_rows),
                format_int(report.total_rows),
                format_int(report.skipped_rows)
            );
            records
        }
        Err(e) => {
            error!("Failed to load dataset at {}: {e}", path.display());
            Vec::new()
        }
    }
}

fn clean_text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Region,Season,Crop,Year,Area_Cultivated_ha,Yield_t_per_ha,Total_Production_t,Total_Demand_t,Market_Price_Rs_per_kg,Supply_Demand_Gap_%\n";

    fn dataset(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(HEADER.as_bytes()).expect("header");
        file.write_all(body.as_bytes()).expect("body");
        file.flush().expect("flush");
        file
    }

    #[test]
    fn loads_and_coerces_columns() {
        let file = dataset(
            "Ratnapura,Maha,Rice,2024,10,4.5,\"1,200.5\",1300,120,-7.7\n\
             Kegalle , Yala ,Maize,2023.0,,,n/a,80,,\n",
        );
        let (records, report) = load_and_clean(file.path()).expect("load");

        assert_eq!(report, LoadReport { total_rows: 2, loaded_rows: 2, skipped_rows: 0 });
        assert_eq!(records[0].crop, "Rice");
        assert_eq!(records[0].total_production_t, Some(1200.5));
        assert_eq!(records[0].supply_demand_gap_pct, Some(-7.7));
        assert_eq!(records[1].region, "Kegalle");
        assert_eq!(records[1].season, "Yala");
        assert_eq!(records[1].year, 2023);
        assert_eq!(records[1].total_production_t, None);
        assert_eq!(records[1].supply(), 0.0);
        assert_eq!(records[1].demand(), 80.0);
    }

    #[test]
    fn skips_rows_without_a_year() {
        let file = dataset(
            "Ratnapura,Maha,Rice,,10,4.5,100,120,120,0\n\
             Ratnapura,Maha,Rice,soon,10,4.5,100,120,120,0\n\
             Ratnapura,Maha,Rice,2022,10,4.5,100,120,120,0\n",
        );
        let (records, report) = load_and_clean(file.path()).expect("load");

        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_rows, 2);
        assert_eq!(records[0].year, 2022);
    }

    #[test]
    fn preserves_source_order() {
        let file = dataset(
            "Kegalle,Maha,Tea,2025,1,1,1,1,1,1\n\
             Ratnapura,Maha,Banana,2022,1,1,1,1,1,1\n",
        );
        let (records, _) = load_and_clean(file.path()).expect("load");
        let crops: Vec<&str> = records.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(crops, ["Tea", "Banana"]);
    }

    #[test]
    fn missing_file_is_an_error_but_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.csv");

        assert!(matches!(load_and_clean(&path), Err(LoadError::Open { .. })));
        assert!(load_or_empty(&path).is_empty());
    }
}
