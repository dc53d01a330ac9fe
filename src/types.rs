use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One row of the dataset exactly as it appears in the CSV export of the
/// `Data` sheet. Everything is read as text and cleaned in `loader`.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Season")]
    pub season: Option<String>,
    #[serde(rename = "Crop")]
    pub crop: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Area_Cultivated_ha")]
    pub area_cultivated_ha: Option<String>,
    #[serde(rename = "Yield_t_per_ha")]
    pub yield_t_per_ha: Option<String>,
    #[serde(rename = "Total_Production_t")]
    pub total_production_t: Option<String>,
    #[serde(rename = "Total_Demand_t")]
    pub total_demand_t: Option<String>,
    #[serde(rename = "Market_Price_Rs_per_kg")]
    pub market_price_rs_per_kg: Option<String>,
    #[serde(rename = "Supply_Demand_Gap_%")]
    pub supply_demand_gap_pct: Option<String>,
}

/// A cleaned observation for one region/season/year/crop combination.
///
/// Numeric columns are `None` when the source cell was empty or not a number;
/// sums treat them as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub region: String,
    pub season: String,
    pub crop: String,
    pub year: i32,
    pub area_cultivated_ha: Option<f64>,
    pub yield_t_per_ha: Option<f64>,
    pub total_production_t: Option<f64>,
    pub total_demand_t: Option<f64>,
    pub market_price_rs_per_kg: Option<f64>,
    pub supply_demand_gap_pct: Option<f64>,
}

impl Record {
    pub fn supply(&self) -> f64 {
        self.total_production_t.unwrap_or(0.0)
    }

    pub fn demand(&self) -> f64 {
        self.total_demand_t.unwrap_or(0.0)
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct AggregateRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Total_Supply_t")]
    #[tabled(rename = "Total_Supply_t")]
    pub total_supply_t: f64,
    #[serde(rename = "Total_Demand_t")]
    #[tabled(rename = "Total_Demand_t")]
    pub total_demand_t: f64,
    #[serde(rename = "Positive_Gap_t")]
    #[tabled(rename = "Positive_Gap_t")]
    pub positive_gap_t: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ForecastRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Forecast_Year")]
    #[tabled(rename = "Forecast_Year")]
    pub forecast_year: i32,
    #[serde(rename = "Forecast_Season")]
    #[tabled(rename = "Forecast_Season")]
    pub forecast_season: String,
    #[serde(rename = "Forecast_Supply_t")]
    #[tabled(rename = "Forecast_Supply_t")]
    pub forecast_supply_t: f64,
    #[serde(rename = "Forecast_Demand_t")]
    #[tabled(rename = "Forecast_Demand_t")]
    pub forecast_demand_t: f64,
    #[serde(rename = "Forecast_Positive_Gap_t")]
    #[tabled(rename = "Forecast_Positive_Gap_t")]
    pub forecast_positive_gap_t: f64,
}

#[derive(Debug, Serialize)]
pub struct InsightsSummary {
    pub crops: usize,
    pub total_supply_t: f64,
    pub total_demand_t: f64,
    pub total_positive_gap_t: f64,
    pub forecast_year: Option<i32>,
    pub total_forecast_gap_t: f64,
}
