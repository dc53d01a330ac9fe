use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open dataset {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("cannot read dataset header: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures surfaced by the insights handlers. The client only ever sees
/// the fixed body for the endpoint; the detail goes to the log.
#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("aggregate failed: {0}")]
    Aggregate(String),

    #[error("forecast failed: {0}")]
    Forecast(String),
}

impl IntoResponse for InsightsError {
    fn into_response(self) -> Response {
        let message = match self {
            InsightsError::Aggregate(_) => "aggregate failed",
            InsightsError::Forecast(_) => "forecast failed",
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
