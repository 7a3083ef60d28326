//! Reporting handlers for the sales and filter reports and the dashboard

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::report::{sales_report_file_name, InventoryCounts};

use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::services::reporting::{resolve_period, WeekShortcut};
use crate::services::ReportingService;
use crate::AppState;

/// Output format of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    pub inicio: Option<NaiveDate>,
    pub fin: Option<NaiveDate>,
    /// "actual" or "pasada"
    pub semana: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Deserialize)]
pub struct FiltersReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(state.store.clone(), state.config.reports.clone())
}

fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

/// Weekly sales report
pub async fn get_sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Response> {
    let week = query
        .semana
        .as_deref()
        .map(str::parse::<WeekShortcut>)
        .transpose()?;
    let period = resolve_period(query.inicio, query.fin, week, Utc::now().date_naive())?;

    let report = service(&state).sales_report(period).await?;

    match query.format {
        ReportFormat::Json => Ok(ok(report).into_response()),
        ReportFormat::Csv => {
            let csv = ReportingService::sales_report_to_csv(&report)?;
            Ok(csv_attachment(&sales_report_file_name(&period, "csv"), csv))
        }
    }
}

/// Filters in stock, grouped by type
pub async fn get_filters_report(
    State(state): State<AppState>,
    Query(query): Query<FiltersReportQuery>,
) -> AppResult<Response> {
    let groups = service(&state).filters_report().await?;

    match query.format {
        ReportFormat::Json => Ok(ok(groups).into_response()),
        ReportFormat::Csv => {
            let csv = ReportingService::filters_to_csv(&groups)?;
            let file_name = format!(
                "GTM_Stock_Filtros_{}.csv",
                Utc::now().date_naive().format("%Y-%m-%d")
            );
            Ok(csv_attachment(&file_name, csv))
        }
    }
}

/// Inventory counts for the dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<InventoryCounts>>> {
    let counts = service(&state).dashboard().await?;
    Ok(ok(counts))
}
