//! Reporting service: weekly sales report, filter stock report and the
//! dashboard inventory counts, with CSV export

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use shared::report::{
    build_sales_report, inventory_counts, organize_filters, FilterEntry, FiltersByType,
    InventoryCounts, SalesReport,
};
use shared::types::DateRange;
use tracing::info;

use super::{AnnotationService, ProductService, ToolService, WorkshopService};
use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};
use crate::store::DocumentStore;

pub const EMPTY_PERIOD: &str = "No hay anotaciones en el período seleccionado";

/// Which week the `semana` shortcut refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekShortcut {
    Current,
    Previous,
}

impl std::str::FromStr for WeekShortcut {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "actual" => Ok(WeekShortcut::Current),
            "pasada" => Ok(WeekShortcut::Previous),
            other => Err(AppError::validation(
                "semana",
                format!("Semana desconocida: {} (use \"actual\" o \"pasada\")", other),
            )),
        }
    }
}

/// Work out the report period from explicit dates or a week shortcut
pub fn resolve_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    week: Option<WeekShortcut>,
    today: NaiveDate,
) -> AppResult<DateRange> {
    match (week, start, end) {
        (Some(WeekShortcut::Current), _, _) => Ok(DateRange::week_of(today)),
        (Some(WeekShortcut::Previous), _, _) => Ok(DateRange::previous_week_of(today)),
        (None, Some(start), Some(end)) => {
            DateRange::new(start, end).map_err(|msg| AppError::validation("inicio", msg))
        }
        (None, _, _) => Err(AppError::validation(
            "inicio",
            "Seleccione fecha de inicio y fecha fin",
        )),
    }
}

/// One row of the filter stock CSV
#[derive(Debug, Serialize)]
struct FilterRow<'a> {
    grupo: &'static str,
    codigo: &'a str,
    marca: &'a str,
    descripcion: &'a str,
    stock: i64,
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn DocumentStore>,
    config: ReportsConfig,
}

impl ReportingService {
    pub fn new(store: Arc<dyn DocumentStore>, config: ReportsConfig) -> Self {
        Self { store, config }
    }

    /// Sales report for every annotation dated within `period`
    #[tracing::instrument(skip(self))]
    pub async fn sales_report(&self, period: DateRange) -> AppResult<SalesReport> {
        // Reads only, the attempt count is irrelevant here
        let annotations = AnnotationService::new(self.store.clone(), 1)
            .list_in_range(&period)
            .await?;
        if annotations.is_empty() {
            return Err(AppError::NotFound(EMPTY_PERIOD.to_string()));
        }

        let products = ProductService::new(self.store.clone()).all().await?;
        let report = build_sales_report(
            &self.config.business_name,
            period,
            &annotations,
            &products,
            self.config.estimated_markup,
        );

        info!(
            annotations = annotations.len(),
            lines = report.lines.len(),
            total_ventas = %report.summary.total_sales,
            "Sales report generated"
        );
        Ok(report)
    }

    /// Filters in stock grouped by type
    pub async fn filters_report(&self) -> AppResult<FiltersByType> {
        let products = ProductService::new(self.store.clone()).all().await?;
        Ok(organize_filters(&products))
    }

    /// Counts and inventory value for the dashboard
    pub async fn dashboard(&self) -> AppResult<InventoryCounts> {
        let products = ProductService::new(self.store.clone()).all().await?;
        let workshop_items = WorkshopService::new(self.store.clone()).count().await?;
        let tools = ToolService::new(self.store.clone()).count().await?;

        Ok(inventory_counts(
            &products,
            workshop_items,
            tools,
            self.config.low_stock_threshold,
        ))
    }

    /// Export records as CSV with a header row
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        Self::finish_csv(wtr)
    }

    /// Sales report lines followed by the summary rows
    pub fn sales_report_to_csv(report: &SalesReport) -> AppResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(vec![]);

        for line in &report.lines {
            wtr.serialize(line)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let summary = &report.summary;
        let rows = [
            ("Total ventas", summary.total_sales.to_string()),
            ("Total costos", summary.total_costs.to_string()),
            ("Total ganancias", summary.total_profit.to_string()),
            ("Margen promedio (%)", summary.average_margin.to_string()),
        ];
        wtr.write_record(std::iter::empty::<&str>())
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        for (label, value) in rows {
            wtr.write_record([label, value.as_str()])
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        }

        Self::finish_csv(wtr)
    }

    /// Filter stock report, one row per filter with its group
    pub fn filters_to_csv(groups: &FiltersByType) -> AppResult<String> {
        let grouped: [(&'static str, &Vec<FilterEntry>); 4] = [
            ("Aceite", &groups.aceite),
            ("Combustible", &groups.combustible),
            ("Aire", &groups.aire),
            ("Habitáculo", &groups.habitaculo),
        ];
        let rows: Vec<FilterRow<'_>> = grouped
            .iter()
            .flat_map(|(grupo, entries)| {
                entries.iter().map(move |entry| FilterRow {
                    grupo: *grupo,
                    codigo: &entry.code,
                    marca: &entry.brand,
                    descripcion: &entry.description,
                    stock: entry.stock,
                })
            })
            .collect();

        Self::export_to_csv(&rows)
    }

    fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> AppResult<String> {
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
