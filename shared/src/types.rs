//! Common types used across the platform

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default page size of the list screens
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Upper bound accepted for `per_page`
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Build pagination from optional query values, clamping to sane bounds
    pub fn from_query(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// Index of the first element on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Slice an already filtered and ordered list into one page
pub fn paginate<T>(items: Vec<T>, pagination: &Pagination) -> PaginatedResponse<T> {
    let total_items = items.len() as u64;
    let per_page = pagination.per_page.max(1);
    let total_pages = total_items.div_ceil(per_page as u64) as u32;

    let data = items
        .into_iter()
        .skip(pagination.offset())
        .take(per_page as usize)
        .collect();

    PaginatedResponse {
        data,
        pagination: PaginationMeta {
            page: pagination.page,
            per_page,
            total_items,
            total_pages,
        },
    }
}

/// Inclusive date range for queries and reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    #[serde(rename = "inicio")]
    pub start: NaiveDate,
    #[serde(rename = "fin")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting a start date after the end date
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, &'static str> {
        if start > end {
            return Err("La fecha de inicio debe ser anterior a la fecha fin");
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Monday to Sunday of the week containing `date`
    pub fn week_of(date: NaiveDate) -> Self {
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    /// Monday to Sunday of the week before the one containing `date`
    pub fn previous_week_of(date: NaiveDate) -> Self {
        Self::week_of(date - Duration::days(7))
    }
}
