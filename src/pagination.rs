//! Page/sort parameters shared by every list endpoint and the envelope they
//! return.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_CURRENT: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Sort direction, spelled exactly `ASC` / `DESC` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(AppError::bad_request(
                "Ordenação inválida, use ASC ou DESC.",
            )),
        }
    }
}

/// A resource-specific whitelist of sortable columns.
pub trait SortField: Copy + FromStr<Err = AppError> {
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

/// Raw query string as sent by clients: `?current=&page_size=&order_sorted=&field_sorted=`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub current: Option<i64>,
    pub page_size: Option<i64>,
    pub order_sorted: Option<String>,
    pub field_sorted: Option<String>,
}

/// Validated page request handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<F> {
    pub current: i64,
    pub page_size: i64,
    pub sort: Option<Sort<F>>,
}

impl<F: SortField> PageRequest<F> {
    pub fn parse(q: &PageQuery) -> Result<Self, AppError> {
        let current = q.current.unwrap_or(DEFAULT_CURRENT);
        let page_size = q.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if current < 1 {
            return Err(AppError::bad_request("A página atual deve ser maior que zero."));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(format!(
                "O tamanho da página deve estar entre 1 e {MAX_PAGE_SIZE}."
            )));
        }

        // Sorting only applies when both halves are present.
        let sort = match (q.field_sorted.as_deref(), q.order_sorted.as_deref()) {
            (Some(field), Some(order)) => Some(Sort {
                field: field.parse::<F>()?,
                order: order.parse::<SortOrder>()?,
            }),
            _ => None,
        };

        Ok(Self {
            sort,
            ..Self::new(current, page_size)
        })
    }
}

impl<F> PageRequest<F> {
    pub fn new(current: i64, page_size: i64) -> Self {
        Self {
            current,
            page_size,
            sort: None,
        }
    }

    /// Saturates instead of overflowing, so absurd pages just come back empty.
    pub fn offset(&self) -> i64 {
        self.page_size.saturating_mul(self.current - 1)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub max_page: i64,
    pub page_size: i64,
    pub current: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub pagination: PaginationMeta,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new<F>(req: &PageRequest<F>, total: i64, data: Vec<T>) -> Self {
        Self {
            pagination: PaginationMeta {
                total,
                max_page: max_page(total, req.page_size),
                page_size: req.page_size,
                current: req.current,
            },
            data,
        }
    }
}

/// Ceiling of `total / page_size`; callers guarantee `page_size > 0`.
pub fn max_page(total: i64, page_size: i64) -> i64 {
    if total % page_size == 0 {
        total / page_size
    } else {
        total / page_size + 1
    }
}
