use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::Date;
use uuid::Uuid;

use crate::error::AppError;
use crate::pagination::SortField;

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

/// A contact as it was when attached to a registry, plus attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    pub id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub category: String,
    #[serde(default)]
    pub present: bool,
}

#[derive(Debug, FromRow)]
pub struct RegistryRow {
    pub id: Uuid,
    pub created_at: Date,
    pub category: String,
    pub is_active: bool,
    pub contacts: Json<Vec<ContactSnapshot>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub created_at: Date,
    pub category: String,
    pub is_active: bool,
    pub contacts: Vec<ContactSnapshot>,
}

impl From<RegistryRow> for Registry {
    fn from(r: RegistryRow) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            category: r.category,
            is_active: r.is_active,
            contacts: r.contacts.0,
        }
    }
}

/// Validated fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryInput {
    pub created_at: Date,
    pub category: String,
    pub contacts: Vec<ContactSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySortField {
    CreatedAt,
    Category,
}

impl FromStr for RegistrySortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "category" => Ok(Self::Category),
            _ => Err(AppError::bad_request(format!("Campo de ordenação inválido: {s}"))),
        }
    }
}

impl SortField for RegistrySortField {
    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Category => "category",
        }
    }
}
