use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::pagination::SortField;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInput {
    pub name: String,
    pub cellphone: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSortField {
    Name,
    Cellphone,
    Category,
    CreatedAt,
}

impl FromStr for ContactSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "cellphone" => Ok(Self::Cellphone),
            "category" => Ok(Self::Category),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(AppError::bad_request(format!("Campo de ordenação inválido: {s}"))),
        }
    }
}

impl SortField for ContactSortField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Cellphone => "cellphone",
            Self::Category => "category",
            Self::CreatedAt => "created_at",
        }
    }
}
