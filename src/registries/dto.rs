use serde::Deserialize;
use time::Date;

use crate::error::AppError;
use crate::registries::repo_types::{iso_date, ContactSnapshot, RegistryInput};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct RegistryRequest {
    /// Falls back to the caller's default date when omitted.
    #[serde(default, with = "iso_date::option")]
    pub created_at: Option<Date>,
    pub category: String,
    #[serde(default)]
    pub contacts: Vec<ContactSnapshot>,
}

impl RegistryRequest {
    pub fn validate(self, default_date: Date) -> Result<RegistryInput, AppError> {
        let contacts = self
            .contacts
            .into_iter()
            .map(|c| -> Result<ContactSnapshot, AppError> {
                Ok(ContactSnapshot {
                    id: c.id,
                    name: validation::name(&c.name)?,
                    cellphone: validation::cellphone(&c.cellphone)?,
                    category: validation::category(&c.category)?,
                    present: c.present,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RegistryInput {
            created_at: self.created_at.unwrap_or(default_date),
            category: validation::category(&self.category)?,
            contacts,
        })
    }
}
