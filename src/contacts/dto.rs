use serde::Deserialize;

use crate::contacts::repo_types::ContactInput;
use crate::error::AppError;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub cellphone: String,
    pub category: String,
}

impl ContactRequest {
    pub fn validate(self) -> Result<ContactInput, AppError> {
        Ok(ContactInput {
            name: validation::name(&self.name)?,
            cellphone: validation::cellphone(&self.cellphone)?,
            category: validation::category(&self.category)?,
        })
    }
}
