use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Customer status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

/// Customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub id_proof_url: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
}

/// Request to create a customer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(max = 200), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 32), custom = "not_blank")]
    pub phone: String,
    #[validate(length(max = 500), custom = "not_blank")]
    pub address: String,
    #[validate(length(max = 2048))]
    pub id_proof_url: Option<String>,
}

/// Partial customer update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(max = 200), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 32), custom = "not_blank")]
    pub phone: Option<String>,
    #[validate(length(max = 500), custom = "not_blank")]
    pub address: Option<String>,
    #[validate(length(max = 2048))]
    pub id_proof_url: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl Customer {
    /// Apply a partial update in place
    pub fn apply(&mut self, update: UpdateCustomerRequest) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(address) = update.address {
            self.address = address.trim().to_string();
        }
        if let Some(url) = update.id_proof_url {
            self.id_proof_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Customer listing query
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}
