use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::customer::model::{CreateCustomerRequest, Customer, CustomerStatus, UpdateCustomerRequest};
use crate::error::ApiError;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn LedgerStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, ApiError> {
        request.validate()?;

        let customer = Customer {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            address: request.address.trim().to_string(),
            id_proof_url: request.id_proof_url.filter(|u| !u.trim().is_empty()),
            status: CustomerStatus::Active,
            created_at: Utc::now(),
        };

        let customer = self.store.insert_customer(customer).await?;
        tracing::info!(customer_id = %customer.id, "Customer created");

        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, ApiError> {
        self.store
            .get_customer(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Customer {} not found", id)))
    }

    pub async fn list_customers(&self, skip: i64, limit: i64) -> Result<Vec<Customer>, ApiError> {
        Ok(self.store.list_customers(skip, limit).await?)
    }

    /// Apply a partial update; fields absent from the request keep their values
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, ApiError> {
        request.validate()?;

        let mut customer = self.get_customer(id).await?;
        customer.apply(request);

        let customer = self.store.update_customer(customer).await?;
        tracing::info!(customer_id = %customer.id, status = ?customer.status, "Customer updated");

        Ok(customer)
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ApiError> {
        self.store.delete_customer(id).await?;
        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> CustomerService {
        CustomerService::new(Arc::new(MemoryStore::new()))
    }

    fn request(name: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: name.to_string(),
            phone: " 9000000001 ".to_string(),
            address: "12 Market Road".to_string(),
            id_proof_url: Some("".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_customer_trims_and_defaults_status() {
        let customer = service().create_customer(request("  Asha ")).await.unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.phone, "9000000001");
        assert_eq!(customer.id_proof_url, None);
        assert_eq!(customer.status, CustomerStatus::Active);
    }

    #[tokio::test]
    async fn test_create_customer_rejects_blank_name() {
        let err = service().create_customer(request("")).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_update_missing_customer_is_not_found() {
        let err = service()
            .update_customer(Uuid::new_v4(), UpdateCustomerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_changes_status_only() {
        let service = service();
        let created = service.create_customer(request("Asha")).await.unwrap();

        let updated = service
            .update_customer(
                created.id,
                UpdateCustomerRequest {
                    status: Some(CustomerStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, CustomerStatus::Inactive);
        assert_eq!(updated.name, created.name);
    }
}
