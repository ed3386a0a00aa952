//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::customer::CustomerService;
use crate::loan::LoanService;
use crate::payment::PaymentService;
use crate::services::{BusinessCalendar, LedgerService};
use crate::store::LedgerStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub customer_service: Arc<CustomerService>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
    pub ledger_service: Arc<LedgerService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wire every service onto one store
    pub fn new(
        store: Arc<dyn LedgerStore>,
        calendar: BusinessCalendar,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            customer_service: Arc::new(CustomerService::new(store.clone())),
            loan_service: Arc::new(LoanService::new(store.clone())),
            payment_service: Arc::new(PaymentService::new(store.clone())),
            ledger_service: Arc::new(LedgerService::new(store.clone(), calendar)),
            auth_service,
            store,
        }
    }
}

impl FromRef<AppState> for Arc<dyn LedgerStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for Arc<CustomerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.customer_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<LedgerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ledger_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
