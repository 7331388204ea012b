//! Store endpoints.

use tableside_core::{DashboardStats, Store, StoreId, StoreInput};
use tracing::instrument;

use super::{ApiClient, GatewayError};

impl ApiClient {
    /// Stores owned by (or assigned to) the current staff member.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn my_stores(&self) -> Result<Vec<Store>, GatewayError> {
        self.get("/stores/my").await
    }

    /// # Errors
    ///
    /// Returns an error if the store does not exist or the call fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn store(&self, id: StoreId) -> Result<Store, GatewayError> {
        self.get_cached(&format!("/stores/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_store(&self, input: &StoreInput) -> Result<Store, GatewayError> {
        self.post("/stores", input).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(store_id = %id))]
    pub async fn update_store(&self, id: StoreId, input: &StoreInput) -> Result<Store, GatewayError> {
        self.put(&format!("/stores/{id}"), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn delete_store(&self, id: StoreId) -> Result<(), GatewayError> {
        self.delete(&format!("/stores/{id}")).await
    }

    /// Today's counters for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn dashboard_stats(&self, id: StoreId) -> Result<DashboardStats, GatewayError> {
        self.get(&format!("/stores/{id}/dashboard")).await
    }
}
