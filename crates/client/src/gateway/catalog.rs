//! Category, menu and seat endpoints.

use serde::de::IgnoredAny;
use tableside_core::{
    Category, CategoryId, CategoryInput, MenuAvailability, MenuId, MenuInput, MenuItem, Seat,
    SeatId, SeatInput, SeatLookup, StoreId,
};
use tracing::instrument;

use super::{ApiClient, GatewayError, with_query};

impl ApiClient {
    // =========================================================================
    // Categories
    // =========================================================================

    /// Categories of a store, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn categories(&self, store_id: StoreId) -> Result<Vec<Category>, GatewayError> {
        self.get_cached(&format!("/stores/{store_id}/categories"))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(store_id = %store_id, name = %input.name))]
    pub async fn create_category(
        &self,
        store_id: StoreId,
        input: &CategoryInput,
    ) -> Result<Category, GatewayError> {
        self.post(&format!("/stores/{store_id}/categories"), input)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, GatewayError> {
        self.put(&format!("/categories/{id}"), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), GatewayError> {
        self.delete(&format!("/categories/{id}")).await
    }

    // =========================================================================
    // Menus
    // =========================================================================

    /// Menu items of a store, optionally limited to one category, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn menus(
        &self,
        store_id: StoreId,
        category: Option<CategoryId>,
    ) -> Result<Vec<MenuItem>, GatewayError> {
        let params: Vec<(&str, String)> = category
            .map(|id| ("categoryId", id.to_string()))
            .into_iter()
            .collect();
        self.get_cached(&with_query(&format!("/stores/{store_id}/menus"), &params))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(store_id = %store_id, name = %input.name))]
    pub async fn create_menu(
        &self,
        store_id: StoreId,
        input: &MenuInput,
    ) -> Result<MenuItem, GatewayError> {
        self.post(&format!("/stores/{store_id}/menus"), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(menu_id = %id))]
    pub async fn update_menu(&self, id: MenuId, input: &MenuInput) -> Result<MenuItem, GatewayError> {
        self.put(&format!("/menus/{id}"), input).await
    }

    /// Toggle whether a menu item can be ordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(menu_id = %id))]
    pub async fn set_menu_availability(
        &self,
        id: MenuId,
        is_available: bool,
    ) -> Result<(), GatewayError> {
        self.patch::<IgnoredAny, _>(
            &format!("/menus/{id}/availability"),
            Some(&MenuAvailability { is_available }),
        )
        .await
        .map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(menu_id = %id))]
    pub async fn delete_menu(&self, id: MenuId) -> Result<(), GatewayError> {
        self.delete(&format!("/menus/{id}")).await
    }

    // =========================================================================
    // Seats
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn seats(&self, store_id: StoreId) -> Result<Vec<Seat>, GatewayError> {
        self.get(&format!("/stores/{store_id}/seats")).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(store_id = %store_id, seat = %input.seat_number))]
    pub async fn create_seat(&self, store_id: StoreId, input: &SeatInput) -> Result<Seat, GatewayError> {
        self.post(&format!("/stores/{store_id}/seats"), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the call fails.
    #[instrument(skip(self, input), fields(seat_id = %id))]
    pub async fn update_seat(&self, id: SeatId, input: &SeatInput) -> Result<Seat, GatewayError> {
        self.put(&format!("/seats/{id}"), input).await
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(seat_id = %id))]
    pub async fn delete_seat(&self, id: SeatId) -> Result<(), GatewayError> {
        self.delete(&format!("/seats/{id}")).await
    }

    /// Resolve a scanned QR code to its seat and store, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unknown or the call fails.
    #[instrument(skip(self))]
    pub async fn seat_by_qr(&self, qr_code: &str) -> Result<SeatLookup, GatewayError> {
        let encoded: String = url::form_urlencoded::byte_serialize(qr_code.trim().as_bytes()).collect();
        self.get_cached(&format!("/seats/qr/{encoded}")).await
    }
}
