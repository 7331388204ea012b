//! Order and payment endpoints.

use tableside_core::{
    CreateOrderRequest, Order, OrderId, OrderStatus, OrderStatusUpdate, Payment,
    PaymentConfirmRequest, StoreId,
};
use tracing::instrument;

use super::{ApiClient, GatewayError, with_query};

impl ApiClient {
    /// Place an order. Customers place orders anonymously.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the call fails.
    #[instrument(skip(self, request), fields(store_id = %request.store_id, seat_id = %request.seat_id))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, GatewayError> {
        self.post("/orders", request).await
    }

    /// # Errors
    ///
    /// Returns an error if the order does not exist or the call fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: OrderId) -> Result<Order, GatewayError> {
        self.get(&format!("/orders/{id}")).await
    }

    /// Orders of a store, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn store_orders(
        &self,
        store_id: StoreId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, GatewayError> {
        let params: Vec<(&str, String)> = status
            .map(|s| ("status", s.as_str().to_string()))
            .into_iter()
            .collect();
        self.get(&with_query(&format!("/stores/{store_id}/orders"), &params))
            .await
    }

    /// Request a status change. The backend decides whether it is allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition or the call
    /// fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, GatewayError> {
        self.patch(
            &format!("/orders/{id}/status"),
            Some(&OrderStatusUpdate { status }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the order can no longer be cancelled or the call
    /// fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, GatewayError> {
        self.request::<Order, ()>(reqwest::Method::POST, &format!("/orders/{id}/cancel"), None)
            .await
    }

    /// Reconcile a payment widget redirect with the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend (or the payment provider behind it)
    /// rejects the confirmation or the call fails.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn confirm_payment(
        &self,
        request: &PaymentConfirmRequest,
    ) -> Result<Payment, GatewayError> {
        self.post("/payments/confirm", request).await
    }
}
