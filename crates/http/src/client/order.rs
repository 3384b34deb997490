//! Order API client methods

use super::{ApiRequest, ClientError, MarketClient};
use crate::types::{CreateOrderData, SellerMessage, ShipOrderRequest};
use bazaar_core::Order;

impl MarketClient {
    /// Place an order
    pub async fn create_order(&self, data: &CreateOrderData) -> Result<Order, ClientError> {
        let req = ApiRequest::post("/order").json(data)?;
        self.execute(&req).await
    }

    pub async fn order(&self, uuid: &str) -> Result<Order, ClientError> {
        self.execute(&ApiRequest::get(format!("/order/{uuid}"))).await
    }

    /// Orders placed by the current user
    pub async fn buyer_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.execute(&ApiRequest::get("/order/@me/buyer")).await
    }

    /// Orders received by the current user as seller
    pub async fn seller_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.execute(&ApiRequest::get("/order/@me/seller")).await
    }

    pub async fn accept_order(
        &self,
        uuid: &str,
        seller_message: Option<String>,
    ) -> Result<Order, ClientError> {
        let req = order_action(uuid, "accept").json(&SellerMessage { seller_message })?;
        self.execute(&req).await
    }

    pub async fn reject_order(
        &self,
        uuid: &str,
        seller_message: Option<String>,
    ) -> Result<Order, ClientError> {
        let req = order_action(uuid, "reject").json(&SellerMessage { seller_message })?;
        self.execute(&req).await
    }

    pub async fn cancel_order(&self, uuid: &str) -> Result<Order, ClientError> {
        self.execute(&order_action(uuid, "cancel")).await
    }

    pub async fn ship_order(
        &self,
        uuid: &str,
        tracking_number: impl Into<String>,
    ) -> Result<Order, ClientError> {
        let req = order_action(uuid, "ship").json(&ShipOrderRequest {
            tracking_number: tracking_number.into(),
        })?;
        self.execute(&req).await
    }

    pub async fn mark_delivered(&self, uuid: &str) -> Result<Order, ClientError> {
        self.execute(&order_action(uuid, "delivered")).await
    }

    pub async fn complete_order(&self, uuid: &str) -> Result<Order, ClientError> {
        self.execute(&order_action(uuid, "complete")).await
    }
}

fn order_action(uuid: &str, action: &str) -> ApiRequest {
    ApiRequest::put(format!("/order/{uuid}/{action}"))
}
