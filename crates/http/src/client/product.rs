//! Product API client methods

use super::{ApiRequest, ClientError, MarketClient};
use crate::types::{CreateProductData, MessageResponse, ProductFilters, UpdateProductData};
use bazaar_core::{Product, ProductPage};

/// Default number of recently viewed products to fetch
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

impl MarketClient {
    /// List products matching the server-side filters
    pub async fn products(&self, filters: &ProductFilters) -> Result<ProductPage, ClientError> {
        let req = filters
            .to_query()
            .into_iter()
            .fold(ApiRequest::get("/product"), |req, (key, value)| {
                req.query(key, value)
            });
        self.execute(&req).await
    }

    pub async fn product(&self, uuid: &str) -> Result<Product, ClientError> {
        self.execute(&ApiRequest::get(format!("/product/{uuid}"))).await
    }

    pub async fn create_product(&self, data: &CreateProductData) -> Result<Product, ClientError> {
        let req = ApiRequest::post("/product").json(data)?;
        self.execute(&req).await
    }

    pub async fn update_product(
        &self,
        uuid: &str,
        data: &UpdateProductData,
    ) -> Result<Product, ClientError> {
        let req = ApiRequest::put(format!("/product/{uuid}")).json(data)?;
        self.execute(&req).await
    }

    pub async fn delete_product(&self, uuid: &str) -> Result<MessageResponse, ClientError> {
        self.execute(&ApiRequest::delete(format!("/product/{uuid}"))).await
    }

    /// Products listed by the current user
    pub async fn my_products(&self) -> Result<Vec<Product>, ClientError> {
        self.execute(&ApiRequest::get("/product/@me/list")).await
    }

    /// Products the current user viewed recently
    pub async fn recent_products(&self, limit: u32) -> Result<Vec<Product>, ClientError> {
        let req = ApiRequest::get("/product/@me/recent").query("limit", limit);
        self.execute(&req).await
    }
}
