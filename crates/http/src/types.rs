//! Request and response bodies of the marketplace API

use crate::client::session::Credentials;
use bazaar_core::{DeliveryMethod, Nft, NftOwnership, ProductStatus, TransferType, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Username/password credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub user_id: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoginCredentials {
    Credentials { credentials: PasswordCredentials },
}

impl LoginCredentials {
    pub fn password(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Credentials {
            credentials: PasswordCredentials {
                user_id: user_id.into(),
                password: password.into(),
            },
        }
    }
}

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupData {
    #[serde(flatten)]
    pub login: LoginCredentials,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birthday: String,
}

/// Token pair as nested under `tokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login and signup response
///
/// Backends have returned the issued tokens in three shapes: nested under
/// `tokens`, flat `access_token`/`refresh_token`, or camel-cased
/// `token`/`refreshToken`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<AuthTokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        default,
        rename = "refreshToken",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token_camel: Option<String>,
}

impl LoginResponse {
    /// The issued credential pair, whichever shape it arrived in
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(tokens) = &self.tokens {
            return Some(Credentials::new(&tokens.access_token, &tokens.refresh_token));
        }
        if let (Some(access), Some(refresh)) = (&self.access_token, &self.refresh_token) {
            return Some(Credentials::new(access, refresh));
        }
        if let (Some(access), Some(refresh)) = (&self.token, &self.refresh_token_camel) {
            return Some(Credentials::new(access, refresh));
        }
        None
    }
}

/// Refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response payload; `refresh_token` is present only when the
/// backend rotates it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Plain `{ message }` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Server-side listing filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub has_nft: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductFilters {
    /// Query string pairs for the filters that are set
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(status) = self.status {
            let status = match status {
                ProductStatus::Available => "Available",
                ProductStatus::Sold => "Sold",
                ProductStatus::OutOfStock => "OutOfStock",
                ProductStatus::Discontinued => "Discontinued",
            };
            query.push(("status", status.to_string()));
        }
        if let Some(has_nft) = self.has_nft {
            query.push(("has_nft", has_nft.to_string()));
        }
        if let Some(page) = self.page.filter(|page| *page > 0) {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributesInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_brand: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductData {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ProductAttributesInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, JsonValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderData {
    pub product_uuid: String,
    pub seller_uuid: String,
    pub quantity: u32,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_message: Option<String>,
}

/// Optional note from the seller when accepting or rejecting an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipOrderRequest {
    pub tracking_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintNftData {
    pub product_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_uuid: Option<String>,
    pub serial_number: String,
    pub brand_name: String,
}

/// Mint response: the new token and its first ownership record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintNftResponse {
    pub nft: Nft,
    pub ownership: NftOwnership,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferNftData {
    pub nft_uuid: String,
    pub to_wallet_uuid: String,
    pub transfer_type: TransferType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_uuid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_wire_format() {
        let body = serde_json::to_value(LoginCredentials::password("alice", "pw")).unwrap();
        assert_eq!(
            body,
            json!({"type": "credentials", "credentials": {"user_id": "alice", "password": "pw"}})
        );
    }

    #[test]
    fn test_signup_flattens_login() {
        let body = serde_json::to_value(SignupData {
            login: LoginCredentials::password("alice", "pw"),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "010-0000-0000".to_string(),
            birthday: "1990-01-01".to_string(),
        })
        .unwrap();
        assert_eq!(body["type"], "credentials");
        assert_eq!(body["credentials"]["user_id"], "alice");
        assert_eq!(body["email"], "alice@example.com");
    }

    #[test]
    fn test_login_response_token_shapes() {
        let nested: LoginResponse = serde_json::from_value(
            json!({"tokens": {"access_token": "A", "refresh_token": "R"}}),
        )
        .unwrap();
        let flat: LoginResponse =
            serde_json::from_value(json!({"access_token": "A", "refresh_token": "R"})).unwrap();
        let camel: LoginResponse =
            serde_json::from_value(json!({"token": "A", "refreshToken": "R"})).unwrap();

        for response in [nested, flat, camel] {
            assert_eq!(response.credentials(), Some(Credentials::new("A", "R")));
        }
    }

    #[test]
    fn test_login_response_without_pair() {
        let partial: LoginResponse =
            serde_json::from_value(json!({"access_token": "A"})).unwrap();
        assert_eq!(partial.credentials(), None);
    }

    #[test]
    fn test_product_filters_skip_unset_values() {
        let filters = ProductFilters {
            category: Some("camera".to_string()),
            has_nft: Some(false),
            page: Some(0),
            limit: Some(20),
            ..ProductFilters::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("category", "camera".to_string()),
                ("has_nft", "false".to_string()),
                ("limit", "20".to_string()),
            ]
        );
    }
}
