use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Accumulated per-user state returned alongside the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_state: Option<UserState>,
}

impl User {
    /// Reward points, zero when the backend omits user state
    pub fn points(&self) -> i64 {
        self.user_state.as_ref().map_or(0, |state| state.points)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginHistoryItem {
    pub id: i64,
    pub ip: String,
    #[serde(default)]
    pub user_agent: Map<String, JsonValue>,
    pub login_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProductStatus {
    Available,
    Sold,
    OutOfStock,
    Discontinued,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::Available
    }
}

/// Free-form product attributes stored by the backend as a JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_brand: Option<String>,

    // NFT provenance
    #[serde(default, rename = "hasNFT", skip_serializing_if = "Option::is_none")]
    pub has_nft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft_token_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,

    /// Keys this client does not model
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub uuid: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductState {
    pub views: u64,
    pub likes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub has_nft: bool,
    #[serde(default)]
    pub attributes: ProductAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_state: Option<ProductState>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the product carries an NFT certificate, from either the
    /// top-level flag or the attribute document
    pub fn has_nft(&self) -> bool {
        self.has_nft || self.attributes.has_nft == Some(true)
    }

    pub fn verified_brand(&self) -> Option<&str> {
        self.attributes.verified_brand.as_deref()
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.attributes.thumbnail_url.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.attributes.location.as_deref()
    }

    pub fn is_liked(&self) -> bool {
        self.attributes.liked == Some(true)
    }

    pub fn likes(&self) -> u64 {
        self.product_state.map_or(0, |state| state.likes)
    }

    /// Last modification time, falling back to creation for untouched listings
    pub fn updated_at_or_created(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of the product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    PaymentCompleted,
    InDelivery,
    Delivered,
    Completed,
}

impl OrderStatus {
    /// Terminal states accept no further transitions
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Direct,
    Parcel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub uuid: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: u64,
    pub quantity: u32,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_message: Option<String>,
    pub buyer: User,
    pub seller: User,
    pub product: Product,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub uuid: String,
    pub wallet_address: String,
    pub is_active: bool,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftTrait {
    pub trait_type: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<NftTrait>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum NftStatus {
    Active,
    Burned,
    Transferred,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferType {
    Mint,
    Purchase,
    Transfer,
    Gift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warranty {
    pub uuid: String,
    pub serial_number: String,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOwnership {
    pub uuid: String,
    pub transfer_type: TransferType,
    pub transferred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    pub uuid: String,
    pub token_id: String,
    pub contract_address: String,
    pub metadata_uri: String,
    pub metadata: NftMetadata,
    pub status: NftStatus,
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<Warranty>,
    pub ownership: NftOwnership,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOwner {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerWallet {
    pub uuid: String,
    pub wallet_address: String,
    pub user: WalletOwner,
}

/// One hop in an NFT's chain of custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOwnershipRecord {
    pub uuid: String,
    pub nft_uuid: String,
    pub owner_wallet: OwnerWallet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_owner_wallet: Option<OwnerWallet>,
    pub transfer_type: TransferType,
    pub status: NftStatus,
    pub transferred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> JsonValue {
        json!({
            "uuid": "p-1",
            "name": "Vintage camera",
            "description": "Film camera in working order",
            "price": 120000,
            "category": "camera",
            "status": "Available",
            "has_nft": false,
            "attributes": {
                "thumbnailUrl": "https://cdn.example/p-1.jpg",
                "verifiedBrand": "Leica",
                "hasNFT": true,
                "liked": true,
                "condition": "mint"
            },
            "seller": {"uuid": "u-9", "user_id": "seller9", "name": "Seller"},
            "product_state": {"views": 10, "likes": 3},
            "created_at": "2024-05-01T10:00:00Z"
        })
    }

    #[test]
    fn test_product_attribute_accessors() {
        let product: Product = serde_json::from_value(product_json()).unwrap();

        assert!(product.has_nft());
        assert!(product.is_liked());
        assert_eq!(product.verified_brand(), Some("Leica"));
        assert_eq!(product.thumbnail_url(), Some("https://cdn.example/p-1.jpg"));
        assert_eq!(product.location(), None);
        assert_eq!(product.likes(), 3);
        assert_eq!(product.attributes.extra["condition"], "mint");
        assert_eq!(product.updated_at_or_created(), product.created_at);
    }

    #[test]
    fn test_product_without_attributes_defaults() {
        let product: Product = serde_json::from_value(json!({
            "uuid": "p-2",
            "name": "Desk",
            "description": "Oak desk",
            "price": 50000,
            "category": "furniture",
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert!(!product.has_nft());
        assert!(!product.is_liked());
        assert_eq!(product.likes(), 0);
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_value(json!("PAYMENT_COMPLETED")).unwrap();
        assert_eq!(status, OrderStatus::PaymentCompleted);
        assert!(!status.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
