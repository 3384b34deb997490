//! Bazaar core types and utilities

pub mod catalog;
pub mod envelope;
pub mod error;
pub mod search_history;
pub mod types;

pub use catalog::{ProductQuery, SortOrder};
pub use envelope::{ApiResponse, EnvelopeError};
pub use error::{CoreError, CoreResult};
pub use search_history::SearchHistory;
pub use types::{
    DeliveryMethod, LoginHistoryItem, Nft, NftMetadata, NftOwnership, NftOwnershipRecord,
    NftStatus, Order, OrderStatus, Pagination, Product, ProductAttributes, ProductPage,
    ProductState, ProductStatus, SellerSummary, TransferType, User, Wallet,
};
