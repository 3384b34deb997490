//! Client-side filtering and ordering of product listings
//!
//! The marketplace API only filters by category, status and NFT flag. Free
//! text search, price bands, "liked" views and ordering are applied locally
//! to whatever page of products the caller already holds.

use crate::error::CoreError;
use crate::types::Product;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Newest listings first
    #[default]
    Latest,
    /// Cheapest first
    PriceLow,
    /// Most expensive first
    PriceHigh,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            other => Err(CoreError::invalid_input(format!(
                "unknown sort order '{other}'"
            ))),
        }
    }
}

/// Named product collections reachable from the home screen
pub const COLLECTIONS: [&str; 4] = ["ai-recommend", "nft-verified", "recent", "liked"];

/// A local product query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Substring matched against name and description. `Some` with blank
    /// text matches nothing.
    pub text: Option<String>,
    /// Exact category, `None` for all categories
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub nft_only: bool,
    pub liked_only: bool,
    pub sort: SortOrder,
}

impl ProductQuery {
    /// Query matching every product, newest first
    pub fn browse() -> Self {
        Self::default()
    }

    /// Free-text search query
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Query for a named collection; unknown slugs are rejected
    pub fn collection(slug: &str) -> Result<Self, CoreError> {
        match slug {
            "nft-verified" => Ok(Self {
                nft_only: true,
                ..Self::default()
            }),
            "liked" => Ok(Self {
                liked_only: true,
                ..Self::default()
            }),
            "ai-recommend" | "recent" => Ok(Self::default()),
            other => Err(CoreError::invalid_input(format!(
                "unknown collection '{other}'"
            ))),
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn price_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    #[must_use]
    pub const fn nft_only(mut self, nft_only: bool) -> Self {
        self.nft_only = nft_only;
        self
    }

    #[must_use]
    pub const fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Whether a single product passes every filter
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if needle.is_empty() {
                return false;
            }
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product.description.to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }

        if self.nft_only && !product.has_nft() {
            return false;
        }
        if self.liked_only && !product.is_liked() {
            return false;
        }

        true
    }

    /// Filter and order a product slice
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut selected: Vec<Product> = products
            .iter()
            .filter(|product| self.matches(product))
            .cloned()
            .collect();

        match self.sort {
            SortOrder::Latest => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::PriceLow => selected.sort_by_key(|product| product.price),
            SortOrder::PriceHigh => selected.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        selected
    }
}
