//! Terminal rendering of marketplace records

use anyhow::Result;
use bazaar_core::{Nft, NftOwnershipRecord, Order, Product};
use serde::Serialize;

/// Print any record as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Price in won with thousands separators, e.g. `150,000원`
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}원")
}

pub fn product_line(product: &Product) -> String {
    let mut line = format!(
        "{}  {}  {}  [{}]",
        product.uuid,
        product.name,
        format_price(product.price),
        product.category
    );
    if product.has_nft() {
        line.push_str("  NFT");
    }
    if let Some(brand) = product.verified_brand() {
        line.push_str(&format!("  ({brand})"));
    }
    line
}

pub fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!("{}", product_line(product));
    }
}

pub fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders found");
        return;
    }
    for order in orders {
        println!(
            "{}  {}  {:?}  {} x{}  {}",
            order.uuid,
            order.order_number,
            order.status,
            order.product.name,
            order.quantity,
            format_price(order.total_amount)
        );
    }
}

pub fn print_nfts(nfts: &[Nft]) {
    if nfts.is_empty() {
        println!("No NFTs found");
        return;
    }
    for nft in nfts {
        println!(
            "{}  #{}  {}  {:?}",
            nft.uuid, nft.token_id, nft.metadata.name, nft.status
        );
    }
}

pub fn print_ownership_history(records: &[NftOwnershipRecord]) {
    for record in records {
        let from = record
            .previous_owner_wallet
            .as_ref()
            .map_or("-", |wallet| wallet.user.name.as_str());
        println!(
            "{}  {:?}  {} -> {}",
            record.transferred_at.format("%Y-%m-%d %H:%M"),
            record.transfer_type,
            from,
            record.owner_wallet.user.name
        );
    }
}
