//! Normalization of raw records into domain products.
//!
//! Absent fields become empty strings, zeros, or `false` so downstream
//! logic never branches on missing data. Absent pricing falls back to the
//! nearest present price, never to zero, so a sparse record cannot
//! manufacture a discount.

use chrono::DateTime;

use bayberry_core::{Category, Product, ProductDetail, ProductId, Variant, VariantId, VariantTier};

use super::record::{RawProductDetail, RawProductRecord, RawVariantRecord};

/// Normalize one raw record into a [`Product`].
///
/// The category always comes from the adapter identity; a category field in
/// the payload is ignored.
#[must_use]
pub fn map_product(raw: RawProductRecord, category: Category) -> Product {
    let price = raw.price.unwrap_or_default();
    Product {
        id: ProductId::new(raw.id.unwrap_or_default()),
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        price,
        original_price: raw.original_price.unwrap_or(price),
        category,
        image_url: raw.image_url.unwrap_or_default(),
        gallery: raw.gallery.unwrap_or_default(),
        is_sold_out: raw.is_sold_out.unwrap_or_default(),
        created_at: raw.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        updated_at: raw.updated_at.unwrap_or(DateTime::UNIX_EPOCH),
    }
}

/// Normalize one raw variant. An absent variant price falls back to the
/// owning product's price.
#[must_use]
pub fn map_variant(raw: RawVariantRecord, product_price: rust_decimal::Decimal) -> Variant {
    let price = raw.price.unwrap_or(product_price);
    Variant {
        id: VariantId::new(raw.id.unwrap_or_default()),
        tier: VariantTier::from_label(&raw.tier.unwrap_or_default()),
        price,
        original_price: raw.original_price.unwrap_or(price),
    }
}

/// Normalize a detail payload into a [`ProductDetail`].
#[must_use]
pub fn map_detail(raw: RawProductDetail, category: Category) -> ProductDetail {
    let product = map_product(raw.product, category);
    let product_price = product.price;
    let variants = raw
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(|variant| map_variant(variant, product_price))
        .collect();
    ProductDetail { product, variants }
}
