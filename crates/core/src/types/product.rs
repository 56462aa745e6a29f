//! Catalog product and variant types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::id::{ProductId, VariantId};

/// A catalog product as shown in list views.
///
/// Every field is concrete: the mapper substitutes defaults (empty string,
/// zero, false, Unix epoch) for anything the source omitted, so downstream
/// code never branches on missing data. Summary-level products never carry
/// variants; those are loaded lazily through the detail boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique within its category; minted by the remote source.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Plain-text description.
    pub description: String,
    /// Current price in the shop currency.
    pub price: Decimal,
    /// Pre-discount price; equals `price` when nothing is discounted.
    pub original_price: Decimal,
    /// Stamped from the adapter identity, never trusted from the payload.
    pub category: Category,
    /// Primary image URL; empty when the source has none.
    pub image_url: String,
    /// Additional image URLs.
    pub gallery: Vec<String>,
    /// Whether the product is currently sold out.
    pub is_sold_out: bool,
    /// Creation time; Unix epoch when the source omitted it.
    pub created_at: DateTime<Utc>,
    /// Last modification time; Unix epoch when the source omitted it.
    pub updated_at: DateTime<Utc>,
}

/// A product together with its lazily-loaded variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    /// May be empty. List order is source order, which tier precedence
    /// falls back to when no premium or standard variant exists.
    pub variants: Vec<Variant>,
}

/// A purchasable configuration of a product (e.g., a print quality tier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    /// Tier used for default-variant selection in price display.
    pub tier: VariantTier,
    pub price: Decimal,
    /// Pre-discount price; equals `price` when the variant is undiscounted.
    pub original_price: Decimal,
}

/// Variant quality tier.
///
/// Declared in ascending precedence so the derived `Ord` matches the
/// selection rule: `Premium > Standard > Other`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum VariantTier {
    /// Anything that is neither premium nor standard, including tiers the
    /// source added after this build shipped.
    #[default]
    Other,
    Standard,
    Premium,
}

impl VariantTier {
    /// Classify a source-provided tier label.
    ///
    /// Unknown or empty labels are `Other`; they still participate in the
    /// first-variant fallback, just never in precedence picks.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "premium" => Self::Premium,
            "standard" => Self::Standard,
            _ => Self::Other,
        }
    }

    /// The lowercase wire name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Standard => "standard",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for VariantTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering_matches_precedence() {
        assert!(VariantTier::Premium > VariantTier::Standard);
        assert!(VariantTier::Standard > VariantTier::Other);
    }

    #[test]
    fn test_tier_from_label() {
        assert_eq!(VariantTier::from_label("premium"), VariantTier::Premium);
        assert_eq!(VariantTier::from_label("Standard"), VariantTier::Standard);
        assert_eq!(VariantTier::from_label("archival"), VariantTier::Other);
        assert_eq!(VariantTier::from_label(""), VariantTier::Other);
    }

    #[test]
    fn test_product_serde_round_trip() {
        let product = Product {
            id: ProductId::new("prod-1"),
            name: "Harbor Tee".to_string(),
            description: "Organic cotton".to_string(),
            price: Decimal::new(2400, 2),
            original_price: Decimal::new(3200, 2),
            category: Category::Apparel,
            image_url: "https://cdn.example.com/harbor.jpg".to_string(),
            gallery: vec!["https://cdn.example.com/harbor-2.jpg".to_string()],
            is_sold_out: false,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
