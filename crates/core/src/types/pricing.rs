//! Variant price resolution.
//!
//! Derives the price a list or detail view should display from a product and
//! its (possibly absent) variants. Everything here is pure and cheap enough
//! to recompute on every read; nothing derived is ever persisted.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::product::{Product, Variant, VariantTier};

/// Discount size classification for badge display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountTier {
    #[default]
    None,
    /// At least 10% off.
    Moderate,
    /// At least 30% off.
    Significant,
}

impl DiscountTier {
    /// Classify a whole-percent discount.
    #[must_use]
    pub const fn classify(percentage: i64) -> Self {
        if percentage >= 30 {
            Self::Significant
        } else if percentage >= 10 {
            Self::Moderate
        } else {
            Self::None
        }
    }
}

/// Display pricing derived from a product and its resolved variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceInfo {
    pub display_price: Decimal,
    pub original_price: Decimal,
    pub has_discount: bool,
    /// Whole-percent discount, rounded half away from zero.
    pub discount_percentage: i64,
    pub savings: Decimal,
    pub tier: DiscountTier,
}

impl PriceInfo {
    /// Resolve display pricing for a product with optional variants.
    ///
    /// Uses [`select_variant`] to pick the price pair, falling back to the
    /// product's own prices when there are no variants at all.
    #[must_use]
    pub fn resolve(product: &Product, variants: &[Variant]) -> Self {
        let (display, original) = select_variant(variants).map_or(
            (product.price, product.original_price),
            |variant| (variant.price, variant.original_price),
        );
        Self::from_prices(display, original)
    }

    /// Derive discount figures from a resolved (display, original) pair.
    #[must_use]
    pub fn from_prices(display_price: Decimal, original_price: Decimal) -> Self {
        let has_discount = original_price > display_price;
        let savings = original_price - display_price;

        let discount_percentage = if original_price.is_zero() {
            0
        } else {
            (savings / original_price * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0)
        };

        Self {
            display_price,
            original_price,
            has_discount,
            discount_percentage,
            savings,
            tier: DiscountTier::classify(discount_percentage),
        }
    }
}

/// Pick the variant whose price a list view should display.
///
/// Selection order: the first premium variant, else the first standard
/// variant, else the first variant in source order. The premium pick wins
/// even when a cheaper non-premium variant exists. Returns `None` only for
/// an empty list.
#[must_use]
pub fn select_variant(variants: &[Variant]) -> Option<&Variant> {
    variants
        .iter()
        .find(|v| v.tier == VariantTier::Premium)
        .or_else(|| variants.iter().find(|v| v.tier == VariantTier::Standard))
        .or_else(|| variants.first())
}
