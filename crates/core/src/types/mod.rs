//! Core types for Bayberry.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod pricing;
pub mod product;

pub use category::{Category, ParseCategoryError};
pub use id::*;
pub use pricing::{DiscountTier, PriceInfo, select_variant};
pub use product::{Product, ProductDetail, Variant, VariantTier};
