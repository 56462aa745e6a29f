//! Raw wire records.
//!
//! Every field is optional: upstream payloads routinely omit fields, and
//! the mapper substitutes defaults rather than rejecting a record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product as delivered by a source, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProductRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    /// Sometimes present in payloads; the mapper ignores it and stamps the
    /// category from the adapter identity instead.
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub is_sold_out: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One purchase option as delivered by a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVariantRecord {
    pub id: Option<String>,
    /// Free-form tier label ("premium", "standard", or anything else).
    pub tier: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
}

/// A product with its variants, as delivered by the detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProductDetail {
    #[serde(flatten)]
    pub product: RawProductRecord,
    pub variants: Option<Vec<RawVariantRecord>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tolerates_sparse_payload() {
        let record: RawProductRecord = serde_json::from_str(r#"{"id": "p1"}"#).unwrap();
        assert_eq!(record.id.as_deref(), Some("p1"));
        assert!(record.name.is_none());
        assert!(record.price.is_none());
    }

    #[test]
    fn test_record_reads_camel_case_fields() {
        let json = r#"{
            "id": "p1",
            "originalPrice": "100.00",
            "imageUrl": "https://cdn.bayberry.test/p1.jpg",
            "isSoldOut": true
        }"#;
        let record: RawProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.original_price, Some(Decimal::from(100)));
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://cdn.bayberry.test/p1.jpg")
        );
        assert_eq!(record.is_sold_out, Some(true));
    }

    #[test]
    fn test_detail_flattens_product_fields() {
        let json = r#"{
            "id": "p1",
            "name": "Harbor Tee",
            "variants": [{"id": "v1", "tier": "premium", "price": "150.00"}]
        }"#;
        let detail: RawProductDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.product.name.as_deref(), Some("Harbor Tee"));
        let variants = detail.variants.unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].tier.as_deref(), Some("premium"));
    }
}
