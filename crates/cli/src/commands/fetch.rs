//! One-shot catalog fetch command.
//!
//! # Usage
//!
//! ```bash
//! bayberry fetch -c apparel
//! bayberry fetch -c prints
//! ```
//!
//! # Environment Variables
//!
//! - `BAYBERRY_API_URL` - Base URL of the catalog REST API
//! - `BAYBERRY_API_TOKEN` - Optional bearer token

use bayberry_catalog::config::CatalogConfig;
use bayberry_catalog::source::mapper;
use bayberry_catalog::source::{HttpCatalogSource, ProductSource};
use bayberry_core::{Category, PriceInfo};

/// Fetch one category's product list and print a summary.
pub async fn run(category: Category) -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;
    let source = HttpCatalogSource::new(&config.source);

    tracing::info!(category = %category, url = %config.source.api_url, "fetching product list");
    let records = source.list_products(category).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} product(s) in {category}:", records.len());
        for record in records {
            let product = mapper::map_product(record, category);
            let price = PriceInfo::resolve(&product, &[]);
            let discount = if price.has_discount {
                format!(" (-{}%)", price.discount_percentage)
            } else {
                String::new()
            };
            println!(
                "  {:<12} {:<32} {}{}{}",
                product.id,
                product.name,
                price.display_price,
                discount,
                if product.is_sold_out { "  [sold out]" } else { "" },
            );
        }
    }
    Ok(())
}
