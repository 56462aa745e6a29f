//! Scripted walkthrough against an in-memory catalog.
//!
//! Exercises the whole engine without any network: seeds both categories,
//! starts the controller, pages and searches, opens a product (watch the
//! address mirror), and switches to the snapshot-backed category.
//!
//! # Usage
//!
//! ```bash
//! bayberry demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use bayberry_catalog::controller::{CatalogController, CatalogData, CatalogPage};
use bayberry_catalog::feed::CatalogSources;
use bayberry_catalog::nav::{HistoryStack, LocationBoundary, MemoryStorage, NavStore};
use bayberry_catalog::source::memory::InMemoryCatalog;
use bayberry_catalog::source::record::{RawProductDetail, RawProductRecord};
use bayberry_core::{Category, ProductId};

/// Run the scripted demo.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let source = InMemoryCatalog::new();
    seed(&source)?;

    let history = Arc::new(HistoryStack::new());
    let nav = NavStore::new(Box::new(MemoryStorage::new()), Some(history.clone()));
    let controller = CatalogController::new(CatalogSources::from_single(source.clone()), nav);

    let mut updates = controller.subscribe();
    controller.start();

    wait_for(&mut updates, |data| {
        !data.loading && !data.products.is_empty()
    })
    .await?;
    say("Loaded the apparel catalog:");
    print_page(&controller.page());

    controller.set_page(2);
    say("Page 2:");
    print_page(&controller.page());

    controller.set_search_input("tee");
    controller.submit_search();
    say("Search committed for \"tee\":");
    print_page(&controller.page());

    let view = controller.open_product(ProductId::new("ap-01")).await?;
    say(&format!(
        "Opened {} ({} variant(s)); display price {} | address query: ?{}",
        view.detail.product.name,
        view.detail.variants.len(),
        view.price.display_price,
        history.current_query(),
    ));

    controller.close_product();
    say(&format!(
        "Closed the detail view | address query: ?{}",
        history.current_query(),
    ));

    controller.record_scroll(420.0);
    tokio::time::sleep(Duration::from_millis(30)).await;
    say(&format!(
        "Scroll persisted at {}px",
        controller.nav().read().scroll_position,
    ));

    controller.set_category(Category::Prints);
    while source.snapshot_subscribers() == 0 {
        tokio::task::yield_now().await;
    }
    source.push_snapshot(prints_snapshot()?);
    wait_for(&mut updates, |data| {
        !data.loading
            && data
                .products
                .first()
                .is_some_and(|product| product.category == Category::Prints)
    })
    .await?;
    say("Switched to prints (snapshot-fed):");
    print_page(&controller.page());

    controller.shutdown();
    say("Demo finished.");
    Ok(())
}

async fn wait_for(
    rx: &mut watch::Receiver<CatalogData>,
    pred: impl Fn(&CatalogData) -> bool,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        {
            let data = rx.borrow_and_update();
            if pred(&data) {
                return Ok(());
            }
        }
        rx.changed().await?;
    }
}

fn seed(source: &InMemoryCatalog) -> Result<(), serde_json::Error> {
    let apparel: Vec<RawProductRecord> = serde_json::from_value(serde_json::json!([
        {"id": "ap-01", "name": "Harbor Tee", "description": "Garment-dyed heavyweight tee", "price": "68.00", "originalPrice": "85.00"},
        {"id": "ap-02", "name": "Dune Overshirt", "price": "148.00"},
        {"id": "ap-03", "name": "Tide Pocket Tee", "price": "54.00", "originalPrice": "60.00"},
        {"id": "ap-04", "name": "Quarry Crewneck", "price": "110.00"},
        {"id": "ap-05", "name": "Mooring Cap", "price": "38.00", "isSoldOut": true},
        {"id": "ap-06", "name": "Ledger Chore Coat", "price": "196.00", "originalPrice": "280.00"},
        {"id": "ap-07", "name": "Skiff Longsleeve Tee", "price": "72.00"},
        {"id": "ap-08", "name": "Breaker Hooded Jacket", "price": "240.00"}
    ]))?;
    source.set_products(Category::Apparel, apparel);

    let detail: RawProductDetail = serde_json::from_value(serde_json::json!({
        "id": "ap-01",
        "name": "Harbor Tee",
        "description": "Garment-dyed heavyweight tee",
        "price": "68.00",
        "originalPrice": "85.00",
        "variants": [
            {"id": "ap-01-std", "tier": "standard", "price": "68.00", "originalPrice": "85.00"},
            {"id": "ap-01-prm", "tier": "premium", "price": "92.00", "originalPrice": "115.00"}
        ]
    }))?;
    source.set_detail(detail);
    Ok(())
}

fn prints_snapshot() -> Result<Vec<RawProductRecord>, serde_json::Error> {
    serde_json::from_value(serde_json::json!([
        {"id": "pr-01", "name": "Headland Print", "price": "45.00", "originalPrice": "65.00"},
        {"id": "pr-02", "name": "Low Tide Print", "price": "45.00"},
        {"id": "pr-03", "name": "Salt Flats Print", "price": "52.00"}
    ]))
}

fn print_page(page: &CatalogPage) {
    #[allow(clippy::print_stdout)]
    {
        println!(
            "  page {}/{} | {} match(es) | category {} | search {:?}",
            page.current_page, page.total_pages, page.total_matches, page.category, page.search,
        );
        for listed in &page.products {
            let discount = if listed.price.has_discount {
                format!(" (-{}%)", listed.price.discount_percentage)
            } else {
                String::new()
            };
            println!(
                "    {:<8} {:<24} {}{}",
                listed.product.id, listed.product.name, listed.price.display_price, discount,
            );
        }
    }
}

fn say(line: &str) {
    #[allow(clippy::print_stdout)]
    {
        println!("{line}");
    }
}
