//! Integration tests for the category feeds.
//!
//! These tests drive the controller against the in-memory source and
//! verify the replication contract: wholesale replaces, one fetch per
//! signal, snapshot deliveries, failure degradation, and teardown of
//! subscriptions on category switches and shutdown.

#![allow(clippy::unwrap_used)]

use bayberry_catalog::nav::{HistoryStack, MemoryStorage, NavState, StateStorage};
use bayberry_core::Category;
use bayberry_integration_tests::{
    TestCatalog, drain_tasks, record, wait_until,
};

/// Harness whose remembered category is prints, the snapshot-fed one.
fn prints_catalog() -> TestCatalog {
    let storage = MemoryStorage::new();
    storage
        .save(&NavState {
            selected_category: Category::Prints,
            ..NavState::default()
        })
        .unwrap();
    TestCatalog::with_parts(Box::new(storage), HistoryStack::new())
}

// =============================================================================
// Signal Feed
// =============================================================================

#[tokio::test]
async fn test_activation_fetches_initial_list() {
    let mut ctx = TestCatalog::new();
    ctx.source.set_products(
        Category::Apparel,
        vec![record("p1", "Harbor Tee", "68.00"), record("p2", "Dune Cap", "38.00")],
    );

    let data = ctx.start_and_settle().await;

    assert!(!data.loading);
    assert_eq!(data.products.len(), 2);
    assert_eq!(data.products[0].category, Category::Apparel);
}

#[tokio::test]
async fn test_change_signal_replaces_list_wholesale() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.start_and_settle().await;
    let source = ctx.source.clone();
    wait_until(|| source.change_subscribers(Category::Apparel) == 1).await;

    // Removals propagate too: the new list wins in full.
    ctx.source.set_products(
        Category::Apparel,
        vec![record("p2", "Dune Cap", "38.00"), record("p3", "Quarry Crew", "110.00")],
    );
    ctx.source.notify_changed(Category::Apparel);

    ctx.settled_with_ids(&["p2", "p3"]).await;
}

#[tokio::test]
async fn test_every_signal_triggers_its_own_fetch() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.start_and_settle().await;
    let source = ctx.source.clone();
    wait_until(|| source.change_subscribers(Category::Apparel) == 1).await;

    // Three signals, three refetches; nothing deduplicates.
    ctx.source.notify_changed(Category::Apparel);
    ctx.source.notify_changed(Category::Apparel);
    ctx.source.notify_changed(Category::Apparel);

    wait_until(|| source.list_calls() == 4).await;
}

#[tokio::test]
async fn test_stale_response_overwrites_fresher_data() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "First Cut", "20.00")]);
    let source = ctx.source.clone();

    // Park the initial fetch. It has already captured the first list.
    let slow = ctx.source.hold_next_list(Category::Apparel);
    ctx.controller.start();
    wait_until(|| source.list_calls() == 1).await;

    // Publish fresher data and let its refetch resolve first.
    ctx.source
        .set_products(Category::Apparel, vec![record("p2", "Second Cut", "20.00")]);
    let fast = ctx.source.hold_next_list(Category::Apparel);
    wait_until(|| source.change_subscribers(Category::Apparel) == 1).await;
    ctx.source.notify_changed(Category::Apparel);
    wait_until(|| source.list_calls() == 2).await;
    fast.release();
    ctx.settled_with_ids(&["p2"]).await;

    // The parked earlier response now resolves and wins, wholesale. The
    // catalog accepts this: last response to land is the one displayed.
    slow.release();
    ctx.settled_with_ids(&["p1"]).await;
}

#[tokio::test]
async fn test_list_failure_presents_empty_catalog() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.source.fail_lists(Category::Apparel, true);

    let data = ctx.start_and_settle().await;

    assert!(!data.loading);
    assert!(data.products.is_empty());
}

#[tokio::test]
async fn test_subscription_failure_keeps_fetched_list() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.source.fail_changes(Category::Apparel, true);

    ctx.start_and_settle().await;

    // Live updates are gone for the session; the fetched list stays up.
    ctx.source
        .set_products(Category::Apparel, vec![record("p2", "Dune Cap", "38.00")]);
    ctx.source.notify_changed(Category::Apparel);
    drain_tasks().await;

    let data = ctx.controller.data();
    assert_eq!(data.products.len(), 1);
    assert_eq!(data.products[0].id.as_str(), "p1");
}

// =============================================================================
// Snapshot Feed
// =============================================================================

#[tokio::test]
async fn test_each_snapshot_replaces_the_collection() {
    let mut ctx = prints_catalog();
    let source = ctx.source.clone();
    ctx.controller.start();
    wait_until(|| source.snapshot_subscribers() == 1).await;

    ctx.source.push_snapshot(vec![
        record("pr-01", "Headland Print", "45.00"),
        record("pr-02", "Low Tide Print", "45.00"),
    ]);
    let data = ctx.settled_with_ids(&["pr-01", "pr-02"]).await;
    assert_eq!(data.products[0].category, Category::Prints);

    // A later snapshot that dropped a product still wins in full.
    ctx.source
        .push_snapshot(vec![record("pr-03", "Salt Flats Print", "52.00")]);
    ctx.settled_with_ids(&["pr-03"]).await;
}

#[tokio::test]
async fn test_snapshot_subscription_failure_never_loads() {
    let ctx = prints_catalog();
    ctx.source.fail_snapshots(true);

    ctx.controller.start();
    drain_tasks().await;

    // No data ever arrived on this transport, so the view stays loading.
    assert!(ctx.controller.data().loading);
    assert!(ctx.controller.data().products.is_empty());
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn test_category_switch_tears_down_old_subscription() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.start_and_settle().await;
    let source = ctx.source.clone();
    wait_until(|| source.change_subscribers(Category::Apparel) == 1).await;

    ctx.controller.set_category(Category::Prints);

    wait_until(|| source.change_subscribers(Category::Apparel) == 0).await;
    wait_until(|| source.snapshot_subscribers() == 1).await;

    ctx.controller.shutdown();
    wait_until(|| source.snapshot_subscribers() == 0).await;
}

#[tokio::test]
async fn test_fetch_from_torn_down_category_is_discarded() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    let source = ctx.source.clone();

    let stalled = ctx.source.hold_next_list(Category::Apparel);
    ctx.controller.start();
    wait_until(|| source.list_calls() == 1).await;

    ctx.controller.set_category(Category::Prints);
    wait_until(|| source.snapshot_subscribers() == 1).await;
    ctx.source
        .push_snapshot(vec![record("pr-01", "Headland Print", "45.00")]);
    ctx.settled_with_ids(&["pr-01"]).await;

    // The apparel fetch resolves into its torn-down activation's channel
    // and goes nowhere.
    stalled.release();
    drain_tasks().await;

    let data = ctx.controller.data();
    assert_eq!(data.products.len(), 1);
    assert_eq!(data.products[0].id.as_str(), "pr-01");
}

#[tokio::test]
async fn test_foreign_category_signals_do_not_disturb_view() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.start_and_settle().await;
    let source = ctx.source.clone();
    wait_until(|| source.change_subscribers(Category::Apparel) == 1).await;

    ctx.controller.set_category(Category::Prints);
    wait_until(|| source.snapshot_subscribers() == 1).await;
    ctx.source
        .push_snapshot(vec![record("pr-01", "Headland Print", "45.00")]);
    ctx.settled_with_ids(&["pr-01"]).await;
    let baseline = source.list_calls();

    // An apparel signal now has no subscriber and triggers nothing.
    ctx.source.notify_changed(Category::Apparel);
    drain_tasks().await;

    assert_eq!(source.list_calls(), baseline);
    assert_eq!(ctx.controller.data().products[0].id.as_str(), "pr-01");
}

#[tokio::test]
async fn test_switching_category_marks_view_loading() {
    let mut ctx = TestCatalog::new();
    ctx.source
        .set_products(Category::Apparel, vec![record("p1", "Harbor Tee", "68.00")]);
    ctx.start_and_settle().await;

    ctx.controller.set_category(Category::Prints);

    // Loading immediately; the old category's products no longer project.
    let page = ctx.controller.page();
    assert!(page.loading);
    assert!(page.products.is_empty());
    assert_eq!(page.category, Category::Prints);
}
