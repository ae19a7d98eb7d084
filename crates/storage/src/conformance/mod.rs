//! Conformance test suite for `CafeStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any `CafeStorage`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Snapshot isolation**: uncommitted writes invisible, committed writes visible
//! - **Atomic commit**: all-or-nothing semantics for multi-table snapshots
//! - **Stock arithmetic**: exact decimal adjustment accumulation
//! - **Ledger semantics**: append-only rows, queryable by reference order
//! - **Error handling**: correct error variants for invalid operations
//! - **Concurrency**: racing snapshots serialize without lost updates
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh storage instance seeded with the [`Fixture`] data for each
//! test:
//!
//! ```ignore
//! use barista_storage::conformance::{run_conformance_suite, ConformanceReport};
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_seeded_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod concurrent;
mod error;
mod ledger;
mod snapshot;
mod stock;

use std::fmt;
use std::future::Future;

use rust_decimal::Decimal;

use crate::record::{NewInventoryTransaction, NewOrder, NewOrderItem, OrderStatus, TransactionKind};
use crate::CafeStorage;

/// Ids of the rows the factory must seed before each test.
///
/// Required contents:
/// - `milk`: ingredient, quantity 1000 (ml), reorder threshold 100
/// - `beans`: ingredient, quantity 500 (g), reorder threshold 50
/// - `latte`: active menu item, price 4.50, recipe 200 milk + 18 beans
/// - `espresso`: active menu item, price 2.50, recipe 18 beans
/// - `customer`: customer named "Alice"
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub milk: i64,
    pub beans: i64,
    pub latte: i64,
    pub espresso: i64,
    pub customer: i64,
}

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "snapshot", "commit", "stock").
    pub category: String,
    /// Test name (e.g. "uncommitted_order_invisible").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: true,
                message: None,
            },
            Err(msg) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: false,
                message: Some(msg),
            },
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh storage
/// instance seeded with the [`Fixture`] rows, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: CafeStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = (S, Fixture)>,
{
    let mut results = Vec::new();

    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(stock::run_stock_tests(&factory).await);
    results.extend(ledger::run_ledger_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

const STAMP: &str = "2026-01-01T00:00:00Z";

fn dec(s: &str) -> Decimal {
    s.parse().expect("conformance fixture decimal")
}

fn make_order(customer_id: i64, total: &str) -> NewOrder {
    NewOrder {
        customer_id,
        status: OrderStatus::Pending,
        payment_method: Some("card".to_string()),
        total_price: dec(total),
        special_instructions: None,
        created_at: STAMP.to_string(),
        updated_at: STAMP.to_string(),
    }
}

fn make_order_item(order_id: i64, menu_item_id: i64, quantity: i64, price: &str) -> NewOrderItem {
    NewOrderItem {
        order_id,
        menu_item_id,
        quantity,
        price_at_order: dec(price),
        customizations: None,
    }
}

fn make_transaction(
    ingredient_id: i64,
    delta: &str,
    kind: TransactionKind,
    reference_order_id: Option<i64>,
) -> NewInventoryTransaction {
    NewInventoryTransaction {
        ingredient_id,
        delta: dec(delta),
        kind,
        reference_order_id,
        note: None,
        created_at: STAMP.to_string(),
    }
}
