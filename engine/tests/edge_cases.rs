//! Edge case tests for basket-engine
//!
//! These tests cover boundary conditions, unusual inputs and the cart
//! invariants under arbitrary command sequences.

use basket_engine::{
    decode_lines, encode_lines, AddLine, Applied, CartCommand, CartMode, ColorSnapshot, LineRef,
    LocalCart, MigrationPlan, ProductSnapshot, StorageSnapshot,
};
use proptest::prelude::*;

fn product(name: &str, price: f64) -> ProductSnapshot {
    ProductSnapshot::new(name, price)
}

fn add(product_id: &str, quantity: u32, price: f64) -> CartCommand {
    CartCommand::Add(AddLine::new(product_id, quantity).with_product(product(product_id, price)))
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn anonymous_iphone_scenario() {
    let mut cart = LocalCart::new();

    cart.apply(add("iphone-17", 1, 799.0), 1000).unwrap();
    let view = cart.view();
    assert_eq!(view.item_count, 1);
    assert_eq!(view.total, 799.0);

    cart.apply(
        CartCommand::UpdateQuantity {
            line: LineRef::Local(0),
            quantity: 3,
        },
        2000,
    )
    .unwrap();
    let view = cart.view();
    assert_eq!(view.item_count, 3);
    assert_eq!(view.total, 2397.0);

    // The migration replays exactly one add with the full quantity.
    let plan = MigrationPlan::from_lines(cart.lines());
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.steps[0].product_id, "iphone-17");
    assert_eq!(plan.steps[0].quantity, 3);
    assert_eq!(CartMode::of(true, !cart.is_empty()), CartMode::Migrating);
}

#[test]
fn merge_not_duplicate() {
    let mut cart = LocalCart::new();
    let color = ColorSnapshot {
        name: "Space Black".into(),
        price_adjustment: 0.0,
    };
    let storage = StorageSnapshot {
        label: "1 TB".into(),
        price: 400.0,
    };

    for quantity in [2, 5] {
        let cmd = AddLine::new("macbook-pro", quantity)
            .with_product(product("MacBook Pro", 1999.0))
            .with_color(7, color.clone())
            .with_storage(3, storage.clone());
        cart.apply(CartCommand::Add(cmd), 1).unwrap();
    }

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get(0).unwrap().quantity(), 7);
    assert_eq!(cart.view().total, 7.0 * 2399.0);
}

// ============================================================================
// Numeric edge cases
// ============================================================================

#[test]
fn fractional_prices_are_not_rounded() {
    let mut cart = LocalCart::new();
    cart.apply(add("cable", 3, 19.99), 1).unwrap();

    let line = cart.get(0).unwrap();
    assert_eq!(line.total_price(), 19.99 * 3.0);
}

#[test]
fn huge_quantities_saturate() {
    let mut cart = LocalCart::new();
    cart.apply(add("sticker", u32::MAX, 0.5), 1).unwrap();
    cart.apply(add("sticker", 10, 0.5), 2).unwrap();
    assert_eq!(cart.get(0).unwrap().quantity(), u32::MAX);

    cart.apply(
        CartCommand::UpdateQuantity {
            line: LineRef::Local(0),
            quantity: i64::MAX,
        },
        3,
    )
    .unwrap();
    assert_eq!(cart.get(0).unwrap().quantity(), u32::MAX);
}

#[test]
fn free_products() {
    let mut cart = LocalCart::new();
    cart.apply(add("gift-card-sleeve", 2, 0.0), 1).unwrap();
    assert_eq!(cart.view().total, 0.0);
    assert_eq!(cart.view().item_count, 2);
}

// ============================================================================
// String edge cases
// ============================================================================

#[test]
fn unicode_display_fields_survive_storage() {
    let names = ["iPhone 17 日本", "Ø Ær Å", "🎉 Bundle", "Tab\tName"];
    let mut cart = LocalCart::new();

    for (i, name) in names.iter().enumerate() {
        let cmd = AddLine::new(format!("p{i}"), 1).with_product(product(name, 1.0));
        cart.apply(CartCommand::Add(cmd), 1).unwrap();
    }

    let raw = encode_lines(cart.lines()).unwrap();
    let decoded = decode_lines(Some(&raw));

    for (i, name) in names.iter().enumerate() {
        let line = decoded.cart.get(i).unwrap();
        assert_eq!(line.display().product_name.as_deref(), Some(*name));
    }
}

#[test]
fn empty_product_id_is_a_valid_key() {
    let mut cart = LocalCart::new();
    cart.apply(add("", 1, 1.0), 1).unwrap();
    cart.apply(add("", 1, 1.0), 2).unwrap();
    assert_eq!(cart.len(), 1);
}

// ============================================================================
// Addressing edge cases
// ============================================================================

#[test]
fn operations_on_empty_cart() {
    let mut cart = LocalCart::new();

    assert!(cart
        .apply(
            CartCommand::Remove {
                line: LineRef::Local(0)
            },
            1
        )
        .is_err());
    assert!(cart
        .apply(
            CartCommand::UpdateQuantity {
                line: LineRef::Local(0),
                quantity: 2
            },
            1
        )
        .is_err());
    assert_eq!(
        cart.apply(CartCommand::Clear, 1).unwrap(),
        Applied::Cleared { removed: 0 }
    );
}

#[test]
fn stored_blob_with_stale_totals_is_repaired() {
    let raw = r#"[{"productId":"ipad-air","quantity":2,"unitPrice":599.0,"totalPrice":599.0}]"#;
    let decoded = decode_lines(Some(raw));
    assert_eq!(decoded.cart.view().total, 1198.0);
}

// ============================================================================
// Property tests
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Add { product: u8, quantity: u32 },
    Update { index: usize, quantity: i64 },
    Remove { index: usize },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..4, 1u32..10).prop_map(|(product, quantity)| Step::Add { product, quantity }),
        (0usize..5, -2i64..10).prop_map(|(index, quantity)| Step::Update { index, quantity }),
        (0usize..5).prop_map(|index| Step::Remove { index }),
    ]
}

fn price_of(product: u8) -> f64 {
    [799.0, 129.0, 1999.0, 49.0][usize::from(product)]
}

proptest! {
    #[test]
    fn prop_total_matches_lines(steps in prop::collection::vec(arb_step(), 0..40)) {
        let mut cart = LocalCart::new();

        for (ts, step) in steps.into_iter().enumerate() {
            let cmd = match step {
                Step::Add { product, quantity } => {
                    add(&format!("p{product}"), quantity, price_of(product))
                }
                Step::Update { index, quantity } => CartCommand::UpdateQuantity {
                    line: LineRef::Local(index),
                    quantity,
                },
                Step::Remove { index } => CartCommand::Remove {
                    line: LineRef::Local(index),
                },
            };
            // Out-of-range indices are errors that leave the cart unchanged.
            let _ = cart.apply(cmd, ts as u64);

            let view = cart.view();
            let expected: f64 = cart
                .lines()
                .iter()
                .map(|l| l.unit_price() * f64::from(l.quantity()))
                .sum();
            prop_assert_eq!(view.total, expected);

            let count: u64 = cart.lines().iter().map(|l| u64::from(l.quantity())).sum();
            prop_assert_eq!(view.item_count, count);

            // At most one line per triple.
            for (i, a) in cart.lines().iter().enumerate() {
                for b in &cart.lines()[i + 1..] {
                    prop_assert_ne!(a.key(), b.key());
                }
            }
        }
    }

    #[test]
    fn prop_adds_sum_quantities(q1 in 1u32..1000, q2 in 1u32..1000) {
        let mut cart = LocalCart::new();
        cart.apply(add("p", q1, 10.0), 1).unwrap();
        cart.apply(add("p", q2, 10.0), 2).unwrap();

        prop_assert_eq!(cart.len(), 1);
        prop_assert_eq!(cart.get(0).unwrap().quantity(), q1 + q2);
    }
}
