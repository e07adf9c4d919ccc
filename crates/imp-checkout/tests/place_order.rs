//! End-to-end order placement against an on-disk SQLite database.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use tempfile::TempDir;

use imp_checkout::{Checkout, CheckoutConfig, CheckoutError, ErrorCode};
use imp_core::{CartLine, CoreError, Customer, DiscountKind, PlaceOrderRequest};
use imp_db::{Database, DbConfig, NewProduct};

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    _dir: TempDir,
    path: std::path::PathBuf,
    checkout: Checkout,
    /// Trading Cards, 1000p, stock 100
    booster: String,
    /// Trading Cards, 5000p, stock 100
    booster_box: String,
    /// Trading Cards, 11000p, preorder without stock row
    next_set: String,
    /// Board Games, 2500p, stock 3
    deck: String,
    /// Uncategorised, 1999p, physical but never counted
    playmat: String,
}

fn march_14() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn test_config() -> CheckoutConfig {
    let mut config = CheckoutConfig::default();
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 10;
    config.retry.max_attempts = 10;
    config.retry.transaction_timeout_secs = 30;
    config
}

async fn fixture() -> Fixture {
    fixture_with(test_config()).await
}

async fn fixture_with(config: CheckoutConfig) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("imp.db");
    let db = Database::new(
        DbConfig::new(&path)
            .max_connections(8)
            .busy_timeout(Duration::from_secs(30)),
    )
    .await
    .unwrap();

    let catalog = db.catalog();
    let cards = catalog.insert_category("Trading Cards").await.unwrap();
    let games = catalog.insert_category("Board Games").await.unwrap();

    let product = |name: &str, category: Option<&String>, price_cents: i64, is_preorder: bool| {
        NewProduct {
            name: name.to_string(),
            category_id: category.cloned(),
            price_cents,
            is_preorder,
        }
    };

    let booster = catalog
        .insert_product(&product("Booster Pack", Some(&cards), 1000, false))
        .await
        .unwrap();
    let booster_box = catalog
        .insert_product(&product("Booster Box", Some(&cards), 5000, false))
        .await
        .unwrap();
    let next_set = catalog
        .insert_product(&product("Next Set Box", Some(&cards), 11000, true))
        .await
        .unwrap();
    let deck = catalog
        .insert_product(&product("Deck Builder", Some(&games), 2500, false))
        .await
        .unwrap();
    let playmat = catalog
        .insert_product(&product("Playmat", None, 1999, false))
        .await
        .unwrap();

    db.stock().set_level(&booster, 100).await.unwrap();
    db.stock().set_level(&booster_box, 100).await.unwrap();
    db.stock().set_level(&deck, 3).await.unwrap();

    let codes = db.discount_codes();
    let now = march_14();
    codes
        .create("SAVE20", DiscountKind::Percentage, 2000, true, None)
        .await
        .unwrap();
    codes
        .create("TENOFF", DiscountKind::Percentage, 1000, true, Some(now + ChronoDuration::days(30)))
        .await
        .unwrap();
    codes
        .create("FIVER", DiscountKind::Fixed, 500, true, None)
        .await
        .unwrap();
    codes
        .create("SUMMER", DiscountKind::Percentage, 1500, true, Some(now - ChronoDuration::days(1)))
        .await
        .unwrap();
    codes
        .create("RETIRED", DiscountKind::Fixed, 1000, false, None)
        .await
        .unwrap();

    Fixture {
        _dir: dir,
        path,
        checkout: Checkout::new(db, config),
        booster,
        booster_box,
        next_set,
        deck,
        playmat,
    }
}

fn customer(email: &str) -> Customer {
    Customer {
        account_id: None,
        email: email.to_string(),
        name: "Ada Lovelace".to_string(),
        address_line1: "1 Engine Row".to_string(),
        address_line2: None,
        city: "London".to_string(),
        postcode: "N1 1AA".to_string(),
        country: "GB".to_string(),
    }
}

fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> CartLine {
    CartLine {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
    }
}

fn request(email: &str, items: Vec<CartLine>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer: customer(email),
        shipping_cents: 0,
        items,
        discount_code: None,
    }
}

impl Fixture {
    fn db(&self) -> &Database {
        self.checkout.database()
    }

    async fn place(&self, request: &PlaceOrderRequest) -> Result<imp_core::PlacedOrder, CheckoutError> {
        self.checkout.place_order_at(request, march_14()).await
    }

    /// (orders, items, vat records, stock amount total, stock sold total)
    async fn table_state(&self) -> (i64, i64, i64, i64, i64) {
        let db = self.db();
        let (amount, sold) = db.stock().totals().await.unwrap();
        (
            db.orders().count().await.unwrap(),
            db.orders().count_items().await.unwrap(),
            db.vat_records().count().await.unwrap(),
            amount,
            sold,
        )
    }
}

// =============================================================================
// Pricing Examples
// =============================================================================

#[tokio::test]
async fn test_returning_customer_no_discount() {
    let f = fixture().await;
    f.place(&request("ada@example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap();

    let mut req = request("ada@example.com", vec![line(&f.booster, 2, 1000)]);
    req.shipping_cents = 500;
    let placed = f.place(&req).await.unwrap();

    let order = &placed.order;
    assert_eq!(order.subtotal_cents, 2000);
    assert_eq!(order.discount_cents, 0);
    assert_eq!(order.discounted_subtotal().cents(), 2000);
    assert_eq!(order.vat_cents, 333);
    assert_eq!(order.total_cents, 2500);
    assert!(!order.first_order);
    assert_eq!(order.discount_code_id, None);
}

#[tokio::test]
async fn test_first_order_discount() {
    let f = fixture().await;
    let placed = f
        .place(&request("new@example.com", vec![line(&f.booster_box, 2, 5000)]))
        .await
        .unwrap();

    let order = &placed.order;
    assert_eq!(order.subtotal_cents, 10000);
    assert_eq!(order.discount_cents, 500);
    assert_eq!(order.discounted_subtotal().cents(), 9500);
    assert_eq!(order.vat_cents, 1583);
    assert_eq!(order.total_cents, 9500);
    assert!(order.first_order);

    let vat = &placed.vat_record;
    assert_eq!(vat.order_id, order.id);
    assert_eq!(vat.order_number, order.order_number);
    assert_eq!(vat.subtotal_cents, 9500);
    assert_eq!(vat.vat_cents, 1583);
    assert_eq!(vat.total_cents, 9500);
    assert_eq!(vat.vat_rate_bps, 2000);
}

#[tokio::test]
async fn test_percentage_code() {
    let f = fixture().await;
    f.place(&request("ada@example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap();

    let mut req = request("ada@example.com", vec![line(&f.booster_box, 1, 5000)]);
    req.discount_code = Some("SAVE20".to_string());
    let placed = f.place(&req).await.unwrap();

    let order = &placed.order;
    assert_eq!(order.subtotal_cents, 5000);
    assert_eq!(order.discount_cents, 1000);
    assert_eq!(order.discounted_subtotal().cents(), 4000);
    assert_eq!(order.vat_cents, 667);
    assert_eq!(order.total_cents, 4000);
    assert_eq!(order.discount_code.as_deref(), Some("SAVE20"));
    assert!(order.discount_code_id.is_some());
}

#[tokio::test]
async fn test_code_beats_first_order_discount() {
    let f = fixture().await;
    let mut req = request("new@example.com", vec![line(&f.booster_box, 2, 5000)]);
    req.discount_code = Some("TENOFF".to_string());

    let placed = f.place(&req).await.unwrap();

    assert_eq!(placed.order.discount_cents, 1000);
    assert_eq!(placed.order.total_cents, 9000);
    assert!(!placed.order.first_order);
}

#[tokio::test]
async fn test_code_is_case_insensitive_and_trimmed() {
    let f = fixture().await;
    let mut req = request("new@example.com", vec![line(&f.booster_box, 1, 5000)]);
    req.discount_code = Some("  save20 ".to_string());

    let placed = f.place(&req).await.unwrap();

    assert_eq!(placed.order.discount_cents, 1000);
    assert_eq!(placed.order.discount_code.as_deref(), Some("SAVE20"));
}

#[tokio::test]
async fn test_fixed_code_discount() {
    let f = fixture().await;
    let mut req = request("new@example.com", vec![line(&f.booster, 1, 1000)]);
    req.discount_code = Some("FIVER".to_string());
    req.shipping_cents = 399;

    let placed = f.place(&req).await.unwrap();
    assert_eq!(placed.order.discount_cents, 500);
    assert_eq!(placed.order.total_cents, 899);
}

#[tokio::test]
async fn test_unusable_codes_fall_back_to_first_order() {
    let f = fixture().await;

    for (i, code) in ["SUMMER", "RETIRED", "NOSUCHCODE"].iter().enumerate() {
        let mut req = request(
            &format!("new{i}@example.com"),
            vec![line(&f.booster_box, 2, 5000)],
        );
        req.discount_code = Some(code.to_string());

        let placed = f.place(&req).await.unwrap();

        assert_eq!(placed.order.discount_cents, 500, "code {code}");
        assert!(placed.order.first_order, "code {code}");
        assert_eq!(placed.order.discount_code_id, None, "code {code}");
        assert_eq!(placed.order.discount_code, None, "code {code}");
    }
}

#[tokio::test]
async fn test_prior_order_matched_by_email_case_insensitively() {
    let f = fixture().await;
    f.place(&request("Ada@Example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap();

    let placed = f
        .place(&request("ada@example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap();
    assert!(!placed.order.first_order);
    assert_eq!(placed.order.discount_cents, 0);
}

#[tokio::test]
async fn test_prior_order_matched_by_account() {
    let f = fixture().await;
    let mut first = request("old-address@example.com", vec![line(&f.booster, 1, 1000)]);
    first.customer.account_id = Some("acct-7".to_string());
    assert!(f.place(&first).await.unwrap().order.first_order);

    let mut second = request("new-address@example.com", vec![line(&f.booster, 1, 1000)]);
    second.customer.account_id = Some("acct-7".to_string());
    let placed = f.place(&second).await.unwrap();
    assert!(!placed.order.first_order);
    assert_eq!(placed.order.customer_id.as_deref(), Some("acct-7"));
}

// =============================================================================
// Order Numbers
// =============================================================================

#[tokio::test]
async fn test_order_numbers_scoped_by_category_and_date() {
    let f = fixture().await;

    let first = f
        .place(&request("a@example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap();
    let second = f
        .place(&request(
            "b@example.com",
            vec![line(&f.booster_box, 1, 5000), line(&f.deck, 1, 2500)],
        ))
        .await
        .unwrap();
    let games = f
        .place(&request(
            "c@example.com",
            vec![line(&f.deck, 1, 2500), line(&f.booster, 1, 1000)],
        ))
        .await
        .unwrap();
    let preorder = f
        .place(&request("d@example.com", vec![line(&f.next_set, 1, 11000)]))
        .await
        .unwrap();
    let next_day = f
        .checkout
        .place_order_at(
            &request("e@example.com", vec![line(&f.booster, 1, 1000)]),
            march_14() + ChronoDuration::days(1),
        )
        .await
        .unwrap();

    assert_eq!(first.order.order_number, "IMP-TRADINGCARDS-20260314-001");
    assert_eq!(second.order.order_number, "IMP-TRADINGCARDS-20260314-002");
    assert_eq!(games.order.order_number, "IMP-BOARDGAMES-20260314-001");
    assert_eq!(preorder.order.order_number, "IMP-TRADINGCARDS-20260314-003");
    assert_eq!(next_day.order.order_number, "IMP-TRADINGCARDS-20260315-001");
}

#[tokio::test]
async fn test_uncategorised_first_line_uses_unknown() {
    let f = fixture().await;
    f.db().stock().set_level(&f.playmat, 5).await.unwrap();

    let placed = f
        .place(&request("a@example.com", vec![line(&f.playmat, 1, 1999)]))
        .await
        .unwrap();
    assert_eq!(placed.order.order_number, "IMP-UNKNOWN-20260314-001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_get_distinct_gapless_numbers() {
    let f = fixture().await;
    const N: usize = 50;

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let checkout = f.checkout.clone();
        let req = request(&format!("buyer{i}@example.com"), vec![line(&f.booster, 1, 1000)]);
        handles.push(tokio::spawn(async move {
            checkout.place_order_at(&req, march_14()).await
        }));
    }

    let mut numbers = BTreeSet::new();
    for handle in handles {
        let placed = handle.await.unwrap().unwrap();
        numbers.insert(placed.order.order_number);
    }

    let expected: BTreeSet<String> = (1..=N)
        .map(|seq| format!("IMP-TRADINGCARDS-20260314-{seq:03}"))
        .collect();
    assert_eq!(numbers, expected);

    let stock = f.db().stock().get(&f.booster).await.unwrap().unwrap();
    assert_eq!(stock.amount, 100 - N as i64);
    assert_eq!(stock.sold, N as i64);
    assert_eq!(f.db().vat_records().count().await.unwrap(), N as i64);
    assert_eq!(
        f.db()
            .counters()
            .current("IMP-TRADINGCARDS-20260314")
            .await
            .unwrap(),
        Some(N as i64)
    );
}

// =============================================================================
// Stock
// =============================================================================

#[tokio::test]
async fn test_stock_decremented_and_sold_incremented() {
    let f = fixture().await;
    f.place(&request("a@example.com", vec![line(&f.deck, 2, 2500)]))
        .await
        .unwrap();

    let stock = f.db().stock().get(&f.deck).await.unwrap().unwrap();
    assert_eq!(stock.amount, 1);
    assert_eq!(stock.sold, 2);
}

#[tokio::test]
async fn test_oversell_leaves_every_table_unchanged() {
    let f = fixture().await;
    let before = f.table_state().await;

    let err = f
        .place(&request(
            "a@example.com",
            vec![line(&f.booster, 1, 1000), line(&f.deck, 5, 2500)],
        ))
        .await
        .unwrap_err();

    match &err {
        CheckoutError::Rejected(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
        }) => {
            assert_eq!(product_id, &f.deck);
            assert_eq!(*available, 3);
            assert_eq!(*requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    assert_eq!(f.table_state().await, before);
    assert_eq!(
        f.db()
            .counters()
            .current("IMP-TRADINGCARDS-20260314")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_duplicate_lines_share_stock() {
    let f = fixture().await;
    let err = f
        .place(&request(
            "a@example.com",
            vec![line(&f.deck, 2, 2500), line(&f.deck, 2, 2500)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Rejected(CoreError::InsufficientStock { available: 1, requested: 2, .. })
    ));
    assert_eq!(f.db().stock().get(&f.deck).await.unwrap().unwrap().amount, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_buyers_never_oversell() {
    let f = fixture().await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let checkout = f.checkout.clone();
        let req = request(&format!("fan{i}@example.com"), vec![line(&f.deck, 1, 2500)]);
        handles.push(tokio::spawn(async move {
            checkout.place_order_at(&req, march_14()).await
        }));
    }

    let mut placed = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(CheckoutError::Rejected(CoreError::InsufficientStock { .. })) => sold_out += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(sold_out, 7);
    let stock = f.db().stock().get(&f.deck).await.unwrap().unwrap();
    assert_eq!(stock.amount, 0);
    assert_eq!(stock.sold, 3);
    assert_eq!(f.db().orders().count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_preorder_bypasses_stock() {
    let f = fixture().await;
    let before = f.db().stock().totals().await.unwrap();

    let placed = f
        .place(&request(
            "a@example.com",
            vec![line(&f.next_set, 4, 11000), line(&f.booster, 1, 1000)],
        ))
        .await
        .unwrap();

    assert_eq!(placed.items.len(), 2);
    assert!(placed.items[0].preorder);
    assert!(!placed.items[1].preorder);
    assert!(f.db().stock().get(&f.next_set).await.unwrap().is_none());

    let (amount, sold) = f.db().stock().totals().await.unwrap();
    assert_eq!(amount, before.0 - 1);
    assert_eq!(sold, before.1 + 1);
}

#[tokio::test]
async fn test_missing_stock_record() {
    let f = fixture().await;
    let before = f.table_state().await;

    let err = f
        .place(&request("a@example.com", vec![line(&f.playmat, 1, 1999)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::MissingStock);
    assert_eq!(f.table_state().await, before);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_price_mismatch_rejected() {
    let f = fixture().await;
    f.db().catalog().set_price(&f.booster, 1100).await.unwrap();
    let before = f.table_state().await;

    let err = f
        .place(&request("a@example.com", vec![line(&f.booster, 1, 1000)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::PriceMismatch);
    assert_eq!(
        err.to_string(),
        format!("Price mismatch for {}: submitted £10.00, current £11.00", f.booster)
    );
    assert_eq!(f.table_state().await, before);
}

#[tokio::test]
async fn test_unknown_product_rejected() {
    let f = fixture().await;
    let err = f
        .place(&request("a@example.com", vec![line("no-such-product", 1, 1000)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProductNotFound);
}

#[tokio::test]
async fn test_invalid_requests_rejected_before_transaction() {
    let f = fixture().await;

    let empty = request("a@example.com", vec![]);
    let zero_qty = request("a@example.com", vec![line(&f.booster, 0, 1000)]);
    let bad_email = request("not-an-email", vec![line(&f.booster, 1, 1000)]);
    let mut negative_shipping = request("a@example.com", vec![line(&f.booster, 1, 1000)]);
    negative_shipping.shipping_cents = -1;
    let mut huge_shipping = request("a@example.com", vec![line(&f.booster, 1, 1000)]);
    huge_shipping.shipping_cents = i64::MAX;

    for req in [empty, zero_qty, bad_email, negative_shipping, huge_shipping] {
        let err = f.place(&req).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError, "{err}");
    }
    assert_eq!(f.table_state().await.0, 0);
}

#[tokio::test]
async fn test_persisted_order_matches_returned() {
    let f = fixture().await;
    let mut req = request("a@example.com", vec![line(&f.booster, 3, 1000), line(&f.deck, 1, 2500)]);
    req.shipping_cents = 399;

    let placed = f.place(&req).await.unwrap();
    let stored = f
        .db()
        .orders()
        .get_placed(&placed.order.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored, placed);
    assert_eq!(stored.items[0].line_no, 1);
    assert_eq!(stored.items[0].line_total_cents, 3000);
    assert_eq!(stored.items[1].line_no, 2);
    assert_eq!(
        stored.order.total_cents,
        stored.order.discounted_subtotal().cents() + 399
    );
}

// =============================================================================
// Contention
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_locked_database_retries_then_gives_up() {
    let mut config = test_config();
    config.retry.max_attempts = 3;
    let f = fixture_with(config.clone()).await;

    // A second handle that fails at once instead of waiting for the lock.
    let impatient_db = Database::new(
        DbConfig::new(&f.path)
            .max_connections(1)
            .busy_timeout(Duration::ZERO)
            .run_migrations(false),
    )
    .await
    .unwrap();
    let impatient = Checkout::new(impatient_db, config);

    let holder = f.db().begin_order_transaction().await.unwrap();
    let req = request("a@example.com", vec![line(&f.booster, 1, 1000)]);

    let err = impatient.place_order_at(&req, march_14()).await.unwrap_err();
    match &err {
        CheckoutError::RetriesExhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert!(matches!(**last, CheckoutError::Busy(_)));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::TryAgain);

    holder.rollback().await.unwrap();

    let placed = impatient.place_order_at(&req, march_14()).await.unwrap();
    assert_eq!(placed.order.order_number, "IMP-TRADINGCARDS-20260314-001");
}

#[tokio::test]
async fn test_timed_out_attempt_rolls_back_without_retry() {
    let mut config = test_config();
    config.retry.transaction_timeout_secs = 1;
    let f = fixture_with(config).await;
    let before = f.table_state().await;

    // The 30s busy timeout outlasts the 1s attempt deadline
    let holder = f.db().begin_order_transaction().await.unwrap();
    let req = request("a@example.com", vec![line(&f.booster, 1, 1000)]);

    let err = f.place(&req).await.unwrap_err();
    assert!(
        matches!(err, CheckoutError::TimedOut { after_secs: 1 }),
        "expected TimedOut, got {err:?}"
    );
    assert_eq!(err.code(), ErrorCode::TimedOut);

    holder.rollback().await.unwrap();

    assert_eq!(f.table_state().await, before);
    assert_eq!(
        f.db()
            .counters()
            .current("IMP-TRADINGCARDS-20260314")
            .await
            .unwrap(),
        None
    );
}
