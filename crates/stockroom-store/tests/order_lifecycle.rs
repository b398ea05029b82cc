//! End-to-end behaviour of a store opened on a fresh data directory.

use std::path::Path;
use std::sync::Arc;

use stockroom_core::{
    AuditAction, Cart, CoreError, ErrorKind, Money, NewProduct, OrderStatus, PasswordRule,
    Product, ProductUpdate, MAX_PRICE_CENTS,
};
use stockroom_store::{BreachCheck, BreachCheckError, Store, StoreConfig, StoreError};

async fn open(dir: &Path) -> Store {
    Store::open_with(StoreConfig::with_data_dir(dir), None)
        .await
        .unwrap()
}

fn cart(pairs: &[(u64, u32)]) -> Cart {
    Cart::from_pairs(pairs.iter().copied()).unwrap()
}

async fn quantity_of(store: &Store, id: u64) -> u32 {
    store.catalog().get(id).await.unwrap().unwrap().quantity
}

#[tokio::test]
async fn place_then_cancel_restores_stock() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let product = store
        .catalog()
        .add(NewProduct::new("Stapler", "2.00".parse().unwrap(), 10))
        .await
        .unwrap();

    let placed = store
        .orders()
        .place("ana", &cart(&[(product.id, 4)]))
        .await
        .unwrap();
    assert_eq!(placed.order.total.to_string(), "8.00");
    assert_eq!(quantity_of(&store, product.id).await, 6);

    let outcome = store.orders().cancel(placed.order.id).await.unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert_eq!(quantity_of(&store, product.id).await, 10);

    // No way out of cancelled
    assert!(matches!(
        store.orders().cancel(placed.order.id).await,
        Err(StoreError::Domain(CoreError::InvalidTransition { .. }))
    ));
    assert!(matches!(
        store.orders().validate(placed.order.id).await,
        Err(StoreError::Domain(CoreError::InvalidTransition { .. }))
    ));
    assert_eq!(quantity_of(&store, product.id).await, 10);
}

#[tokio::test]
async fn oversized_order_fails_and_leaves_stock() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let product = store
        .catalog()
        .add(NewProduct::new("Pen", Money::from_cents(150), 3))
        .await
        .unwrap();

    let err = store
        .orders()
        .place("ana", &cart(&[(product.id, 4)]))
        .await
        .unwrap_err();

    match err {
        StoreError::Domain(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
        }) => {
            assert_eq!(product_id, product.id);
            assert_eq!(available, 3);
            assert_eq!(requested, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(quantity_of(&store, product.id).await, 3);
}

#[tokio::test]
async fn validate_succeeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let product = store
        .catalog()
        .add(NewProduct::new("Pen", Money::from_cents(150), 3))
        .await
        .unwrap();
    let placed = store
        .orders()
        .place("ana", &cart(&[(product.id, 1)]))
        .await
        .unwrap();

    let validated = store.orders().validate(placed.order.id).await.unwrap();
    assert_eq!(validated.status, OrderStatus::Validated);

    let err = store.orders().validate(placed.order.id).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Domain(CoreError::InvalidTransition {
            from: OrderStatus::Validated,
            to: OrderStatus::Validated,
            ..
        })
    ));
    // Validation does not touch stock
    assert_eq!(quantity_of(&store, product.id).await, 2);
}

#[tokio::test]
async fn order_and_line_ids_strictly_increase() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let a = store
        .catalog()
        .add(NewProduct::new("A", Money::from_cents(100), 50))
        .await
        .unwrap();
    let b = store
        .catalog()
        .add(NewProduct::new("B", Money::from_cents(100), 50))
        .await
        .unwrap();

    let mut last_order = 0;
    let mut last_line = 0;
    for _ in 0..4 {
        let placed = store
            .orders()
            .place("ana", &cart(&[(a.id, 1), (b.id, 2)]))
            .await
            .unwrap();
        assert!(placed.order.id > last_order);
        last_order = placed.order.id;
        for line in &placed.lines {
            assert!(line.id > last_line);
            last_line = line.id;
        }
    }
    assert_eq!(last_order, 4);
    assert_eq!(last_line, 8);
}

#[tokio::test]
async fn price_change_does_not_touch_placed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let product = store
        .catalog()
        .add(NewProduct::new("Lamp", Money::from_cents(2500), 5))
        .await
        .unwrap();
    let placed = store
        .orders()
        .place("ana", &cart(&[(product.id, 2)]))
        .await
        .unwrap();

    store
        .catalog()
        .update(product.id, ProductUpdate::default().price(Money::from_cents(9900)))
        .await
        .unwrap();

    let stored = store.orders().get(placed.order.id).await.unwrap().unwrap();
    assert_eq!(stored.lines[0].unit_price, Money::from_cents(2500));
    assert_eq!(stored.order.total, Money::from_cents(5000));
}

#[tokio::test]
async fn weak_password_reports_every_rule() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;

    let err = store.credentials().register("alice", "?").await.unwrap_err();
    match &err {
        StoreError::Domain(CoreError::WeakPassword(rules)) => assert_eq!(
            rules,
            &vec![
                PasswordRule::MinLength,
                PasswordRule::Uppercase,
                PasswordRule::Lowercase,
                PasswordRule::Digit,
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("8 characters"), "{message}");
    assert!(message.contains("digit"), "{message}");
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;

    store.credentials().register("alice", "Abcdef12").await.unwrap();
    let err = store
        .credentials()
        .register("alice", "Other123")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Domain(CoreError::DuplicateUser(_))));

    // Usernames are case-sensitive
    store.credentials().register("Alice", "Other123").await.unwrap();
    assert_eq!(store.credentials().list_users().await.unwrap().len(), 2);
}

#[tokio::test]
async fn login_attempts_are_audited() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let alice = store.credentials().register("alice", "Abcdef12").await.unwrap();

    let user = store.credentials().login("alice", "Abcdef12").await.unwrap();
    assert_eq!(user.id, alice.id);
    assert!(matches!(
        store.credentials().login("alice", "Wrong1234").await,
        Err(StoreError::Domain(CoreError::BadPassword))
    ));

    let entries = store.audit().entries().await.unwrap();
    let summary: Vec<(AuditAction, bool)> = entries.iter().map(|e| (e.action, e.success)).collect();
    assert_eq!(
        summary,
        vec![
            (AuditAction::Register, true),
            (AuditAction::Login, true),
            (AuditAction::Login, false),
        ]
    );
    assert!(entries.iter().all(|e| e.username == "alice"));
}

#[tokio::test]
async fn top_products_ranks_by_units() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let three = store
        .catalog()
        .add(NewProduct::new("Three", Money::from_cents(100), 10))
        .await
        .unwrap();
    let five = store
        .catalog()
        .add(NewProduct::new("Five", Money::from_cents(100), 10))
        .await
        .unwrap();

    for (id, quantity) in [(three.id, 3), (five.id, 5)] {
        let placed = store
            .orders()
            .place("ana", &cart(&[(id, quantity)]))
            .await
            .unwrap();
        store.orders().validate(placed.order.id).await.unwrap();
    }

    let top = store.stats().top_products(Some(1)).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].product_id, five.id);
    assert_eq!(top[0].units_sold, 5);
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let product_id = {
        let store = open(dir.path()).await;
        let product = store
            .catalog()
            .add(NewProduct::new("Pen", Money::from_cents(150), 7).description("blue, fine"))
            .await
            .unwrap();
        store.credentials().register("alice", "Abcdef12").await.unwrap();
        store
            .orders()
            .place("alice", &cart(&[(product.id, 2)]))
            .await
            .unwrap();
        product.id
    };

    let store = open(dir.path()).await;
    let product = store.catalog().get(product_id).await.unwrap().unwrap();
    assert_eq!(product.description, "blue, fine");
    assert_eq!(product.quantity, 5);
    assert!(store.credentials().login("alice", "Abcdef12").await.is_ok());
    assert_eq!(store.orders().list(Some("alice")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancelling_after_removal_never_restocks_a_new_product() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let kept = store
        .catalog()
        .add(NewProduct::new("Kept", Money::from_cents(100), 10))
        .await
        .unwrap();
    let sold = store
        .catalog()
        .add(NewProduct::new("Sold", Money::from_cents(100), 10))
        .await
        .unwrap();

    let placed = store
        .orders()
        .place("ana", &cart(&[(sold.id, 5)]))
        .await
        .unwrap();
    store.catalog().remove(sold.id).await.unwrap();

    let newcomer = store
        .catalog()
        .add(NewProduct::new("Newcomer", Money::from_cents(100), 2))
        .await
        .unwrap();
    assert_ne!(newcomer.id, sold.id);
    assert!(newcomer.id > sold.id);

    let outcome = store.orders().cancel(placed.order.id).await.unwrap();
    assert_eq!(outcome.skipped, vec![sold.id]);
    assert!(outcome.restored.is_empty());
    assert_eq!(quantity_of(&store, newcomer.id).await, 2);
    assert_eq!(quantity_of(&store, kept.id).await, 10);
}

#[tokio::test]
async fn unsold_product_id_is_not_reissued_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let last = {
        let store = open(dir.path()).await;
        store
            .catalog()
            .add(NewProduct::new("First", Money::from_cents(100), 1))
            .await
            .unwrap();
        let last = store
            .catalog()
            .add(NewProduct::new("Last", Money::from_cents(100), 1))
            .await
            .unwrap();
        store.catalog().remove(last.id).await.unwrap();
        last
    };

    let store = open(dir.path()).await;
    let next = store
        .catalog()
        .add(NewProduct::new("Next", Money::from_cents(100), 1))
        .await
        .unwrap();
    assert_eq!(next.id, last.id + 1);
}

#[tokio::test]
async fn price_above_cap_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;

    let err = store
        .catalog()
        .add(NewProduct::new("Yacht", Money::from_cents(MAX_PRICE_CENTS + 1), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ValidationFailure));

    let pen = store
        .catalog()
        .add(NewProduct::new("Pen", Money::from_cents(100), 1))
        .await
        .unwrap();
    let err = store
        .catalog()
        .update(pen.id, ProductUpdate::default().price(Money::from_cents(i64::MAX)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ValidationFailure));

    // Largest allowed price times the largest cart still fits
    let dear = store
        .catalog()
        .add(NewProduct::new("Dear", Money::from_cents(MAX_PRICE_CENTS), 999))
        .await
        .unwrap();
    let placed = store
        .orders()
        .place("ana", &cart(&[(dear.id, 999)]))
        .await
        .unwrap();
    assert_eq!(placed.order.total.cents(), MAX_PRICE_CENTS * 999);
}

#[tokio::test]
async fn huge_stored_price_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    // i64::MAX cents, written by hand past validation
    std::fs::write(
        dir.path().join("products.csv"),
        "id,name,description,price,quantity\n1,Gold,,92233720368547758.07,10\n",
    )
    .unwrap();
    let store = open(dir.path()).await;

    let err = store
        .orders()
        .place("ana", &cart(&[(1, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Domain(CoreError::AmountOverflow)));
    assert_eq!(quantity_of(&store, 1).await, 10);
    assert!(store.orders().list(None).await.unwrap().is_empty());

    let summary = store.stats().summary().await.unwrap();
    assert_eq!(summary.stock_value, Money::from_cents(i64::MAX));
    let overview = store.stats().overview().await.unwrap();
    assert_eq!(overview.stock_value, Money::from_cents(i64::MAX));
}

#[tokio::test]
async fn torn_journal_keeps_previous_tables() {
    let dir = tempfile::tempdir().unwrap();
    let before: Vec<Product> = {
        let store = open(dir.path()).await;
        store
            .catalog()
            .add(NewProduct::new("Pen", Money::from_cents(150), 7))
            .await
            .unwrap();
        store.catalog().list().await.unwrap()
    };

    // Crash while the journal was being written: full staged snapshots,
    // journal cut mid-name
    std::fs::write(
        dir.path().join("products.csv.staged"),
        "id,name,description,price,quantity\n1,Pen,,1.50,0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("orders.csv.staged"),
        "id,username,date,status,total\n1,ana,2024-01-02T03:04:05Z,pending,10.50\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("commit.journal"), "products.csv\nord").unwrap();

    let store = open(dir.path()).await;
    assert_eq!(store.catalog().list().await.unwrap(), before);
    assert!(store.orders().list(None).await.unwrap().is_empty());
    assert!(!dir.path().join("commit.journal").exists());
    assert!(!dir.path().join("products.csv.staged").exists());
    assert!(!dir.path().join("orders.csv.staged").exists());

    // The store keeps working after recovery
    store
        .orders()
        .place("ana", &cart(&[(before[0].id, 2)]))
        .await
        .unwrap();
    assert_eq!(quantity_of(&store, before[0].id).await, 5);
}

#[tokio::test]
async fn unknown_header_needs_migration() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("products.csv"),
        "id,title,price,stock\n1,Pen,1.50,3\n",
    )
    .unwrap();
    let store = open(dir.path()).await;

    let err = store.catalog().list().await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }));
    assert!(err.to_string().contains("migration"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;
    let product = store
        .catalog()
        .add(NewProduct::new("Last units", Money::from_cents(100), 5))
        .await
        .unwrap();

    let product_id = product.id;
    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let username = format!("buyer{i}");
            store
                .orders()
                .place(&username, &cart(&[(product_id, 1)]))
                .await
        }));
    }

    let mut placed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(StoreError::Domain(CoreError::InsufficientStock { .. })) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 5);
    assert_eq!(rejected, 5);
    assert_eq!(quantity_of(&store, product_id).await, 0);
}

struct Compromised;

#[async_trait::async_trait]
impl BreachCheck for Compromised {
    async fn occurrences(&self, _password: &str) -> Result<u64, BreachCheckError> {
        Ok(3_861_493)
    }
}

struct Offline;

#[async_trait::async_trait]
impl BreachCheck for Offline {
    async fn occurrences(&self, _password: &str) -> Result<u64, BreachCheckError> {
        Err(BreachCheckError::Status(503))
    }
}

#[tokio::test]
async fn breach_check_verdicts() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_with(
        StoreConfig::with_data_dir(dir.path()),
        Some(Arc::new(Compromised)),
    )
    .await
    .unwrap();

    let err = store
        .credentials()
        .register("alice", "Password1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Domain(CoreError::CompromisedPassword { occurrences: 3_861_493 })
    ));

    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_with(StoreConfig::with_data_dir(dir.path()), Some(Arc::new(Offline)))
        .await
        .unwrap();
    assert!(store.credentials().register("alice", "Password1").await.is_ok());
}
