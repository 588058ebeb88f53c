//! Remote adapter tests against an in-process PostgREST fake.
//!
//! These exercise the real reqwest client and URL rendering end to end,
//! driving the inventory service over HTTP.

use std::sync::{Arc, mpsc};
use std::time::Duration;

use inventory::domain::{
    CommitStep, Direction, ErrorCode, InboundRequest, InventoryService, ProductDraft, ProductId,
};
use inventory::domain::ports::InventoryStore;
use inventory::outbound::rest::{RestClient, RestClientConfig, RestInventoryStore};
use mockable::DefaultClock;
use serde_json::json;
use url::Url;

mod support;

use support::fake_postgrest::FakePostgrest;

const API_KEY: &str = "anon-test-key";

struct Harness {
    fake: FakePostgrest,
    store: Arc<RestInventoryStore>,
    service: InventoryService<RestInventoryStore>,
    handle: actix_web::dev::ServerHandle,
}

impl Harness {
    fn start() -> Self {
        let fake = FakePostgrest::default();
        fake.seed(
            "products",
            vec![
                json!({"id": 1, "barcode": "1234567890", "name": "Wireless Mouse", "stock": 50, "min_stock": 10}),
                json!({"id": 2, "barcode": "2345678901", "name": "USB-C Cable", "stock": 30, "min_stock": 5}),
            ],
        );
        let (base, handle) = fake.start().expect("start fake postgrest");
        let config = RestClientConfig::new(Url::parse(&base).expect("base url"), API_KEY);
        let client = RestClient::new(config).expect("build client");
        let store = Arc::new(RestInventoryStore::new(client));
        let service = InventoryService::new(Arc::clone(&store), Arc::new(DefaultClock));
        Self {
            fake,
            store,
            service,
            handle,
        }
    }

    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

#[actix_web::test]
async fn requests_carry_access_key_headers() {
    let harness = Harness::start();

    let products = harness.store.list_products().await.expect("list products");
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].min_stock, 10);

    let requests = harness.fake.requests();
    let request = requests.last().expect("request recorded");
    assert_eq!(request.method, "GET");
    assert_eq!(request.table, "products");
    assert_eq!(request.query, "select=*");
    assert_eq!(request.api_key.as_deref(), Some(API_KEY));
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Bearer {API_KEY}").as_str())
    );
    assert_eq!(request.prefer.as_deref(), Some("return=representation"));
    harness.stop().await;
}

#[actix_web::test]
async fn scanning_twice_stages_one_entry_with_quantity_two() {
    let harness = Harness::start();

    let first = harness.service.scan_barcode("1234567890").await.expect("first scan");
    let second = harness.service.scan_barcode("1234567890").await.expect("second scan");
    assert_eq!(first.quantity, 1);
    assert_eq!(second.quantity, 2);

    let rows = harness.fake.rows("daily_outbound");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_id"], json!(1));
    assert_eq!(rows[0]["quantity"], json!(2));

    let patch = harness
        .fake
        .requests()
        .into_iter()
        .find(|r| r.method == "PATCH")
        .expect("quantity patch");
    assert_eq!(patch.query, "product_id=eq.1");
    harness.stop().await;
}

#[actix_web::test]
async fn committing_outbound_updates_stock_and_clears_staging() {
    let harness = Harness::start();
    harness.service.scan_barcode("1234567890").await.expect("scan");
    harness.service.scan_barcode("1234567890").await.expect("scan");

    let report = harness.service.commit_outbound().await.expect("commit");
    assert!(report.is_complete());
    assert_eq!(report.committed().len(), 1);
    assert_eq!(report.committed()[0].new_stock, 48);

    let products = harness.fake.rows("products");
    assert_eq!(products[0]["stock"], json!(48));
    assert!(products[0].get("updated_at").is_some());

    let transactions = harness.store.list_transactions().await.expect("transactions");
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].direction, Direction::Out);
    assert_eq!(transactions[0].quantity, 2);
    assert_eq!(transactions[0].product_name, "Wireless Mouse");

    assert!(harness.fake.rows("daily_outbound").is_empty());
    let cleared = harness
        .fake
        .requests()
        .into_iter()
        .find(|r| r.method == "DELETE")
        .expect("clear request");
    assert_eq!(cleared.query, "id=neq.0");
    harness.stop().await;
}

#[actix_web::test]
async fn transactions_are_listed_newest_first() {
    let harness = Harness::start();
    for quantity in [3, 7] {
        harness
            .service
            .commit_inbound(InboundRequest {
                product_id: ProductId::new(2),
                quantity,
                date: None,
            })
            .await
            .expect("inbound");
    }

    let quantities: Vec<_> = harness
        .store
        .list_transactions()
        .await
        .expect("transactions")
        .iter()
        .map(|t| t.quantity)
        .collect();
    assert_eq!(quantities, [7, 3]);
    assert_eq!(harness.fake.rows("products")[1]["stock"], json!(40));
    assert!(
        harness
            .fake
            .requests()
            .iter()
            .any(|r| r.table == "transactions" && r.query.contains("order=created_at.desc"))
    );
    harness.stop().await;
}

#[actix_web::test]
async fn locale_formatted_rows_do_not_blank_the_history() {
    let harness = Harness::start();
    harness.fake.seed(
        "transactions",
        vec![
            json!({"product_id": 1, "product_name": "Wireless Mouse", "type": "OUT",
                   "quantity": 2, "date": "2026-05-04", "time": "3:45:12 PM"}),
            json!({"product_id": 2, "product_name": "USB-C Cable", "type": "IN",
                   "quantity": 4, "date": "2026-05-04", "time": "09:15:00"}),
            json!({"product_id": 2, "product_name": "USB-C Cable", "type": "LOST",
                   "quantity": 1, "date": "2026-05-04", "time": "09:20:00"}),
        ],
    );

    let snapshot = harness.service.snapshot().await.expect("snapshot loads");
    let quantities: Vec<_> = snapshot.transactions.iter().map(|t| t.quantity).collect();
    assert_eq!(quantities, [4, 2]);
    assert_eq!(snapshot.transactions[1].time.to_string(), "15:45:12");
    harness.stop().await;
}

#[actix_web::test]
async fn registering_a_product_returns_the_stored_row() {
    let harness = Harness::start();
    let product = harness
        .service
        .register_product(ProductDraft::new("5555555555", "HDMI Adapter", 12, 4))
        .await
        .expect("register");

    assert_eq!(product.barcode, "5555555555");
    assert_eq!(product.stock, 12);
    assert_eq!(harness.fake.rows("products").len(), 3);

    let duplicate = harness
        .service
        .register_product(ProductDraft::new("5555555555", "Other", 1, 1))
        .await
        .expect_err("duplicate barcode");
    assert_eq!(duplicate.code(), ErrorCode::Conflict);
    harness.stop().await;
}

#[actix_web::test]
async fn failing_transaction_insert_leaves_partial_commit_visible() {
    let harness = Harness::start();
    harness.service.scan_barcode("2345678901").await.expect("scan");
    harness.fake.fail_table("transactions", 503);

    let report = harness.service.commit_outbound().await.expect("commit runs");
    let failure = report.failure().expect("failure recorded");
    assert_eq!(failure.step, CommitStep::AppendTransaction);
    assert_eq!(failure.product_id, Some(ProductId::new(2)));
    assert!(failure.error.message().contains("503"));
    assert!(!report.staging_cleared());
    assert!(report.outcome().is_err());

    assert_eq!(harness.fake.rows("products")[1]["stock"], json!(29));
    assert_eq!(harness.fake.rows("daily_outbound").len(), 1);
    harness.stop().await;
}

#[actix_web::test]
async fn status_errors_surface_as_operation_failures() {
    let harness = Harness::start();
    harness.fake.fail_table("products", 500);

    let error = harness.service.snapshot().await.expect_err("snapshot fails");
    assert_eq!(error.code(), ErrorCode::OperationFailed);
    assert!(error.message().contains("products is unavailable"));
    harness.stop().await;
}

#[actix_web::test]
async fn subscription_pushes_snapshots_until_cancelled() {
    let harness = Harness::start();
    let (tx, rx) = mpsc::channel();
    let subscription = harness.store.subscribe(Duration::from_millis(20), move |snapshot| {
        let _ = tx.send(snapshot);
    });

    let mut received = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Ok(snapshot) = rx.try_recv() {
            received = Some(snapshot);
            break;
        }
    }
    let snapshot = received.expect("a snapshot within one second");
    assert_eq!(snapshot.products.len(), 2);
    assert!(snapshot.staging.is_empty());

    subscription.cancel();
    harness.stop().await;
}
