/// Purchase API tests
///
/// Drive the full axum router (routing, JSON extraction, error shaping) over the
/// in-memory ledger store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tradesim_backend::app::create_app;
use tradesim_backend::state::AppState;
use tradesim_backend::store::MemoryLedgerStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_app() -> Router {
    let store = Arc::new(MemoryLedgerStore::new());
    create_app(AppState::new(store, Duration::from_secs(5)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn open_account(app: &Router, investor_id: &str, balance: f64) {
    let (status, _) = send(
        app,
        "POST",
        "/accounts",
        Some(json!({ "investorId": investor_id, "initialBalance": balance })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn purchase_body(investor_id: &str, symbol: &str, quantity: f64, unit_price: f64) -> Value {
    json!({
        "investorId": investor_id,
        "assetSymbol": symbol,
        "category": "equity",
        "quantity": quantity,
        "unitPrice": unit_price,
    })
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_purchase_debits_account_and_creates_holding() {
    let app = test_app();
    open_account(&app, "11122233344", 1000.0).await;

    let (status, body) = send(&app, "POST", "/purchase/finance", Some(purchase_body("11122233344", "X", 10.0, 5.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Purchase completed successfully");
    assert_eq!(body["newInvestedBalance"].as_f64(), Some(50.0));
    assert_eq!(body["newAvailableBalance"].as_f64(), Some(950.0));

    let (status, holdings) = send(&app, "GET", "/accounts/11122233344/holdings", None).await;
    assert_eq!(status, StatusCode::OK);
    let holdings = holdings.as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["assetSymbol"], "X");
    assert_eq!(holdings[0]["category"], "equity");
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(10.0));
    assert_eq!(holdings[0]["totalCost"].as_f64(), Some(50.0));
}

#[tokio::test]
async fn test_repeat_purchase_accumulates_into_single_holding() {
    let app = test_app();
    open_account(&app, "inv", 1000.0).await;

    send(&app, "POST", "/purchase/finance", Some(purchase_body("inv", "X", 10.0, 5.0))).await;
    let (status, body) = send(&app, "POST", "/purchase/finance", Some(purchase_body("inv", "X", 5.0, 5.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newInvestedBalance"].as_f64(), Some(75.0));
    assert_eq!(body["newAvailableBalance"].as_f64(), Some(925.0));

    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    let holdings = holdings.as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(15.0));
    assert_eq!(holdings[0]["totalCost"].as_f64(), Some(75.0));
}

#[tokio::test]
async fn test_symbol_case_variants_share_one_holding() {
    let app = test_app();
    open_account(&app, "inv", 10000.0).await;

    let (status, _) = send(&app, "POST", "/purchase/crypto", Some(purchase_body("inv", "btc", 0.5, 100.0))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/purchase/crypto", Some(purchase_body("inv", " BTC ", 0.25, 100.0))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    let holdings = holdings.as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["assetSymbol"], "BTC");
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(0.75));
    assert_eq!(holdings[0]["totalCost"].as_f64(), Some(75.0));
}

#[tokio::test]
async fn test_extreme_exponents_are_rejected_fast() {
    let app = test_app();
    open_account(&app, "inv", 1000.0).await;

    let started = std::time::Instant::now();
    for quantity in ["1e2000000", "1e-20000000"] {
        let body = json!({
            "investorId": "inv",
            "assetSymbol": "BTC",
            "category": "crypto",
            "quantity": quantity,
            "unitPrice": 10,
        });
        let (status, body) = send(&app, "POST", "/purchase/crypto", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_error");
    }
    assert!(started.elapsed() < Duration::from_secs(2));

    let (_, summary) = send(&app, "GET", "/accounts/inv", None).await;
    assert_eq!(summary["availableBalance"].as_f64(), Some(1000.0));
}

#[tokio::test]
async fn test_identical_requests_are_not_idempotent() {
    let app = test_app();
    open_account(&app, "inv", 500.0).await;

    let body = purchase_body("inv", "PETR4", 3.0, 20.0);
    send(&app, "POST", "/purchase/finance", Some(body.clone())).await;
    let (status, receipt) = send(&app, "POST", "/purchase/finance", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["newAvailableBalance"].as_f64(), Some(380.0));

    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(6.0));
}

#[tokio::test]
async fn test_crypto_purchase_uses_crypto_message_and_fractional_quantity() {
    let app = test_app();
    open_account(&app, "inv", 1000.0).await;

    let body = json!({
        "investorId": "inv",
        "assetSymbol": "btc",
        "category": "crypto",
        "quantity": "0.0025",
        "unitPrice": 200000,
    });
    let (status, receipt) = send(&app, "POST", "/purchase/crypto", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["message"], "Crypto purchase completed successfully");
    assert_eq!(receipt["newInvestedBalance"].as_f64(), Some(500.0));

    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    assert_eq!(holdings[0]["assetSymbol"], "BTC");
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(0.0025));
}

#[tokio::test]
async fn test_numeric_investor_id_matches_account() {
    let app = test_app();
    open_account(&app, "12345678900", 100.0).await;

    let body = json!({
        "investorId": 12345678900u64,
        "assetSymbol": "VALE3",
        "category": "equity",
        "quantity": 1,
        "unitPrice": 10,
    });
    let (status, receipt) = send(&app, "POST", "/purchase/finance", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["newAvailableBalance"].as_f64(), Some(90.0));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_fields_are_rejected_without_side_effects() {
    let app = test_app();
    open_account(&app, "inv", 1000.0).await;

    let incomplete = [
        json!({ "assetSymbol": "X", "category": "equity", "quantity": 1, "unitPrice": 1 }),
        json!({ "investorId": "inv", "category": "equity", "quantity": 1, "unitPrice": 1 }),
        json!({ "investorId": "inv", "assetSymbol": "X", "quantity": 1, "unitPrice": 1 }),
        json!({ "investorId": "inv", "assetSymbol": "X", "category": "equity", "unitPrice": 1 }),
        json!({ "investorId": "inv", "assetSymbol": "X", "category": "equity", "quantity": 0, "unitPrice": 1 }),
        json!({ "investorId": "inv", "assetSymbol": "", "category": "equity", "quantity": 1, "unitPrice": 1 }),
        json!({ "investorId": "inv", "assetSymbol": "X", "category": "equity", "quantity": 1, "unitPrice": null }),
    ];
    for body in incomplete {
        let (status, error) = send(&app, "POST", "/purchase/finance", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(error["kind"], "validation_error", "body: {}", body);
        assert!(error["error"].as_str().unwrap().contains("Required fields missing"));
    }

    let (_, account) = send(&app, "GET", "/accounts/inv", None).await;
    assert_eq!(account["availableBalance"].as_f64(), Some(1000.0));
    assert_eq!(account["investedBalance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_insufficient_funds_leaves_account_and_holdings_unchanged() {
    let app = test_app();
    open_account(&app, "inv", 100.0).await;

    let (status, error) = send(&app, "POST", "/purchase/crypto", Some(purchase_body("inv", "X", 2.0, 60.0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "insufficient_funds");

    let (_, account) = send(&app, "GET", "/accounts/inv", None).await;
    assert_eq!(account["availableBalance"].as_f64(), Some(100.0));
    assert_eq!(account["investedBalance"].as_f64(), Some(0.0));
    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    assert!(holdings.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_investor_purchase_is_bad_request() {
    let app = test_app();
    let (status, error) = send(&app, "POST", "/purchase/finance", Some(purchase_body("ghost", "X", 1.0, 1.0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "account_not_found");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/purchase/finance")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["kind"], "validation_error");
}

#[tokio::test]
async fn test_non_numeric_quantity_is_validation_error() {
    let app = test_app();
    open_account(&app, "inv", 100.0).await;
    let body = json!({
        "investorId": "inv",
        "assetSymbol": "X",
        "category": "equity",
        "quantity": "lots",
        "unitPrice": 1,
    });
    let (status, error) = send(&app, "POST", "/purchase/finance", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["kind"], "validation_error");
}

// ---------------------------------------------------------------------------
// Other endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_finance_get_returns_static_acknowledgement() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/purchase/finance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Finance purchase endpoint");
}

#[tokio::test]
async fn test_account_summary_and_duplicate_open() {
    let app = test_app();
    open_account(&app, "inv", 250.5).await;

    let (status, account) = send(&app, "GET", "/accounts/inv", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["investorId"], "inv");
    assert_eq!(account["availableBalance"].as_f64(), Some(250.5));
    assert_eq!(account["blockedBalance"].as_f64(), Some(0.0));
    assert_eq!(account["totalBalance"].as_f64(), Some(250.5));

    let (status, error) = send(
        &app,
        "POST",
        "/accounts",
        Some(json!({ "investorId": "inv", "initialBalance": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "account_exists");

    let (status, error) = send(&app, "GET", "/accounts/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["kind"], "not_found");
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "tradesim-backend");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_leave_exact_balance() {
    let app = test_app();
    open_account(&app, "inv", 1000.0).await;

    let requests = (0..40).map(|_| {
        let app = app.clone();
        tokio::spawn(async move {
            send(&app, "POST", "/purchase/crypto", Some(purchase_body("inv", "ETH", 1.0, 12.5))).await
        })
    });
    for result in futures::future::join_all(requests).await {
        let (status, _) = result.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, account) = send(&app, "GET", "/accounts/inv", None).await;
    assert_eq!(account["availableBalance"].as_f64(), Some(500.0));
    assert_eq!(account["investedBalance"].as_f64(), Some(500.0));

    let (_, holdings) = send(&app, "GET", "/accounts/inv/holdings", None).await;
    let holdings = holdings.as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["quantity"].as_f64(), Some(40.0));
}
