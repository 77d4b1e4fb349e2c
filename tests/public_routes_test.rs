mod common;

use std::sync::atomic::Ordering;

use actix_web::test;
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use common::{sample_review, sample_tour, FakeGateway, TestApp};
use safari_booking_api::models::tour::Difficulty;

#[actix_rt::test]
#[serial]
async fn test_health_check() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database"]["status"], "ok");
    assert_eq!(body["services"]["paypal"]["status"], "ok");
    assert_eq!(body["environment"], "test");
}

#[actix_rt::test]
#[serial]
async fn test_health_degraded_without_processor_or_database() {
    let test_app = TestApp::with_gateway(FakeGateway::new(false)).await;
    test_app.store.offline.store(true, Ordering::SeqCst);
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["database"]["status"], "error");
    assert_eq!(
        body["services"]["paypal"]["details"],
        "PayPal credentials not configured"
    );
}

#[actix_rt::test]
#[serial]
async fn test_list_tours_filters_and_sorts() {
    let test_app = TestApp::new().await;
    test_app.add_tour(sample_tour());
    let mut kili = sample_tour();
    kili.title = "7-Day Machame Route".to_string();
    kili.difficulty = Difficulty::Challenging;
    kili.price_usd = 2100.0;
    kili.duration_days = 7;
    test_app.add_tour(kili);
    let mut zanzibar = sample_tour();
    zanzibar.title = "Zanzibar Spice Island".to_string();
    zanzibar.price_usd = 650.0;
    zanzibar.duration_days = 3;
    test_app.add_tour(zanzibar);
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/tours?difficulty=easy&sort=price_desc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["5-Day Serengeti & Ngorongoro Safari", "Zanzibar Spice Island"]
    );

    let req = test::TestRequest::get()
        .uri("/api/tours?min_days=6")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["difficulty"], "challenging");
}

#[actix_rt::test]
#[serial]
async fn test_get_tour_not_found() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tours/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not found");
}

#[actix_rt::test]
#[serial]
async fn test_quote_for_group() {
    let test_app = TestApp::new().await;
    let tour = test_app.add_tour(sample_tour());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tours/{}/quote?participants=2", tour.id))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["base_price"], 2000.0);
    assert_eq!(body["total_amount"], 2250.0);
    let fees: Vec<(&str, f64)> = body["additional_fees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap(), f["amount"].as_f64().unwrap()))
        .collect();
    assert_eq!(
        fees,
        vec![("Park Fees", 100.0), ("Service Fee", 100.0), ("Insurance", 50.0)]
    );
}

#[actix_rt::test]
#[serial]
async fn test_quote_rejects_oversized_group() {
    let test_app = TestApp::new().await;
    let tour = test_app.add_tour(sample_tour());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tours/{}/quote?participants=9", tour.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["fields"]["participants"], "Maximum 8 participants allowed");
}

#[actix_rt::test]
#[serial]
async fn test_reviews_list_only_approved() {
    let test_app = TestApp::new().await;
    test_app.add_review(sample_review(true, 5));
    test_app.add_review(sample_review(true, 4));
    test_app.add_review(sample_review(false, 1));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/reviews").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["count"], 2);
    assert_eq!(body["summary"]["average_rating"], 4.5);
}

#[actix_rt::test]
#[serial]
async fn test_submit_review_awaits_moderation() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .set_json(&json!({
            "tour_id": null,
            "customer_name": "Neema",
            "country": "Tanzania",
            "rating": 5,
            "title": "Summit at sunrise",
            "content": "Uhuru Peak at sunrise was worth every step."
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["approved"], false);
    assert_eq!(test_app.store.reviews.lock().unwrap().len(), 1);

    let req = test::TestRequest::get().uri("/api/reviews").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["summary"]["count"], 0);
}

#[actix_rt::test]
#[serial]
async fn test_submit_review_validation() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .set_json(&json!({
            "tour_id": null,
            "customer_name": "N",
            "country": null,
            "rating": 6,
            "title": null,
            "content": "Great"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["fields"]["customer_name"].is_string());
    assert!(body["fields"]["rating"].is_string());
    assert!(body["fields"]["content"].is_string());
    assert!(test_app.store.reviews.lock().unwrap().is_empty());
}
