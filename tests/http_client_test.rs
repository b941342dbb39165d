mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use uniform_issue::{
    api::{endpoints, HttpInventoryApi, InventoryApi},
    errors::ServiceError,
    models::{ApprovalStatus, IssueItem, IssueRequest, OutwardDcItem, OutwardDcRequest},
    services::{CatalogService, CatalogSource},
};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::*;

#[tokio::test]
async fn every_list_shape_is_parsed() {
    let server = MockServer::start().await;
    mount_site_a(&server).await;
    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();

    let items = api.inventory_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].available_quantity("M"), Some(5));
    assert_eq!(items[0].price_for("M"), dec!(350));

    let employees = api.employees().await.unwrap();
    let ids: Vec<&str> = employees.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["E1", "E2", "E3"]);

    let projects = api.projects().await.unwrap();
    assert_eq!(projects[0].designations.get("Guard"), Some(&3));

    let mappings = api.uniform_mappings().await.unwrap();
    assert_eq!(mappings.len(), 2);

    let requests = api.uniform_requests().await.unwrap();
    assert_eq!(requests[2].approval_status, ApprovalStatus::Pending);
    assert_eq!(requests[2].quantity, 1);
}

#[tokio::test]
async fn catalog_load_degrades_per_source() {
    let server = MockServer::start().await;
    mount_get(&server, endpoints::INVENTORY_ITEMS, site_a_items()).await;
    mount_get(&server, endpoints::PROJECTS, site_a_projects()).await;
    mount_get(&server, endpoints::UNIFORM_MAPPINGS, site_a_mappings()).await;
    Mock::given(method("GET"))
        .and(path(endpoints::EMPLOYEES))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    let catalog = CatalogService::new(std::sync::Arc::new(api)).load().await;

    assert_eq!(catalog.degraded, vec![CatalogSource::Employees]);
    assert!(catalog.employees.is_empty());
    assert_eq!(catalog.items.len(), 1);
    assert_eq!(catalog.mappings.len(), 1, "disabled mapping dropped");
}

#[tokio::test]
async fn one_bad_row_does_not_empty_a_source() {
    let server = MockServer::start().await;
    let mut items = site_a_items();
    items["data"]
        .as_array_mut()
        .unwrap()
        .push(json!({"_id": "item-cap", "sizes": ["Free"]}));
    mount_get(&server, endpoints::INVENTORY_ITEMS, items).await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    let items = api.inventory_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "item-shirt");
}

#[tokio::test]
async fn success_false_with_rows_degrades_the_source() {
    let server = MockServer::start().await;
    mount_get(&server, endpoints::INVENTORY_ITEMS, site_a_items()).await;
    mount_get(
        &server,
        endpoints::EMPLOYEES,
        json!({"success": false, "message": "token expired", "data": []}),
    )
    .await;
    mount_get(&server, endpoints::PROJECTS, site_a_projects()).await;
    mount_get(&server, endpoints::UNIFORM_MAPPINGS, site_a_mappings()).await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    assert_matches!(
        api.employees().await,
        Err(ServiceError::ExternalApiError(msg)) if msg == "token expired"
    );

    let catalog = CatalogService::new(std::sync::Arc::new(api)).load().await;
    assert_eq!(catalog.degraded, vec![CatalogSource::Employees]);
}

#[tokio::test]
async fn server_errors_open_the_breaker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::EMPLOYEES))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    assert_matches!(api.employees().await, Err(ServiceError::ExternalServiceError(_)));
    assert_matches!(api.employees().await, Err(ServiceError::ExternalServiceError(_)));
    assert_matches!(api.employees().await, Err(ServiceError::CircuitBreakerOpen));
}

#[tokio::test]
async fn rejections_do_not_trip_the_breaker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::ISSUES))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"success": false, "message": "Unauthorized"})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    for _ in 0..3 {
        assert_matches!(api.issues().await, Err(ServiceError::ExternalApiError(msg)) if msg == "Unauthorized");
    }
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::INVENTORY_ITEMS))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.api_token = Some("secret-token".into());
    let api = HttpInventoryApi::new(&config).unwrap();
    assert!(api.inventory_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn documents_are_posted_with_upstream_field_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::OUTWARD_DC))
        .and(body_partial_json(json!({
            "customer": "Site-A",
            "dcNumber": "DC-001",
            "dcDate": "2026-10-19",
            "items": [{ "id": "item-shirt", "employeeId": "E1", "itemCode": "UNI-SH-01", "size": "M", "quantity": 1 }]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"success": true, "data": {"_id": "dc-77"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoints::ISSUES))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Insufficient stock"})),
        )
        .mount(&server)
        .await;

    let api = HttpInventoryApi::new(&test_config(&server)).unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let created = api
        .create_outward_dc(&OutwardDcRequest {
            customer: "Site-A".into(),
            dc_number: "DC-001".into(),
            dc_date: date,
            remarks: String::new(),
            address: "12 Harbour Road".into(),
            items: vec![OutwardDcItem {
                id: "item-shirt".into(),
                employee_id: "E1".into(),
                item_code: "UNI-SH-01".into(),
                name: "Blue Shirt".into(),
                size: "M".into(),
                quantity: 1,
                price: dec!(350),
                remarks: String::new(),
            }],
        })
        .await
        .unwrap();
    assert_eq!(created.id.as_deref(), Some("dc-77"));

    let rejected = api
        .create_issue(&IssueRequest {
            issue_to: "Site-A".into(),
            department: "Security".into(),
            purpose: "Uniform".into(),
            address: String::new(),
            issue_date: date,
            items: vec![IssueItem {
                id: "item-shirt".into(),
                quantity: 1,
                size: "M".into(),
                employee_id: "E1".into(),
            }],
        })
        .await;
    assert_matches!(rejected, Err(ServiceError::ExternalApiError(msg)) if msg == "Insufficient stock");
}
