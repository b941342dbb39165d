//! Shared upstream fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use uniform_issue::{
    api::{endpoints, HttpInventoryApi, InventoryApi},
    config::AppConfig,
    mirror::LocalMirror,
    AppServices,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Site-A: three Guards entitled to a Blue Shirt (M=5, L=0).
pub fn site_a_items() -> Value {
    json!({
        "success": true,
        "data": [{
            "_id": "item-shirt",
            "code": "UNI-SH-01",
            "category": "Uniform",
            "subCategory": "Shirt",
            "name": "Blue Shirt",
            "sizes": ["M", "L"],
            "sizeInventory": [
                { "size": "M", "quantity": 5, "unit": "pcs", "price": 350 },
                { "size": "L", "quantity": 0, "unit": "pcs", "price": 350 }
            ]
        }]
    })
}

pub fn site_a_roster() -> Value {
    let employee = |id: &str, name: &str| {
        json!({
            "_id": format!("kyc-{}", id),
            "personalDetails": {
                "employeeCode": id,
                "fullName": name,
                "designation": "Guard",
                "projectName": "Site-A",
                "department": "Security"
            }
        })
    };
    json!([
        employee("E1", "Asha Rao"),
        employee("E2", "Ravi Kumar"),
        employee("E3", "Meena Iyer"),
        { "_id": "kyc-draft", "personalDetails": { "fullName": "No Code" } }
    ])
}

pub fn site_a_projects() -> Value {
    json!({
        "data": {
            "items": [
                {
                    "_id": "proj-a",
                    "projectName": "Site-A",
                    "address": "12 Harbour Road",
                    "totalHeadcount": 3,
                    "designationCounts": { "Guard": 3 }
                },
                { "_id": "proj-general", "projectName": "General" }
            ]
        }
    })
}

pub fn site_a_mappings() -> Value {
    json!({
        "items": [
            {
                "_id": "map-1",
                "projectName": "Site-A",
                "designations": ["Guard"],
                "uniformTypes": ["Blue Shirt"],
                "isPayable": false
            },
            {
                "_id": "map-old",
                "projectName": "Site-A",
                "designations": ["Guard"],
                "uniformTypes": ["Raincoat"],
                "isDisabled": true
            }
        ]
    })
}

pub fn site_a_requests() -> Value {
    json!([
        {
            "_id": "req-e1",
            "employeeId": "E1",
            "employeeName": "Asha Rao",
            "designation": "Guard",
            "projectName": "Site-A",
            "uniformTypes": ["Blue Shirt"],
            "sizes": { "Blue Shirt": "M" },
            "quantity": 1,
            "approvalStatus": "Approved"
        },
        {
            "_id": "req-e2",
            "employeeId": "E2",
            "employeeName": "Ravi Kumar",
            "designation": "Guard",
            "uniformTypes": ["Blue Shirt"],
            "sizes": { "Blue Shirt": "L" },
            "quantity": 1,
            "approvalStatus": "Approved"
        },
        {
            "_id": "req-e3",
            "employeeId": "E3",
            "employeeName": "Meena Iyer",
            "projectName": "Site-A",
            "uniformTypes": ["Blue Shirt"],
            "sizes": { "Blue Shirt": "M" },
            "approvalStatus": "Pending"
        }
    ])
}

pub async fn mount_get(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serves every catalog endpoint of the Site-A fixture.
pub async fn mount_site_a(server: &MockServer) {
    mount_get(server, endpoints::INVENTORY_ITEMS, site_a_items()).await;
    mount_get(server, endpoints::EMPLOYEES, site_a_roster()).await;
    mount_get(server, endpoints::PROJECTS, site_a_projects()).await;
    mount_get(server, endpoints::UNIFORM_MAPPINGS, site_a_mappings()).await;
    mount_get(server, endpoints::UNIFORM_REQUESTS, site_a_requests()).await;
}

pub fn test_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::for_base_url(server.uri());
    config.request_timeout_secs = 5;
    config.circuit_breaker.failure_threshold = 2;
    config
}

/// Services against `server` with a file mirror in a fresh temp dir.
pub struct TestHarness {
    pub services: AppServices,
    pub mirror_dir: TempDir,
}

impl TestHarness {
    pub fn new(server: &MockServer) -> Self {
        let mirror_dir = TempDir::new().expect("temp dir");
        let mut config = test_config(server);
        config.mirror_dir = mirror_dir.path().to_path_buf();

        let api: Arc<dyn InventoryApi> =
            Arc::new(HttpInventoryApi::new(&config).expect("http client"));
        let mirror = LocalMirror::on_disk(mirror_dir.path());
        Self {
            services: AppServices::with_parts(config, api, mirror),
            mirror_dir,
        }
    }
}
