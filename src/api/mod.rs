//! Upstream HR and inventory APIs.

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::models::{
    CreatedDocument, Employee, InventoryItem, IssueRecord, IssueRequest, OutwardDcRequest,
    Project, UniformMapping, UniformRequest,
};

pub mod envelope;
pub mod http;

pub use http::HttpInventoryApi;

/// Endpoint paths, relative to the host that serves them.
pub mod endpoints {
    pub const INVENTORY_ITEMS: &str = "/api/inventory/items";
    pub const EMPLOYEES: &str = "/api/kyc/all";
    pub const PROJECTS: &str = "/api/project/projects";
    pub const UNIFORM_MAPPINGS: &str = "/api/uniforms/uniform-mappings";
    pub const UNIFORM_REQUESTS: &str = "/api/uniforms/all";
    pub const ISSUES: &str = "/api/inventory/issue";
    pub const OUTWARD_DC: &str = "/api/inventory/outward-dc";
}

/// Everything the workflow needs from the outside world.
///
/// The upstream owns every entity returned here; callers treat results as
/// read-only snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// `GET /api/inventory/items`
    async fn inventory_items(&self) -> Result<Vec<InventoryItem>, ServiceError>;

    /// `GET /api/kyc/all`, flattened to roster entries
    async fn employees(&self) -> Result<Vec<Employee>, ServiceError>;

    /// `GET /api/project/projects`
    async fn projects(&self) -> Result<Vec<Project>, ServiceError>;

    /// `GET /api/uniforms/uniform-mappings`
    async fn uniform_mappings(&self) -> Result<Vec<UniformMapping>, ServiceError>;

    /// `GET /api/uniforms/all`
    async fn uniform_requests(&self) -> Result<Vec<UniformRequest>, ServiceError>;

    /// `POST /api/inventory/outward-dc`
    async fn create_outward_dc(
        &self,
        request: &OutwardDcRequest,
    ) -> Result<CreatedDocument, ServiceError>;

    /// `POST /api/inventory/issue`
    async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedDocument, ServiceError>;

    /// `GET /api/inventory/issue`
    async fn issues(&self) -> Result<Vec<IssueRecord>, ServiceError>;
}
