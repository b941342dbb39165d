use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::envelope::{error_for_status, parse_list, parse_mutation};
use super::{endpoints, InventoryApi};
use crate::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerRegistry};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::{
    CreatedDocument, Employee, InventoryItem, IssueRecord, IssueRequest, KycRecord,
    OutwardDcRequest, Project, UniformMapping, UniformRequest,
};

/// Which upstream serves an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Host {
    Hr,
    Inventory,
}

impl Host {
    fn breaker_name(self) -> &'static str {
        match self {
            Host::Hr => "hr-api",
            Host::Inventory => "inventory-api",
        }
    }
}

/// `reqwest`-backed [`InventoryApi`].
#[derive(Clone)]
pub struct HttpInventoryApi {
    client: reqwest::Client,
    hr_base_url: String,
    inventory_base_url: String,
    api_token: Option<String>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl HttpInventoryApi {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            hr_base_url: config.hr_api_base_url.trim_end_matches('/').to_string(),
            inventory_base_url: config.inventory_api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.trim().is_empty()),
            breakers: Arc::new(CircuitBreakerRegistry::new(Some(
                CircuitBreakerConfig::from(config),
            ))),
        })
    }

    fn url(&self, host: Host, path: &str) -> String {
        let base = match host {
            Host::Hr => &self.hr_base_url,
            Host::Inventory => &self.inventory_base_url,
        };
        format!("{}{}", base, path)
    }

    /// Sends through the host's circuit breaker.
    ///
    /// Transport failures and 5xx answers count against the breaker; any other
    /// status is handed back for the caller to interpret.
    async fn send(
        &self,
        host: Host,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), ServiceError> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        self.breakers
            .get(host.breaker_name())
            .call(|| async move {
                let response = request.send().await.map_err(|e| {
                    ServiceError::ExternalServiceError(format!("{} unreachable: {}", endpoint, e))
                })?;
                let status = response.status();
                let body = response.bytes().await.map_err(|e| {
                    ServiceError::ExternalServiceError(format!(
                        "failed to read {} response: {}",
                        endpoint, e
                    ))
                })?;

                if status.is_server_error() {
                    return Err(ServiceError::ExternalServiceError(format!(
                        "{} returned {}",
                        endpoint, status
                    )));
                }
                Ok((status, body.to_vec()))
            })
            .await
            .map_err(|e| match e {
                CircuitBreakerError::CircuitOpen => ServiceError::CircuitBreakerOpen,
                CircuitBreakerError::ServiceFailure(err) => err,
            })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        host: Host,
        endpoint: &str,
    ) -> Result<Vec<T>, ServiceError> {
        let request = self.client.get(self.url(host, endpoint));
        let (status, body) = self.send(host, endpoint, request).await?;
        if !status.is_success() {
            return Err(error_for_status(endpoint, status, &body));
        }
        parse_list(endpoint, &body)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        host: Host,
        endpoint: &str,
        payload: &B,
    ) -> Result<CreatedDocument, ServiceError> {
        let request = self.client.post(self.url(host, endpoint)).json(payload);
        let (status, body) = self.send(host, endpoint, request).await?;
        parse_mutation(endpoint, status, &body)
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    #[instrument(skip(self))]
    async fn inventory_items(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        self.get_list(Host::Inventory, endpoints::INVENTORY_ITEMS)
            .await
    }

    #[instrument(skip(self))]
    async fn employees(&self) -> Result<Vec<Employee>, ServiceError> {
        let records: Vec<KycRecord> = self.get_list(Host::Hr, endpoints::EMPLOYEES).await?;
        let total = records.len();
        let employees: Vec<Employee> = records
            .into_iter()
            .filter_map(KycRecord::into_employee)
            .collect();
        if employees.len() < total {
            debug!(
                skipped = total - employees.len(),
                "roster records without an employee id were skipped"
            );
        }
        Ok(employees)
    }

    #[instrument(skip(self))]
    async fn projects(&self) -> Result<Vec<Project>, ServiceError> {
        self.get_list(Host::Hr, endpoints::PROJECTS).await
    }

    #[instrument(skip(self))]
    async fn uniform_mappings(&self) -> Result<Vec<UniformMapping>, ServiceError> {
        self.get_list(Host::Inventory, endpoints::UNIFORM_MAPPINGS)
            .await
    }

    #[instrument(skip(self))]
    async fn uniform_requests(&self) -> Result<Vec<UniformRequest>, ServiceError> {
        self.get_list(Host::Inventory, endpoints::UNIFORM_REQUESTS)
            .await
    }

    #[instrument(skip(self, request), fields(dc_number = %request.dc_number))]
    async fn create_outward_dc(
        &self,
        request: &OutwardDcRequest,
    ) -> Result<CreatedDocument, ServiceError> {
        self.post_json(Host::Inventory, endpoints::OUTWARD_DC, request)
            .await
    }

    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedDocument, ServiceError> {
        self.post_json(Host::Inventory, endpoints::ISSUES, request)
            .await
    }

    #[instrument(skip(self))]
    async fn issues(&self) -> Result<Vec<IssueRecord>, ServiceError> {
        self.get_list(Host::Inventory, endpoints::ISSUES).await
    }
}
