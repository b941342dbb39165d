//! Bulk uniform issue and delivery-challan workflow
//!
//! Loads project, roster, uniform-mapping and inventory catalogs from the
//! upstream HR and inventory APIs, turns operator selections into DC line
//! items, and posts the DC together with its stock-deduction issue.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod api;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod mirror;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::api::{HttpInventoryApi, InventoryApi};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::mirror::LocalMirror;
use crate::services::{CatalogService, DcWizard, IssueDcSubmitter, IssueLedger};

/// Wired-up services sharing one upstream client and one local mirror.
#[derive(Clone)]
pub struct AppServices {
    pub config: AppConfig,
    pub api: Arc<dyn InventoryApi>,
    pub mirror: LocalMirror,
    pub catalog: CatalogService,
    pub submitter: IssueDcSubmitter,
    pub issues: IssueLedger,
}

impl AppServices {
    /// HTTP client against the configured hosts, file mirror under `mirror_dir`.
    pub fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let api: Arc<dyn InventoryApi> = Arc::new(HttpInventoryApi::new(&config)?);
        let mirror = LocalMirror::on_disk(config.mirror_dir.clone());
        Ok(Self::with_parts(config, api, mirror))
    }

    pub fn with_parts(config: AppConfig, api: Arc<dyn InventoryApi>, mirror: LocalMirror) -> Self {
        Self {
            catalog: CatalogService::new(api.clone()),
            submitter: IssueDcSubmitter::new(api.clone(), mirror.clone()),
            issues: IssueLedger::new(api.clone(), config.issues_page_size),
            config,
            api,
            mirror,
        }
    }

    /// Loads the catalogs and opens a wizard session on them.
    pub async fn start_wizard(&self) -> DcWizard {
        let catalog = self.catalog.load().await;
        DcWizard::new(catalog, self.catalog.clone(), self.submitter.clone())
    }
}
