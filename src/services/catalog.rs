use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::InventoryApi;
use crate::errors::ServiceError;
use crate::models::{
    is_valid_project_name, Employee, InventoryItem, Project, UniformMapping, UniformRequest,
};

/// The independent fetches making up a catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogSource {
    InventoryItems,
    Employees,
    Projects,
    UniformMappings,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::InventoryItems => write!(f, "inventory items"),
            CatalogSource::Employees => write!(f, "employees"),
            CatalogSource::Projects => write!(f, "projects"),
            CatalogSource::UniformMappings => write!(f, "uniform mappings"),
        }
    }
}

/// Snapshot of the upstream catalogs for one session.
///
/// A source that failed to load is empty and listed in `degraded`; everything
/// downstream reads an empty collection as "nothing available".
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub items: Vec<InventoryItem>,
    pub employees: Vec<Employee>,
    pub projects: Vec<Project>,
    /// Active mappings only.
    pub mappings: Vec<UniformMapping>,
    pub degraded: Vec<CatalogSource>,
}

impl Catalog {
    pub fn new(
        items: Vec<InventoryItem>,
        employees: Vec<Employee>,
        projects: Vec<Project>,
        mappings: Vec<UniformMapping>,
    ) -> Self {
        Self {
            items,
            employees,
            projects,
            mappings: mappings.into_iter().filter(|m| !m.disabled).collect(),
            degraded: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Project names usable on a DC, placeholders filtered out.
    pub fn selectable_projects(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|p| is_valid_project_name(&p.name))
            .collect()
    }

    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn employee(&self, employee_id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == employee_id)
    }

    /// Designations the project has headcount for; empty for an unknown project.
    pub fn available_designations(&self, project: &str) -> BTreeSet<String> {
        self.project(project)
            .map(Project::designation_names)
            .unwrap_or_default()
    }

    /// Items any of `designations` is entitled to at `project`, deduplicated by item id.
    ///
    /// A designation without a mapping contributes nothing.
    pub fn available_uniforms(
        &self,
        project: &str,
        designations: &BTreeSet<String>,
    ) -> Vec<&InventoryItem> {
        let mut seen = HashSet::new();
        let mut uniforms = Vec::new();

        for designation in designations {
            for mapping in self
                .mappings
                .iter()
                .filter(|m| m.applies_to(project, designation))
            {
                for uniform_type in &mapping.uniform_types {
                    if let Some(item) = self.resolve_uniform(uniform_type) {
                        if seen.insert(item.id.as_str()) {
                            uniforms.push(item);
                        }
                    }
                }
            }
        }

        uniforms
    }

    /// Maps a uniform type name onto an inventory item.
    ///
    /// Tries an explicit item id from any active mapping first, then a
    /// case-insensitive exact name, then a case-insensitive substring match in
    /// either direction. The first catalog entry wins on ambiguous names.
    pub fn resolve_uniform(&self, uniform_type: &str) -> Option<&InventoryItem> {
        let explicit = self
            .mappings
            .iter()
            .find_map(|m| m.item_ids.get(uniform_type))
            .and_then(|item_id| self.item(item_id));
        if explicit.is_some() {
            return explicit;
        }

        let wanted = uniform_type.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        self.items
            .iter()
            .find(|item| item.name.trim().to_lowercase() == wanted)
            .or_else(|| {
                self.items.iter().find(|item| {
                    let name = item.name.trim().to_lowercase();
                    !name.is_empty() && (name.contains(&wanted) || wanted.contains(&name))
                })
            })
    }

    /// Employees at `project` holding one of `designations`, in roster order.
    pub fn relevant_employees(
        &self,
        project: &str,
        designations: &BTreeSet<String>,
    ) -> Vec<&Employee> {
        self.employees
            .iter()
            .filter(|e| e.project == project && designations.contains(&e.designation))
            .collect()
    }

    /// Project a request belongs to: its own field, else the requester's roster entry.
    pub fn request_project<'a>(&'a self, request: &'a UniformRequest) -> Option<&'a str> {
        request
            .project_name
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| {
                self.employee(&request.employee_id)
                    .map(|e| e.project.as_str())
            })
    }
}

/// Loads catalogs from the upstream.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn InventoryApi>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self { api }
    }

    /// Fetches the four catalogs concurrently.
    ///
    /// Never fails: a fetch that errors is logged and leaves its collection
    /// empty, so a slow or broken source does not take the others down.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Catalog {
        let (items, employees, projects, mappings) = tokio::join!(
            self.api.inventory_items(),
            self.api.employees(),
            self.api.projects(),
            self.api.uniform_mappings(),
        );

        let mut degraded = Vec::new();
        let items = or_empty(items, CatalogSource::InventoryItems, &mut degraded);
        let employees = or_empty(employees, CatalogSource::Employees, &mut degraded);
        let projects = or_empty(projects, CatalogSource::Projects, &mut degraded);
        let mappings = or_empty(mappings, CatalogSource::UniformMappings, &mut degraded);

        let mut catalog = Catalog::new(items, employees, projects, mappings);
        catalog.degraded = degraded;

        info!(
            items = catalog.items.len(),
            employees = catalog.employees.len(),
            projects = catalog.projects.len(),
            mappings = catalog.mappings.len(),
            degraded = catalog.degraded.len(),
            "catalog loaded"
        );
        catalog
    }

    /// Approved uniform requests belonging to `project`: the DC candidates.
    #[instrument(skip(self, catalog))]
    pub async fn dc_candidates(
        &self,
        catalog: &Catalog,
        project: &str,
    ) -> Result<Vec<UniformRequest>, ServiceError> {
        let requests = self.api.uniform_requests().await?;
        let total = requests.len();
        let candidates: Vec<UniformRequest> = requests
            .into_iter()
            .filter(|r| r.is_dc_eligible() && catalog.request_project(r) == Some(project))
            .collect();

        info!(total, candidates = candidates.len(), "uniform requests filtered");
        Ok(candidates)
    }
}

fn or_empty<T>(
    result: Result<Vec<T>, ServiceError>,
    source: CatalogSource,
    degraded: &mut Vec<CatalogSource>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%source, error = %e, "catalog fetch failed, continuing without it");
            degraded.push(source);
            Vec::new()
        }
    }
}
