use std::collections::BTreeSet;
use strum::Display;
use tracing::{info, instrument, warn};

use super::bulk_entry::BulkEntryBuilder;
use super::catalog::{Catalog, CatalogService};
use super::size_reconciliation::{self, MissingSize, SizeSelections};
use super::submission::{IssueDcSubmitter, SubmissionOutcome};
use crate::errors::ServiceError;
use crate::models::{
    is_valid_project_name, BulkIssueLineItem, DcHeader, UniformRequest, UniformSelection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WizardStep {
    ProjectSelection,
    EmployeeSelection,
    DetailsAndSizing,
    Submitting,
    Succeeded,
    /// Submission failed; everything entered is kept for a retry.
    Failed,
}

/// One bulk-issue / DC session.
///
/// Steps run `ProjectSelection -> EmployeeSelection -> DetailsAndSizing ->
/// Submitting -> Succeeded | Failed`. Every operation names the steps it is
/// allowed in and returns [`ServiceError::InvalidOperation`] elsewhere.
pub struct DcWizard {
    catalog: Catalog,
    catalog_service: CatalogService,
    submitter: IssueDcSubmitter,
    step: WizardStep,
    project: Option<String>,
    designations: BTreeSet<String>,
    candidates: Vec<UniformRequest>,
    candidates_degraded: bool,
    selected: Vec<String>,
    bulk_entries: Vec<BulkIssueLineItem>,
    sizes: SizeSelections,
    header: DcHeader,
    last_error: Option<String>,
    last_outcome: Option<SubmissionOutcome>,
}

impl DcWizard {
    pub fn new(catalog: Catalog, catalog_service: CatalogService, submitter: IssueDcSubmitter) -> Self {
        Self {
            catalog,
            catalog_service,
            submitter,
            step: WizardStep::ProjectSelection,
            project: None,
            designations: BTreeSet::new(),
            candidates: Vec::new(),
            candidates_degraded: false,
            selected: Vec::new(),
            bulk_entries: Vec::new(),
            sizes: SizeSelections::new(),
            header: DcHeader::default(),
            last_error: None,
            last_outcome: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn designations(&self) -> &BTreeSet<String> {
        &self.designations
    }

    pub fn candidates(&self) -> &[UniformRequest] {
        &self.candidates
    }

    /// True when the uniform requests could not be fetched, so an empty
    /// candidate list does not mean there is nothing approved.
    pub fn candidates_degraded(&self) -> bool {
        self.candidates_degraded
    }

    pub fn bulk_entries(&self) -> &[BulkIssueLineItem] {
        &self.bulk_entries
    }

    pub fn size_selections(&self) -> &SizeSelections {
        &self.sizes
    }

    pub fn header(&self) -> &DcHeader {
        &self.header
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    /// Selected requests, in candidate order.
    pub fn selected_requests(&self) -> Vec<&UniformRequest> {
        self.candidates
            .iter()
            .filter(|r| self.selected.contains(&r.id))
            .collect()
    }

    /// Picks the project, dropping everything chosen for the previous one.
    pub fn select_project(&mut self, project: &str) -> Result<(), ServiceError> {
        self.require(
            &[WizardStep::ProjectSelection, WizardStep::EmployeeSelection],
            "select a project",
        )?;

        self.project = Some(project.trim().to_string());
        self.designations.clear();
        self.candidates.clear();
        self.candidates_degraded = false;
        self.reset_selections();
        self.step = WizardStep::ProjectSelection;
        Ok(())
    }

    /// Replaces the designation filter, dropping selections made under the old one.
    pub fn set_designations<I, S>(&mut self, designations: I) -> Result<(), ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(
            &[WizardStep::ProjectSelection, WizardStep::EmployeeSelection],
            "change designations",
        )?;

        self.designations = designations.into_iter().map(Into::into).collect();
        self.reset_selections();
        Ok(())
    }

    /// `ProjectSelection -> EmployeeSelection`; loads the DC candidates.
    #[instrument(skip(self), fields(project = ?self.project))]
    pub async fn confirm_project(&mut self) -> Result<(), ServiceError> {
        self.require(&[WizardStep::ProjectSelection], "confirm the project")?;

        let project = self
            .project
            .clone()
            .filter(|p| is_valid_project_name(p))
            .ok_or_else(|| ServiceError::ValidationError("Select a valid project".to_string()))?;

        let fetched = self.catalog_service.dc_candidates(&self.catalog, &project).await;
        self.candidates_degraded = fetched.is_err();
        self.candidates = fetched.unwrap_or_else(|e| {
            warn!(error = %e, "uniform requests unavailable, continuing without candidates");
            Vec::new()
        });
        self.step = WizardStep::EmployeeSelection;
        info!(
            candidates = self.candidates.len(),
            degraded = self.candidates_degraded,
            "project confirmed"
        );
        Ok(())
    }

    pub fn select_request(&mut self, request_id: &str) -> Result<(), ServiceError> {
        self.require(&[WizardStep::EmployeeSelection], "select requests")?;
        if !self.candidates.iter().any(|r| r.id == request_id) {
            return Err(ServiceError::NotFound(format!("Uniform request {}", request_id)));
        }
        if !self.selected.iter().any(|id| id == request_id) {
            self.selected.push(request_id.to_string());
        }
        Ok(())
    }

    pub fn deselect_request(&mut self, request_id: &str) -> Result<(), ServiceError> {
        self.require(&[WizardStep::EmployeeSelection], "deselect requests")?;
        self.selected.retain(|id| id != request_id);
        let keep: Vec<&str> = self.selected.iter().map(String::as_str).collect();
        self.sizes.retain_requests(&keep);
        Ok(())
    }

    /// Apportions `selections` over the matching employees and queues the lines.
    pub fn add_bulk_entries(&mut self, selections: &[UniformSelection]) -> Result<usize, ServiceError> {
        self.require(&[WizardStep::EmployeeSelection], "add bulk entries")?;
        if self.designations.is_empty() {
            return Err(ServiceError::ValidationError(
                "Select at least one designation".to_string(),
            ));
        }

        let project = self.project.as_deref().unwrap_or_default();
        let entries =
            BulkEntryBuilder::new(&self.catalog).create_entries(selections, project, &self.designations)?;
        let added = entries.len();
        self.bulk_entries.extend(entries);
        Ok(added)
    }

    pub fn clear_bulk_entries(&mut self) -> Result<(), ServiceError> {
        self.require(&[WizardStep::EmployeeSelection], "clear bulk entries")?;
        self.bulk_entries.clear();
        Ok(())
    }

    /// `EmployeeSelection -> DetailsAndSizing`.
    pub fn proceed_to_details(&mut self) -> Result<(), ServiceError> {
        self.require(&[WizardStep::EmployeeSelection], "continue to details")?;
        if self.selected.is_empty() && self.bulk_entries.is_empty() {
            return Err(ServiceError::ValidationError(
                "Select at least one uniform request".to_string(),
            ));
        }

        if self.header.customer.trim().is_empty() {
            self.header.customer = self.project.clone().unwrap_or_default();
        }
        if self.header.address.trim().is_empty() {
            if let Some(project) = self.project.as_deref().and_then(|p| self.catalog.project(p)) {
                self.header.address = project.address.clone();
            }
        }

        self.step = WizardStep::DetailsAndSizing;
        Ok(())
    }

    /// Goes one step back without losing anything entered.
    pub fn back(&mut self) -> Result<(), ServiceError> {
        self.step = match self.step {
            WizardStep::EmployeeSelection => WizardStep::ProjectSelection,
            WizardStep::DetailsAndSizing | WizardStep::Failed => WizardStep::EmployeeSelection,
            step => {
                return Err(ServiceError::InvalidOperation(format!(
                    "cannot go back from {}",
                    step
                )))
            }
        };
        Ok(())
    }

    /// Overrides the size of one uniform on a selected request.
    pub fn select_size(
        &mut self,
        request_id: &str,
        uniform_type: &str,
        size: &str,
    ) -> Result<(), ServiceError> {
        self.require(
            &[WizardStep::DetailsAndSizing, WizardStep::Failed],
            "choose sizes",
        )?;

        let request = self
            .selected_requests()
            .into_iter()
            .find(|r| r.id == request_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Selected request {}", request_id)))?;
        if !request.uniform_types.iter().any(|t| t == uniform_type) {
            return Err(ServiceError::ValidationError(format!(
                "Request {} does not include {}",
                request_id, uniform_type
            )));
        }
        if let Some(item) = self.catalog.resolve_uniform(uniform_type) {
            if !item.offers_size(size) {
                return Err(ServiceError::ValidationError(format!(
                    "Size '{}' is not available for {}",
                    size, item.name
                )));
            }
        }

        self.sizes.select(request_id, uniform_type, size);
        Ok(())
    }

    pub fn set_header(&mut self, header: DcHeader) -> Result<(), ServiceError> {
        self.require(
            &[WizardStep::DetailsAndSizing, WizardStep::Failed],
            "edit DC details",
        )?;
        self.header = header;
        Ok(())
    }

    /// Bulk lines followed by one line per selected request and uniform type.
    pub fn line_items(&self) -> Vec<BulkIssueLineItem> {
        let selected = self.selected_requests();
        let mut lines = self.bulk_entries.clone();
        lines.extend(size_reconciliation::request_line_items(
            &self.catalog,
            &selected,
            &self.sizes,
        ));
        lines
    }

    pub fn missing_sizes(&self) -> Vec<MissingSize> {
        size_reconciliation::missing_sizes(&self.catalog, &self.selected_requests(), &self.sizes)
    }

    pub fn all_sizes_selected(&self) -> bool {
        self.missing_sizes().is_empty()
    }

    /// `DetailsAndSizing | Failed -> Submitting -> Succeeded | Failed`.
    ///
    /// Validation failures, including a DC number already used locally, leave
    /// the wizard untouched. A failed submission moves to `Failed` with every
    /// selection kept; success clears them.
    #[instrument(skip(self), fields(dc_number = %self.header.dc_number))]
    pub async fn submit(&mut self) -> Result<SubmissionOutcome, ServiceError> {
        self.require(
            &[WizardStep::DetailsAndSizing, WizardStep::Failed],
            "submit",
        )?;

        let missing = self.missing_sizes();
        if !missing.is_empty() {
            let details: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(ServiceError::ValidationError(details.join("; ")));
        }

        let lines = self.line_items();
        let resume_at = self.step;
        self.step = WizardStep::Submitting;
        match self.submitter.submit(&self.catalog, &self.header, &lines).await {
            Ok(outcome) => {
                if let Some(warning) = outcome.warning() {
                    warn!(%warning, "DC submitted with a partial failure");
                }
                self.step = WizardStep::Succeeded;
                self.last_error = None;
                self.last_outcome = Some(outcome.clone());
                self.reset_selections();
                self.header = DcHeader::default();
                Ok(outcome)
            }
            Err(e) if e.is_validation() => {
                self.step = resume_at;
                Err(e)
            }
            Err(e) => {
                self.step = WizardStep::Failed;
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Starts a new session after a successful submission.
    pub fn start_over(&mut self) -> Result<(), ServiceError> {
        self.require(&[WizardStep::Succeeded], "start over")?;
        self.project = None;
        self.designations.clear();
        self.candidates.clear();
        self.candidates_degraded = false;
        self.reset_selections();
        self.step = WizardStep::ProjectSelection;
        Ok(())
    }

    fn reset_selections(&mut self) {
        self.selected.clear();
        self.bulk_entries.clear();
        self.sizes.clear();
    }

    fn require(&self, allowed: &[WizardStep], action: &str) -> Result<(), ServiceError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(ServiceError::InvalidOperation(format!(
                "cannot {} during {}",
                action, self.step
            )))
        }
    }
}
