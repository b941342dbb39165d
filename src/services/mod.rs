// Catalog snapshots and roster lookups
pub mod catalog;

// Building the DC line items
pub mod bulk_entry;
pub mod size_reconciliation;

// Posting documents upstream
pub mod dc_wizard;
pub mod submission;

// Reporting
pub mod issues;

pub use bulk_entry::{apportion, BulkEntryBuilder};
pub use catalog::{Catalog, CatalogService, CatalogSource};
pub use dc_wizard::{DcWizard, WizardStep};
pub use issues::{IssueLedger, Page};
pub use size_reconciliation::{
    all_sizes_selected, missing_sizes, request_line_items, MissingReason, MissingSize,
    SizeSelections,
};
pub use submission::{IssueDcSubmitter, IssueDeduction, SubmissionOutcome};
