// Catalog snapshots fetched from the upstream APIs
pub mod employee;
pub mod inventory;
pub mod project;
pub mod uniform;

// Documents built and submitted by the workflow
pub mod issue;

pub use employee::{Employee, KycRecord};
pub use inventory::{InventoryItem, SizeStock};
pub use issue::{
    BulkIssueLineItem, CreatedDocument, DcHeader, DeliveryChallanRecord, IssueItem,
    IssueMirrorRecord, IssueRecord, IssueRequest, OutwardDcItem, OutwardDcRequest,
    SizeProvenance, UniformSelection,
};
pub use project::{is_valid_project_name, Project};
pub use uniform::{ApprovalStatus, UniformMapping, UniformRequest};
