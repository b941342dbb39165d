use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Which uniform types a project's designations are entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformMapping {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "project")]
    pub project_name: String,
    #[serde(default)]
    pub designations: Vec<String>,
    #[serde(default, alias = "uniforms")]
    pub uniform_types: Vec<String>,
    #[serde(default, alias = "isPayable")]
    pub payable: bool,
    #[serde(default, alias = "isDisabled")]
    pub disabled: bool,
    /// Uniform type name to inventory item id, when the catalog maintains one.
    #[serde(default)]
    pub item_ids: BTreeMap<String, String>,
}

impl UniformMapping {
    pub fn applies_to(&self, project: &str, designation: &str) -> bool {
        self.project_name == project && self.designations.iter().any(|d| d == designation)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    #[strum(disabled)]
    Unknown,
}

/// A pre-existing uniform request raised for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformRequest {
    #[serde(alias = "_id")]
    pub id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default, alias = "project")]
    pub project_name: Option<String>,
    #[serde(default, alias = "uniformType")]
    pub uniform_types: Vec<String>,
    /// Uniform type to the size originally asked for.
    #[serde(default, alias = "size")]
    pub sizes: BTreeMap<String, String>,
    #[serde(default = "default_request_quantity", alias = "qty")]
    pub quantity: u32,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
}

fn default_request_quantity() -> u32 {
    1
}

impl UniformRequest {
    /// Size recorded on the request for `uniform_type`, empty when none was given.
    pub fn original_size(&self, uniform_type: &str) -> &str {
        self.sizes
            .get(uniform_type)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Only approved requests may be placed on a DC.
    pub fn is_dc_eligible(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }
}
