use serde::{Deserialize, Serialize};

/// Roster entry used to resolve uniform recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub full_name: String,
    pub designation: String,
    pub project: String,
    #[serde(default)]
    pub department: String,
}

/// One record of `GET /api/kyc/all`; the roster fields sit under `personalDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub personal_details: PersonalDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    #[serde(default, alias = "employeeCode")]
    pub employee_id: Option<String>,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default, alias = "project")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl KycRecord {
    /// Flattens the record; `None` when it carries no employee id.
    pub fn into_employee(self) -> Option<Employee> {
        let details = self.personal_details;
        let id = details
            .employee_id
            .filter(|id| !id.trim().is_empty())?;

        Some(Employee {
            id,
            full_name: details.full_name.unwrap_or_default(),
            designation: details.designation.unwrap_or_default(),
            project: details.project_name.unwrap_or_default(),
            department: details.department.unwrap_or_default(),
        })
    }
}
