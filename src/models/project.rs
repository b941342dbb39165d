use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Catalog placeholder names that do not identify a real site.
pub const PLACEHOLDER_PROJECT_NAMES: [&str; 2] = ["General", "N/A"];

/// A client site with its sanctioned headcount per designation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "projectName")]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "headcount")]
    pub total_headcount: u32,
    /// Designation name to headcount.
    #[serde(default, alias = "designationCounts")]
    pub designations: BTreeMap<String, u32>,
}

impl Project {
    pub fn designation_names(&self) -> BTreeSet<String> {
        self.designations.keys().cloned().collect()
    }
}

/// True when `name` can be used as a DC project: not blank and not a
/// placeholder. Placeholder comparison is case-sensitive.
pub fn is_valid_project_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && !PLACEHOLDER_PROJECT_NAMES.contains(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", false)]
    #[case("   ", false)]
    #[case("General", false)]
    #[case("N/A", false)]
    #[case("general", true)]
    #[case("n/a", true)]
    #[case("Site-A", true)]
    fn project_name_validation(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_valid_project_name(name), expected);
    }

    #[test]
    fn deserializes_upstream_shape() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "projectName": "Site-A",
            "address": "12 Harbour Road",
            "totalHeadcount": 12,
            "designations": { "Guard": 10, "Supervisor": 2 }
        }))
        .unwrap();

        assert_eq!(project.id, "p1");
        assert_eq!(project.name, "Site-A");
        assert_eq!(project.total_headcount, 12);
        assert_eq!(
            project.designation_names().into_iter().collect::<Vec<_>>(),
            vec!["Guard".to_string(), "Supervisor".to_string()]
        );
    }
}
