use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Operator's bulk choice on the issue page: a uniform type, a size and a total quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformSelection {
    pub name: String,
    pub size: String,
    pub quantity: i64,
}

impl UniformSelection {
    pub fn new(name: impl Into<String>, size: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            quantity,
        }
    }
}

/// Original and chosen size of a line built from a uniform request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeProvenance {
    pub original_size: String,
    pub selected_size: String,
    pub modified: bool,
}

/// One row of an issue or DC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIssueLineItem {
    pub item_id: String,
    pub item_name: String,
    pub item_code: String,
    pub size: String,
    pub quantity: u32,
    pub employee_id: String,
    pub employee_name: String,
    pub remarks: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_data: Option<SizeProvenance>,
}

/// Header fields the operator fills in before submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DcHeader {
    /// Issuer / customer the DC is addressed to
    #[validate(custom(function = "validate_not_blank", message = "Customer is required"))]
    pub customer: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub dc_date: Option<NaiveDate>,
    #[validate(custom(function = "validate_not_blank", message = "DC number is required"))]
    pub dc_number: String,
    #[serde(default)]
    pub remarks: String,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutwardDcItem {
    pub id: String,
    pub employee_id: String,
    pub item_code: String,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub price: Decimal,
    pub remarks: String,
}

/// Body of `POST /api/inventory/outward-dc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutwardDcRequest {
    pub customer: String,
    pub dc_number: String,
    pub dc_date: NaiveDate,
    pub remarks: String,
    pub address: String,
    pub items: Vec<OutwardDcItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueItem {
    pub id: String,
    pub quantity: u32,
    pub size: String,
    pub employee_id: String,
}

/// Body of `POST /api/inventory/issue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub issue_to: String,
    pub department: String,
    pub purpose: String,
    pub address: String,
    pub issue_date: NaiveDate,
    pub items: Vec<IssueItem>,
}

/// What the upstream returned for a created document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub id: Option<String>,
    pub message: Option<String>,
}

/// Row of `GET /api/inventory/issue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub issue_to: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Local copy of a submitted DC, kept in the `bulk_dcs` mirror list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChallanRecord {
    pub dc_number: String,
    pub customer: String,
    pub dc_date: NaiveDate,
    pub address: String,
    pub remarks: String,
    pub items: Vec<BulkIssueLineItem>,
    #[serde(default)]
    pub upstream_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Local copy of a submitted issue, kept in the `bulk_issues` mirror list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueMirrorRecord {
    pub dc_number: String,
    pub request: IssueRequest,
    #[serde(default)]
    pub upstream_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_requires_customer_and_dc_number() {
        let header = DcHeader {
            customer: "  ".into(),
            dc_number: String::new(),
            ..Default::default()
        };
        let errors = header.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("customer"));
        assert!(fields.contains_key("dc_number"));
    }

    #[test]
    fn outward_dc_serializes_with_upstream_field_names() {
        let body = OutwardDcRequest {
            customer: "Site-A".into(),
            dc_number: "DC-001".into(),
            dc_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            remarks: String::new(),
            address: "12 Harbour Road".into(),
            items: vec![OutwardDcItem {
                id: "item-1".into(),
                employee_id: "E1".into(),
                item_code: "UNI-SH-01".into(),
                name: "Blue Shirt".into(),
                size: "M".into(),
                quantity: 1,
                price: Decimal::new(350, 0),
                remarks: String::new(),
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["dcNumber"], "DC-001");
        assert_eq!(value["dcDate"], "2026-10-19");
        assert_eq!(value["items"][0]["employeeId"], "E1");
        assert_eq!(value["items"][0]["itemCode"], "UNI-SH-01");
    }
}
