use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use super::catalog::Catalog;
use crate::api::InventoryApi;
use crate::errors::ServiceError;
use crate::mirror::{LocalMirror, BULK_DCS, BULK_ISSUES};
use crate::models::{
    BulkIssueLineItem, DcHeader, DeliveryChallanRecord, IssueItem, IssueMirrorRecord,
    IssueRequest, OutwardDcItem, OutwardDcRequest,
};

/// What happened to the stock deduction that follows a DC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IssueDeduction {
    Created { id: Option<String>, lines: usize },
    /// No line had stock on hand, so no issue was posted.
    Skipped,
    /// The DC stands; stock was not deducted upstream.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub dc: DeliveryChallanRecord,
    pub issue: IssueDeduction,
}

impl SubmissionOutcome {
    /// Non-blocking warning for the operator when the DC went through but the
    /// stock deduction did not.
    pub fn warning(&self) -> Option<String> {
        match &self.issue {
            IssueDeduction::Failed { reason } => Some(format!(
                "DC {} was created but stock was not deducted: {}",
                self.dc.dc_number, reason
            )),
            _ => None,
        }
    }
}

/// Posts a DC and its stock-deduction issue.
#[derive(Clone)]
pub struct IssueDcSubmitter {
    api: Arc<dyn InventoryApi>,
    mirror: LocalMirror,
}

impl IssueDcSubmitter {
    pub fn new(api: Arc<dyn InventoryApi>, mirror: LocalMirror) -> Self {
        Self { api, mirror }
    }

    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    /// Checks everything that can be checked before any network call.
    pub async fn validate(
        &self,
        header: &DcHeader,
        lines: &[BulkIssueLineItem],
    ) -> Result<NaiveDate, ServiceError> {
        header.validate()?;
        let dc_date = header
            .dc_date
            .ok_or_else(|| ServiceError::ValidationError("DC date is required".to_string()))?;

        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "No items selected for the DC".to_string(),
            ));
        }
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(ServiceError::ValidationError(format!(
                "{} for {} has no quantity",
                line.item_name, line.employee_name
            )));
        }

        // The upstream is the authority on uniqueness; this only catches
        // numbers this client already used.
        match self.mirror.is_dc_number_known(&header.dc_number).await {
            Ok(true) => {
                return Err(ServiceError::Conflict(format!(
                    "DC number {} already exists",
                    header.dc_number.trim()
                )))
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not read local DC numbers, skipping uniqueness check"),
        }

        Ok(dc_date)
    }

    /// Posts the DC, then the issue for lines that have stock on hand.
    ///
    /// A failed DC call fails the submission. A failed issue call does not: the
    /// DC stands and the failure comes back as [`IssueDeduction::Failed`].
    #[instrument(skip(self, catalog, header, lines), fields(dc_number = %header.dc_number, lines = lines.len()))]
    pub async fn submit(
        &self,
        catalog: &Catalog,
        header: &DcHeader,
        lines: &[BulkIssueLineItem],
    ) -> Result<SubmissionOutcome, ServiceError> {
        let dc_date = self.validate(header, lines).await?;

        let dc_request = outward_dc_request(catalog, header, dc_date, lines);
        let created = self
            .api
            .create_outward_dc(&dc_request)
            .await
            .map_err(|e| {
                error!(error = %e, "DC creation failed");
                e
            })?;
        info!(upstream_id = ?created.id, "DC created");

        let dc = DeliveryChallanRecord {
            dc_number: dc_request.dc_number.clone(),
            customer: dc_request.customer.clone(),
            dc_date,
            address: dc_request.address.clone(),
            remarks: dc_request.remarks.clone(),
            items: lines.to_vec(),
            upstream_id: created.id,
            created_at: Utc::now(),
        };

        let issue_request = issue_request(catalog, header, dc_date, lines);
        let issue = if issue_request.items.is_empty() {
            info!("no line has stock on hand, issue skipped");
            IssueDeduction::Skipped
        } else {
            match self.api.create_issue(&issue_request).await {
                Ok(doc) => {
                    info!(upstream_id = ?doc.id, lines = issue_request.items.len(), "issue created");
                    self.mirror_issue(&dc.dc_number, &issue_request, doc.id.clone())
                        .await;
                    IssueDeduction::Created {
                        id: doc.id,
                        lines: issue_request.items.len(),
                    }
                }
                Err(e) => {
                    error!(error = %e, "issue creation failed after DC was created; stock not deducted");
                    IssueDeduction::Failed {
                        reason: e.user_message(),
                    }
                }
            }
        };

        self.mirror_dc(&dc).await;
        Ok(SubmissionOutcome { dc, issue })
    }

    async fn mirror_dc(&self, dc: &DeliveryChallanRecord) {
        if let Err(e) = self.mirror.append(BULK_DCS, dc).await {
            warn!(error = %e, "failed to mirror DC locally");
        }
        if let Err(e) = self.mirror.save_document(&dc.dc_number, dc).await {
            warn!(error = %e, "failed to save DC document locally");
        }
    }

    async fn mirror_issue(&self, dc_number: &str, request: &IssueRequest, upstream_id: Option<String>) {
        let record = IssueMirrorRecord {
            dc_number: dc_number.to_string(),
            request: request.clone(),
            upstream_id,
            created_at: Utc::now(),
        };
        if let Err(e) = self.mirror.append(BULK_ISSUES, &record).await {
            warn!(error = %e, "failed to mirror issue locally");
        }
    }
}

fn outward_dc_request(
    catalog: &Catalog,
    header: &DcHeader,
    dc_date: NaiveDate,
    lines: &[BulkIssueLineItem],
) -> OutwardDcRequest {
    OutwardDcRequest {
        customer: header.customer.trim().to_string(),
        dc_number: header.dc_number.trim().to_string(),
        dc_date,
        remarks: header.remarks.clone(),
        address: header.address.clone(),
        items: lines
            .iter()
            .map(|line| OutwardDcItem {
                id: line.item_id.clone(),
                employee_id: line.employee_id.clone(),
                item_code: line.item_code.clone(),
                name: line.item_name.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                price: catalog
                    .item(&line.item_id)
                    .map(|item| item.price_for(&line.size))
                    .unwrap_or_default(),
                remarks: line.remarks.clone(),
            })
            .collect(),
    }
}

/// Issue body holding only lines whose size record shows stock on hand.
fn issue_request(
    catalog: &Catalog,
    header: &DcHeader,
    issue_date: NaiveDate,
    lines: &[BulkIssueLineItem],
) -> IssueRequest {
    IssueRequest {
        issue_to: header.customer.trim().to_string(),
        department: header.department.clone(),
        purpose: header.purpose.clone(),
        address: header.address.clone(),
        issue_date,
        items: lines
            .iter()
            .filter(|line| {
                catalog
                    .item(&line.item_id)
                    .map_or(false, |item| item.is_in_stock(&line.size))
            })
            .map(|line| IssueItem {
                id: line.item_id.clone(),
                quantity: line.quantity,
                size: line.size.clone(),
                employee_id: line.employee_id.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockInventoryApi;
    use crate::mirror::DCS;
    use crate::models::CreatedDocument;
    use crate::services::catalog::test_support::site_a_catalog;
    use assert_matches::assert_matches;
    use serde_json::Value;

    fn header(dc_number: &str) -> DcHeader {
        DcHeader {
            customer: "Site-A".into(),
            department: "Security".into(),
            purpose: "Uniform issue".into(),
            address: "Site-A gate 1".into(),
            dc_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            dc_number: dc_number.into(),
            remarks: String::new(),
        }
    }

    fn line(item_id: &str, size: &str, employee_id: &str) -> BulkIssueLineItem {
        BulkIssueLineItem {
            item_id: item_id.into(),
            item_name: item_id.into(),
            item_code: format!("CODE-{}", item_id),
            size: size.into(),
            quantity: 1,
            employee_id: employee_id.into(),
            employee_name: format!("Employee {}", employee_id),
            remarks: String::new(),
            size_data: None,
        }
    }

    fn created(id: &str) -> CreatedDocument {
        CreatedDocument {
            id: Some(id.into()),
            message: None,
        }
    }

    #[tokio::test]
    async fn issue_omits_lines_without_stock() {
        let mut api = MockInventoryApi::new();
        api.expect_create_outward_dc()
            .withf(|req| req.items.len() == 2 && req.dc_number == "DC-1")
            .times(1)
            .returning(|_| Ok(created("dc-1")));
        api.expect_create_issue()
            .withf(|req| {
                req.items.len() == 1 && req.items[0].size == "M" && req.issue_to == "Site-A"
            })
            .times(1)
            .returning(|_| Ok(created("iss-1")));

        let mirror = LocalMirror::in_memory();
        let submitter = IssueDcSubmitter::new(Arc::new(api), mirror.clone());
        let outcome = submitter
            .submit(
                &site_a_catalog(),
                &header("DC-1"),
                &[line("item-shirt", "M", "E1"), line("item-shirt", "L", "E2")],
            )
            .await
            .unwrap();

        assert_eq!(outcome.dc.items.len(), 2);
        assert_eq!(outcome.dc.upstream_id.as_deref(), Some("dc-1"));
        assert_matches!(outcome.issue, IssueDeduction::Created { lines: 1, .. });
        assert!(outcome.warning().is_none());

        assert_eq!(mirror.list::<Value>(BULK_DCS).await.unwrap().len(), 1);
        assert_eq!(mirror.list::<Value>(BULK_ISSUES).await.unwrap().len(), 1);
        assert!(mirror
            .document::<DeliveryChallanRecord>("DC-1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn issue_failure_keeps_the_dc_and_warns() {
        let mut api = MockInventoryApi::new();
        api.expect_create_outward_dc()
            .returning(|_| Ok(created("dc-2")));
        api.expect_create_issue()
            .returning(|_| Err(ServiceError::ExternalApiError("Insufficient stock".into())));

        let mirror = LocalMirror::in_memory();
        let submitter = IssueDcSubmitter::new(Arc::new(api), mirror.clone());
        let outcome = submitter
            .submit(&site_a_catalog(), &header("DC-2"), &[line("item-cap", "Free", "E1")])
            .await
            .unwrap();

        assert_matches!(&outcome.issue, IssueDeduction::Failed { reason } if reason == "Insufficient stock");
        assert!(outcome.warning().unwrap().contains("DC-2"));
        assert_eq!(mirror.list::<Value>(BULK_DCS).await.unwrap().len(), 1);
        assert!(mirror.list::<Value>(BULK_ISSUES).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_stock_on_any_line_skips_the_issue() {
        let mut api = MockInventoryApi::new();
        api.expect_create_outward_dc()
            .returning(|_| Ok(created("dc-3")));
        api.expect_create_issue().never();

        let submitter = IssueDcSubmitter::new(Arc::new(api), LocalMirror::in_memory());
        let outcome = submitter
            .submit(&site_a_catalog(), &header("DC-3"), &[line("item-shirt", "L", "E2")])
            .await
            .unwrap();
        assert_eq!(outcome.issue, IssueDeduction::Skipped);
    }

    #[tokio::test]
    async fn dc_failure_fails_the_submission() {
        let mut api = MockInventoryApi::new();
        api.expect_create_outward_dc()
            .returning(|_| Err(ServiceError::ExternalApiError("DC number already exists".into())));
        api.expect_create_issue().never();

        let mirror = LocalMirror::in_memory();
        let submitter = IssueDcSubmitter::new(Arc::new(api), mirror.clone());
        let result = submitter
            .submit(&site_a_catalog(), &header("DC-4"), &[line("item-cap", "Free", "E1")])
            .await;

        assert_matches!(result, Err(ServiceError::ExternalApiError(msg)) if msg == "DC number already exists");
        assert!(mirror.list::<Value>(BULK_DCS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_happens_before_any_call() {
        let mut api = MockInventoryApi::new();
        api.expect_create_outward_dc().never();
        api.expect_create_issue().never();

        let mirror = LocalMirror::in_memory();
        mirror
            .append(DCS, &serde_json::json!({"dcNumber": "DC-7"}))
            .await
            .unwrap();
        let submitter = IssueDcSubmitter::new(Arc::new(api), mirror);
        let catalog = site_a_catalog();
        let lines = [line("item-cap", "Free", "E1")];

        assert_matches!(
            submitter.submit(&catalog, &header("dc-7"), &lines).await,
            Err(ServiceError::Conflict(_))
        );
        assert_matches!(
            submitter.submit(&catalog, &header(" "), &lines).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            submitter.submit(&catalog, &header("DC-8"), &[]).await,
            Err(ServiceError::ValidationError(_))
        );

        let mut undated = header("DC-8");
        undated.dc_date = None;
        assert_matches!(
            submitter.submit(&catalog, &undated, &lines).await,
            Err(ServiceError::ValidationError(msg)) if msg.contains("date")
        );
    }
}
