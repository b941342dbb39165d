use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use super::catalog::Catalog;
use crate::models::{BulkIssueLineItem, SizeProvenance, UniformRequest};

/// Operator overrides of requested sizes, keyed by `(request id, uniform type)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSelections {
    chosen: BTreeMap<(String, String), String>,
}

impl SizeSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(
        &mut self,
        request_id: impl Into<String>,
        uniform_type: impl Into<String>,
        size: impl Into<String>,
    ) {
        self.chosen
            .insert((request_id.into(), uniform_type.into()), size.into());
    }

    pub fn selection(&self, request_id: &str, uniform_type: &str) -> Option<&str> {
        self.chosen
            .get(&(request_id.to_string(), uniform_type.to_string()))
            .map(String::as_str)
    }

    /// The operator's choice, else the size on the request.
    pub fn effective_size<'a>(&'a self, request: &'a UniformRequest, uniform_type: &str) -> &'a str {
        self.selection(&request.id, uniform_type)
            .unwrap_or_else(|| request.original_size(uniform_type))
    }

    /// True when a selection exists and differs from a non-empty original size.
    pub fn is_size_changed(&self, request: &UniformRequest, uniform_type: &str) -> bool {
        let original = request.original_size(uniform_type);
        match self.selection(&request.id, uniform_type) {
            Some(selected) => !original.is_empty() && selected != original,
            None => false,
        }
    }

    /// Drops the selections of requests no longer in `keep`.
    pub fn retain_requests(&mut self, keep: &[&str]) {
        self.chosen
            .retain(|(request_id, _), _| keep.contains(&request_id.as_str()));
    }

    pub fn clear(&mut self) {
        self.chosen.clear();
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    NotChosen,
    OutOfStock { size: String },
}

/// A `(request, uniform type)` pair blocking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSize {
    pub request_id: String,
    pub employee_name: String,
    pub uniform_type: String,
    pub reason: MissingReason,
}

impl fmt::Display for MissingSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MissingReason::NotChosen => {
                write!(f, "{}: choose a size for {}", self.employee_name, self.uniform_type)
            }
            MissingReason::OutOfStock { size } => write!(
                f,
                "{}: {} size {} is out of stock",
                self.employee_name, self.uniform_type, size
            ),
        }
    }
}

/// Pairs that have no usable size.
///
/// Only uniform types resolving to an inventory item are checked; unknown
/// types cannot be verified and are let through. A size whose stock record
/// shows zero is refused; a size without a stock record passes.
pub fn missing_sizes(
    catalog: &Catalog,
    requests: &[&UniformRequest],
    selections: &SizeSelections,
) -> Vec<MissingSize> {
    let mut missing = Vec::new();

    for request in requests {
        for uniform_type in &request.uniform_types {
            let Some(item) = catalog.resolve_uniform(uniform_type) else {
                continue;
            };

            let size = selections.effective_size(request, uniform_type).trim();
            let reason = if size.is_empty() {
                Some(MissingReason::NotChosen)
            } else if matches!(item.available_quantity(size), Some(quantity) if quantity <= 0) {
                Some(MissingReason::OutOfStock {
                    size: size.to_string(),
                })
            } else {
                None
            };

            if let Some(reason) = reason {
                missing.push(MissingSize {
                    request_id: request.id.clone(),
                    employee_name: request.employee_name.clone(),
                    uniform_type: uniform_type.clone(),
                    reason,
                });
            }
        }
    }

    missing
}

pub fn all_sizes_selected(
    catalog: &Catalog,
    requests: &[&UniformRequest],
    selections: &SizeSelections,
) -> bool {
    missing_sizes(catalog, requests, selections).is_empty()
}

/// Line items for the selected requests, one per resolvable uniform type.
pub fn request_line_items(
    catalog: &Catalog,
    requests: &[&UniformRequest],
    selections: &SizeSelections,
) -> Vec<BulkIssueLineItem> {
    let mut lines = Vec::new();

    for request in requests {
        let employee_name = if request.employee_name.trim().is_empty() {
            catalog
                .employee(&request.employee_id)
                .map(|e| e.full_name.clone())
                .unwrap_or_default()
        } else {
            request.employee_name.clone()
        };

        for uniform_type in &request.uniform_types {
            let Some(item) = catalog.resolve_uniform(uniform_type) else {
                warn!(
                    request_id = %request.id,
                    uniform_type = %uniform_type,
                    "uniform type has no inventory item, left off the DC"
                );
                continue;
            };

            let original = request.original_size(uniform_type);
            let selected = selections.effective_size(request, uniform_type);
            let modified = selections.is_size_changed(request, uniform_type);

            let mut remarks = format!("Uniform request {} for {}", request.id, employee_name);
            if modified {
                remarks.push_str(&format!("; size changed from {} to {}", original, selected));
            }

            lines.push(BulkIssueLineItem {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                item_code: item.code.clone(),
                size: selected.to_string(),
                quantity: request.quantity.max(1),
                employee_id: request.employee_id.clone(),
                employee_name: employee_name.clone(),
                remarks,
                size_data: Some(SizeProvenance {
                    original_size: original.to_string(),
                    selected_size: selected.to_string(),
                    modified,
                }),
            });
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::test_support::{request, site_a_catalog};

    #[test]
    fn size_change_needs_a_differing_selection_and_an_original() {
        let req = request("r1", "E1", &[("Blue Shirt", "L"), ("Cap", "")]);
        let mut selections = SizeSelections::new();
        assert!(!selections.is_size_changed(&req, "Blue Shirt"));

        selections.select("r1", "Blue Shirt", "L");
        assert!(!selections.is_size_changed(&req, "Blue Shirt"));

        selections.select("r1", "Blue Shirt", "M");
        assert!(selections.is_size_changed(&req, "Blue Shirt"));

        selections.select("r1", "Cap", "Free");
        assert!(!selections.is_size_changed(&req, "Cap"));
        assert_eq!(selections.effective_size(&req, "Cap"), "Free");
    }

    #[test]
    fn gate_defaults_to_original_size() {
        let catalog = site_a_catalog();
        let r1 = request("r1", "E1", &[("Blue Shirt", "M"), ("Cap", "Free")]);
        assert!(all_sizes_selected(&catalog, &[&r1], &SizeSelections::new()));
    }

    #[test]
    fn gate_blocks_missing_and_zero_stock_sizes() {
        let catalog = site_a_catalog();
        let r1 = request("r1", "E1", &[("Cap", "")]);
        let r2 = request("r2", "E2", &[("Blue Shirt", "L")]);
        let mut selections = SizeSelections::new();

        let missing = missing_sizes(&catalog, &[&r1, &r2], &selections);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].reason, MissingReason::NotChosen);
        assert_eq!(
            missing[1].reason,
            MissingReason::OutOfStock { size: "L".into() }
        );
        assert!(missing[1].to_string().contains("out of stock"));

        selections.select("r1", "Cap", "Free");
        selections.select("r2", "Blue Shirt", "M");
        assert!(all_sizes_selected(&catalog, &[&r1, &r2], &selections));
    }

    #[test]
    fn unresolvable_types_are_exempt_from_the_gate() {
        let catalog = site_a_catalog();
        let r1 = request("r1", "E1", &[("Boots", "")]);
        assert!(all_sizes_selected(&catalog, &[&r1], &SizeSelections::new()));
        assert!(request_line_items(&catalog, &[&r1], &SizeSelections::new()).is_empty());
    }

    #[test]
    fn line_items_record_size_provenance() {
        let catalog = site_a_catalog();
        let r1 = request("r1", "E1", &[("Blue Shirt", "M")]);
        let r2 = request("r2", "E2", &[("Blue Shirt", "L")]);
        let mut selections = SizeSelections::new();
        selections.select("r2", "Blue Shirt", "M");

        let lines = request_line_items(&catalog, &[&r1, &r2], &selections);
        assert_eq!(lines.len(), 2);

        let kept = lines[0].size_data.as_ref().unwrap();
        assert!(!kept.modified);
        assert_eq!(lines[0].size, "M");

        let changed = lines[1].size_data.as_ref().unwrap();
        assert_eq!(changed.original_size, "L");
        assert_eq!(changed.selected_size, "M");
        assert!(changed.modified);
        assert_eq!(lines[1].size, "M");
        assert!(lines[1].remarks.contains("changed from L to M"));
    }

    #[test]
    fn retain_drops_deselected_requests() {
        let mut selections = SizeSelections::new();
        selections.select("r1", "Cap", "Free");
        selections.select("r2", "Cap", "Free");
        selections.retain_requests(&["r2"]);
        assert_eq!(selections.len(), 1);
        assert!(selections.selection("r1", "Cap").is_none());
    }
}
