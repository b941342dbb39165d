use std::collections::BTreeSet;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::catalog::Catalog;
use crate::errors::ServiceError;
use crate::models::{BulkIssueLineItem, Employee, InventoryItem, UniformSelection};

pub const BULK_RECIPIENT_NAME: &str = "Bulk (unassigned)";
const BULK_RECIPIENT_PREFIX: &str = "BULK-";

/// Turns bulk uniform selections into per-employee issue lines.
pub struct BulkEntryBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> BulkEntryBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Builds line items for `selections` at `project` for `designations`.
    ///
    /// With matching employees each selection is split across them: everyone
    /// but the last gets `ceil(total / n)` (capped by what is left) and the
    /// last takes the remainder, so the quantities always sum to the total.
    /// Without matching employees each selection becomes one placeholder line
    /// carrying the full quantity. Lines with a non-positive quantity are
    /// dropped; a quantity too large for a line item is a validation error.
    #[instrument(skip(self, selections), fields(selections = selections.len()))]
    pub fn create_entries(
        &self,
        selections: &[UniformSelection],
        project: &str,
        designations: &BTreeSet<String>,
    ) -> Result<Vec<BulkIssueLineItem>, ServiceError> {
        let employees = self.catalog.relevant_employees(project, designations);
        let designation_list = designations
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut entries = Vec::new();
        for selection in selections {
            let (item, total) = self.resolve(selection)?;
            if total == 0 {
                continue;
            }

            if employees.is_empty() {
                entries.push(placeholder_entry(
                    item,
                    selection,
                    total,
                    project,
                    &designation_list,
                ));
                continue;
            }

            let shares = apportion(i64::from(total), employees.len());
            for (employee, share) in employees.iter().zip(shares) {
                // Shares never exceed `total`, so only empty ones fail here.
                let quantity = match u32::try_from(share) {
                    Ok(quantity) if quantity > 0 => quantity,
                    _ => continue,
                };
                entries.push(employee_entry(
                    item,
                    selection,
                    employee,
                    quantity,
                    project,
                    &designation_list,
                ));
            }
        }

        debug!(
            entries = entries.len(),
            employees = employees.len(),
            "bulk entries created"
        );
        Ok(entries)
    }

    /// The catalog item and the quantity to hand out, `0` when non-positive.
    fn resolve(
        &self,
        selection: &UniformSelection,
    ) -> Result<(&'a InventoryItem, u32), ServiceError> {
        let item = self.catalog.resolve_uniform(&selection.name).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Uniform '{}' is not in the inventory catalog",
                selection.name
            ))
        })?;

        if !item.offers_size(&selection.size) {
            return Err(ServiceError::ValidationError(format!(
                "Size '{}' is not available for {}",
                selection.size, item.name
            )));
        }

        let quantity = if selection.quantity <= 0 {
            0
        } else {
            u32::try_from(selection.quantity).map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Quantity {} for {} is too large",
                    selection.quantity, item.name
                ))
            })?
        };
        Ok((item, quantity))
    }
}

/// Splits `total` over `recipients` in order; the last one absorbs the remainder.
pub fn apportion(total: i64, recipients: usize) -> Vec<i64> {
    if recipients == 0 {
        return Vec::new();
    }

    let n = recipients as i64;
    let per_recipient = if total > 0 {
        total / n + i64::from(total % n != 0)
    } else {
        0
    };

    let mut remaining = total;
    let mut shares = Vec::with_capacity(recipients);
    for _ in 0..recipients - 1 {
        let share = per_recipient.min(remaining.max(0));
        remaining -= share;
        shares.push(share);
    }
    shares.push(remaining);
    shares
}

fn employee_entry(
    item: &InventoryItem,
    selection: &UniformSelection,
    employee: &Employee,
    quantity: u32,
    project: &str,
    designations: &str,
) -> BulkIssueLineItem {
    BulkIssueLineItem {
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        item_code: item.code.clone(),
        size: selection.size.clone(),
        quantity,
        employee_id: employee.id.clone(),
        employee_name: employee.full_name.clone(),
        remarks: format!(
            "Bulk issue for {} at {}: {} ({})",
            designations, project, employee.full_name, employee.id
        ),
        size_data: None,
    }
}

fn placeholder_entry(
    item: &InventoryItem,
    selection: &UniformSelection,
    quantity: u32,
    project: &str,
    designations: &str,
) -> BulkIssueLineItem {
    let token = Uuid::new_v4().simple().to_string();
    BulkIssueLineItem {
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        item_code: item.code.clone(),
        size: selection.size.clone(),
        quantity,
        employee_id: format!("{}{}", BULK_RECIPIENT_PREFIX, &token[..8].to_uppercase()),
        employee_name: BULK_RECIPIENT_NAME.to_string(),
        remarks: format!(
            "Bulk issue for {} at {}: no matching employees, unassigned",
            designations, project
        ),
        size_data: None,
    }
}

/// Whether a line was generated for an unassigned bulk recipient.
pub fn is_placeholder_recipient(employee_id: &str) -> bool {
    employee_id.starts_with(BULK_RECIPIENT_PREFIX)
}
