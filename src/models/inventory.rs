use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock on hand for one size of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeStock {
    pub size: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    pub name: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub size_inventory: Vec<SizeStock>,
}

impl InventoryItem {
    pub fn stock_for(&self, size: &str) -> Option<&SizeStock> {
        self.size_inventory.iter().find(|stock| stock.size == size)
    }

    /// Quantity on hand for `size`, `None` when the item keeps no record for it.
    pub fn available_quantity(&self, size: &str) -> Option<i64> {
        self.stock_for(size).map(|stock| stock.quantity)
    }

    /// Whether `size` is one of the sizes this item is offered in.
    ///
    /// Items that publish no size list accept any size recorded in their stock.
    pub fn offers_size(&self, size: &str) -> bool {
        if self.sizes.is_empty() {
            self.stock_for(size).is_some()
        } else {
            self.sizes.iter().any(|s| s == size)
        }
    }

    pub fn is_in_stock(&self, size: &str) -> bool {
        self.available_quantity(size).map_or(false, |qty| qty >= 1)
    }

    pub fn price_for(&self, size: &str) -> Decimal {
        self.stock_for(size)
            .map(|stock| stock.price)
            .unwrap_or(Decimal::ZERO)
    }

    /// Sizes that currently have stock, in catalog order.
    pub fn sizes_in_stock(&self) -> Vec<&str> {
        self.sizes
            .iter()
            .map(String::as_str)
            .filter(|size| self.is_in_stock(size))
            .collect()
    }
}
