use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::category_price::FieldValues;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_price_id: Uuid,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_code: String,
    pub item_name: String,
    #[serde(default)]
    pub purchase_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Batch create: pick priced items of the category's active price list.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryItems {
    pub category_id: Uuid,
    #[validate(length(min = 1, message = "At least one field value set is required"))]
    pub field_values: Vec<FieldValues>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategoryItem {
    pub category_id: Uuid,
    pub category_price_id: Uuid,
    pub tax_rate: f64,
    pub tax_code: String,
    pub item_name: String,
    pub purchase_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryItem {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Tax rate must be between 0 and 100"))]
    pub tax_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Item name is required"))]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Purchase price cannot be negative"))]
    pub purchase_price: Option<f64>,
}
