use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Candidate values for one category field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    pub field: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// One priced line item of a category price list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub name: String,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_code: String,
    #[serde(default)]
    pub purchase_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrice {
    pub id: Uuid,
    pub category_id: Uuid,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_values: Vec<FieldValues>,
    #[serde(default)]
    pub items: Vec<PriceItem>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `create` and `generate`. `fields` defaults to the category's
/// field order and `items` to the generated cross product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPrice {
    pub category_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub field_values: Vec<FieldValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PriceItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPrice {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_values: Option<Vec<FieldValues>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PriceItem>>,
}
