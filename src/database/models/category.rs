use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_code: String,
    /// Ordered field names used to build item names
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub scheme: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub discount: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 200, message = "Category name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Tax rate must be between 0 and 100"))]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_code: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub scheme: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Category name is required"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Tax rate must be between 0 and 100"))]
    pub tax_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}
