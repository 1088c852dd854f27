use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VeneerSize {
    pub id: Uuid,
    pub height: f64,
    pub width: f64,
    pub category_id: Uuid,
    #[serde(default)]
    pub category_name: Option<String>,
    pub code: String,
    pub postfix: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VeneerSize {
    /// `HxW`, e.g. `8x4`
    pub fn label(&self) -> String {
        format!("{}x{}", self.height, self.width)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVeneerSize {
    #[validate(range(exclusive_min = 0.0, message = "Height must be positive"))]
    pub height: f64,
    #[validate(range(exclusive_min = 0.0, message = "Width must be positive"))]
    pub width: f64,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVeneerSize {
    pub height: f64,
    pub width: f64,
    pub category_id: Uuid,
    pub code: String,
    pub postfix: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVeneerSize {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, message = "Height must be positive"))]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, message = "Width must be positive"))]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}
