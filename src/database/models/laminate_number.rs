use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaminateNumber {
    pub id: Uuid,
    pub company_id: String,
    pub catalog_id: String,
    pub finish_id: String,
    pub name: String,
    /// `N` + zero-padded postfix
    pub code: String,
    pub postfix: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Batch create over `names`, or a single `name`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLaminateNumbers {
    #[validate(length(min = 1, message = "Company is required"))]
    pub company_id: String,
    #[validate(length(min = 1, message = "Catalog is required"))]
    pub catalog_id: String,
    #[validate(length(min = 1, message = "Finish is required"))]
    pub finish_id: String,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CreateLaminateNumbers {
    pub fn requested_names(&self) -> Vec<String> {
        let mut names = self.names.clone().unwrap_or_default();
        if let Some(name) = &self.name {
            names.push(name.clone());
        }
        names
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLaminateNumber {
    pub company_id: String,
    pub catalog_id: String,
    pub finish_id: String,
    pub name: String,
    pub code: String,
    pub postfix: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLaminateNumber {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
}
