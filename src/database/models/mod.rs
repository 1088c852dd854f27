pub mod category;
pub mod category_item;
pub mod category_price;
pub mod laminate_number;
pub mod user;
pub mod user_type;
pub mod veneer_size;

use serde::Serialize;
use uuid::Uuid;

pub use category::{Category, CreateCategory, UpdateCategory};
pub use category_item::{CategoryItem, CreateCategoryItems, NewCategoryItem, UpdateCategoryItem};
pub use category_price::{CategoryPrice, CreateCategoryPrice, FieldValues, PriceItem, UpdateCategoryPrice};
pub use laminate_number::{CreateLaminateNumbers, LaminateNumber, NewLaminateNumber, UpdateLaminateNumber};
pub use user::{CreateUser, NewUser, UpdateUser, User};
pub use user_type::{CreateUserType, UpdateUserType, UserType};
pub use veneer_size::{CreateVeneerSize, NewVeneerSize, UpdateVeneerSize, VeneerSize};

/// Entry of an `/options` dropdown list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub value: Uuid,
    pub label: String,
}

impl OptionItem {
    pub fn new(value: Uuid, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }

    /// Case-insensitive by label, then id for stability.
    pub fn sort(items: &mut [OptionItem]) {
        items.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.value.cmp(&b.value))
        });
    }
}
