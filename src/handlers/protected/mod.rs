// handlers/protected/mod.rs - handlers behind the auth guard
//
// Every entity exposes create, list (/get/all), get (?id=), update,
// toggle_status and options.
pub mod category;
pub mod category_item;
pub mod category_price;
pub mod laminate_number;
pub mod session;
pub mod user;
pub mod user_type;
pub mod veneer_size;
