//! Database Models
//!
//! Model + Create/Update DTO triples matching the SurrealDB tables.

pub mod assignment;
pub mod category;
pub mod order;
pub mod product;
pub mod rider;
pub mod serde_helpers;
pub mod user;
pub mod vendor;

pub use assignment::Assignment;
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use order::{Order, OrderCreate, OrderItem, OrderItemCreate, OrderItemSnapshot};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use rider::{Rider, RiderCreate, RiderUpdate};
pub use user::{User, UserUpdate};
pub use vendor::{Vendor, VendorCreate, VendorUpdate};
