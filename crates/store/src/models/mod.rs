//! Domain models returned by the repositories.
//!
//! These are validated domain objects, separate from the private row types
//! each repository decodes into.

pub mod cart;
pub mod catalog;
pub mod image;
pub mod notification;
pub mod purchase;
pub mod user;

pub use cart::CartLine;
pub use catalog::{Category, NewProduct, Product, ProductListing, ProductUpdate, Subcategory};
pub use image::{NewImage, UploadedImage};
pub use notification::Notification;
pub use purchase::{PurchaseRequest, PurchaseSummary};
pub use user::{User, UserWithHash};
