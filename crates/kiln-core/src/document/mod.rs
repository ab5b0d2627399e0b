//! Document session domain module.
//!
//! - `model`: a single open buffer (`Document`)
//! - `collection`: the ordered tab set plus active selection
//!   (`DocumentCollection`), expressed as pure transitions
//! - `manager`: persistence orchestration over the gateways
//!   (`DocumentManager`)

mod collection;
mod manager;
mod model;

pub use collection::DocumentCollection;
pub use manager::DocumentManager;
pub use model::{Document, ensure_extension};
