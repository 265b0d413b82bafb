pub mod catalog;
pub mod node;
pub mod routes;

pub use catalog::{catalog, MENU};
pub use node::{CatalogError, MenuCatalog, MenuNode, NodeKind};
pub use routes::normalize_url;
