//! Program access mapping between backend rows and the menu catalog.
//!
//! Load path: rows -> `mapper` -> `resolution` (with `propagate`).
//! Save path: checked ids -> `reconcile` -> backend identifiers.

pub mod mapper;
pub mod propagate;
pub mod reconcile;
pub mod resolution;
pub mod row;

pub use mapper::{map_row, MatchSource, RowMapping};
pub use propagate::{propagate, Propagation};
pub use reconcile::{Reconciler, Reconciliation};
pub use resolution::{resolve, MissingMapping, Resolution};
pub use row::{AssignedRow, Assignment};
