//! HR records kept in two stores: a relational store that owns identifiers and
//! a document store that mirrors every record under its own native ids.
//!
//! Writes go through [`DualWriteCoordinator`], merged reads through
//! [`MergeReader`], and both stores are bootstrapped by [`Seeder`]. The HTTP
//! layer talks to [`DepartmentOperations`] and [`EmployeeOperations`].

pub mod coordinator;
pub mod deadline;
pub mod error;
pub mod merge;
pub mod model;
pub mod seed;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use coordinator::{DualWrite, DualWriteCoordinator, WriteOutcome};
pub use deadline::Deadline;
pub use error::{HrError, HrResult, StoreKind};
pub use merge::MergeReader;
pub use model::{
    Department, DepartmentDocument, DepartmentDraft, Employee, EmployeeDocument, EmployeeDraft,
    Gender, NativeId,
};
pub use seed::{SeedReport, Seeder, StoreSeed};
pub use service::{DepartmentOperations, EmployeeOperations, HrService};
pub use store::{DocumentStore, RelationalStore, document::MongoStore, relational::SeaOrmStore};
