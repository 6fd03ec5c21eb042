//! Capability interfaces for the two backing stores.
//!
//! Implementations propagate every client fault as [`HrError`] without
//! retrying. Absent point lookups are `Ok(None)`.
//!
//! [`HrError`]: crate::error::HrError

pub mod document;
pub mod relational;

use async_trait::async_trait;

use crate::{
    error::HrResult,
    model::{
        Department, DepartmentDocument, DepartmentDraft, Employee, EmployeeDocument, EmployeeDraft,
        NativeId,
    },
};

/// Authoritative store. Assigns every integer identifier.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn get_department(&self, department_id: i32) -> HrResult<Option<Department>>;
    async fn list_departments(&self) -> HrResult<Vec<Department>>;
    async fn find_departments_by_name(&self, fragment: &str) -> HrResult<Vec<Department>>;
    async fn add_department(&self, draft: DepartmentDraft) -> HrResult<Department>;

    /// Employee reads join the department row.
    async fn get_employee(&self, employee_id: i32) -> HrResult<Option<Employee>>;
    async fn list_employees(&self) -> HrResult<Vec<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> HrResult<Option<Employee>>;
    /// Inserts the employee row only; any attached department is ignored.
    async fn add_employee(&self, draft: EmployeeDraft) -> HrResult<Employee>;

    async fn has_departments(&self) -> HrResult<bool>;
    async fn has_employees(&self) -> HrResult<bool>;
    /// Inserts rows with their given identifiers.
    async fn seed_departments(&self, rows: &[Department]) -> HrResult<()>;
    /// Inserts rows with their given identifiers.
    async fn seed_employees(&self, rows: &[Employee]) -> HrResult<()>;
}

/// Mirror store. Documents carry their own native id plus the relational id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_department(&self, native_id: &NativeId) -> HrResult<Option<DepartmentDocument>>;
    async fn find_department(&self, department_id: i32) -> HrResult<Option<DepartmentDocument>>;
    async fn list_departments(&self) -> HrResult<Vec<DepartmentDocument>>;
    async fn find_departments_by_name(&self, fragment: &str)
    -> HrResult<Vec<DepartmentDocument>>;
    /// Always inserts; an existing mirror with the same id is not checked.
    async fn add_department(&self, document: DepartmentDocument) -> HrResult<DepartmentDocument>;

    async fn get_employee(&self, native_id: &NativeId) -> HrResult<Option<EmployeeDocument>>;
    async fn find_employee(&self, employee_id: i32) -> HrResult<Option<EmployeeDocument>>;
    async fn list_employees(&self) -> HrResult<Vec<EmployeeDocument>>;
    /// Always inserts; an existing mirror with the same id is not checked.
    async fn add_employee(&self, document: EmployeeDocument) -> HrResult<EmployeeDocument>;

    async fn has_departments(&self) -> HrResult<bool>;
    async fn has_employees(&self) -> HrResult<bool>;
    async fn add_departments(&self, documents: Vec<DepartmentDocument>) -> HrResult<()>;
    async fn add_employees(&self, documents: Vec<EmployeeDocument>) -> HrResult<()>;
}
