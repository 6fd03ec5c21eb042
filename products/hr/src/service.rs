use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    coordinator::{DualWrite, DualWriteCoordinator},
    deadline::Deadline,
    error::{HrResult, StoreKind},
    merge::MergeReader,
    model::{
        Department, DepartmentDocument, DepartmentDraft, Employee, EmployeeDocument, EmployeeDraft,
        NativeId,
    },
    store::{DocumentStore, RelationalStore},
};

/// Department use cases exposed to the HTTP layer.
#[async_trait]
pub trait DepartmentOperations: Send + Sync {
    async fn list_departments(&self) -> HrResult<Vec<Department>>;
    async fn get_department(&self, department_id: i32) -> HrResult<Option<Department>>;
    async fn list_department_documents(&self) -> HrResult<Vec<DepartmentDocument>>;
    /// Looks up a mirror by the relational id it carries.
    async fn find_department_document(
        &self,
        department_id: i32,
    ) -> HrResult<Option<DepartmentDocument>>;
    async fn combined_departments(&self) -> HrResult<Vec<Department>>;
    async fn aggregated_departments(&self, fragment: &str) -> HrResult<Vec<Department>>;
    async fn create_department(
        &self,
        input: Option<DepartmentDraft>,
    ) -> HrResult<DualWrite<Department>>;
}

/// Employee use cases exposed to the HTTP layer.
#[async_trait]
pub trait EmployeeOperations: Send + Sync {
    async fn list_employees(&self) -> HrResult<Vec<Employee>>;
    async fn get_employee(&self, employee_id: i32) -> HrResult<Option<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> HrResult<Option<Employee>>;
    async fn list_employee_documents(&self) -> HrResult<Vec<EmployeeDocument>>;
    async fn get_employee_document(&self, native_id: &NativeId)
    -> HrResult<Option<EmployeeDocument>>;
    async fn find_employee_document(&self, employee_id: i32)
    -> HrResult<Option<EmployeeDocument>>;
    async fn combined_employees(&self) -> HrResult<Vec<Employee>>;
    async fn create_employee(&self, input: Option<EmployeeDraft>) -> HrResult<DualWrite<Employee>>;
}

/// Both operation sets over one pair of stores.
#[derive(Clone)]
pub struct HrService {
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
    coordinator: DualWriteCoordinator,
    reader: MergeReader,
    timeout: Option<Duration>,
}

impl HrService {
    pub fn new(
        relational: Arc<dyn RelationalStore>,
        document: Arc<dyn DocumentStore>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            coordinator: DualWriteCoordinator::new(relational.clone(), document.clone(), timeout),
            reader: MergeReader::new(relational.clone(), document.clone(), timeout),
            relational,
            document,
            timeout,
        }
    }

    async fn on_relational<T, F>(&self, fut: F) -> HrResult<T>
    where
        F: Future<Output = HrResult<T>> + Send,
    {
        Deadline::start(self.timeout).run(StoreKind::Relational, fut).await
    }

    async fn on_document<T, F>(&self, fut: F) -> HrResult<T>
    where
        F: Future<Output = HrResult<T>> + Send,
    {
        Deadline::start(self.timeout).run(StoreKind::Document, fut).await
    }
}

#[async_trait]
impl DepartmentOperations for HrService {
    async fn list_departments(&self) -> HrResult<Vec<Department>> {
        self.on_relational(self.relational.list_departments()).await
    }

    async fn get_department(&self, department_id: i32) -> HrResult<Option<Department>> {
        self.on_relational(self.relational.get_department(department_id))
            .await
    }

    async fn list_department_documents(&self) -> HrResult<Vec<DepartmentDocument>> {
        self.on_document(self.document.list_departments()).await
    }

    async fn find_department_document(
        &self,
        department_id: i32,
    ) -> HrResult<Option<DepartmentDocument>> {
        self.on_document(self.document.find_department(department_id))
            .await
    }

    async fn combined_departments(&self) -> HrResult<Vec<Department>> {
        self.reader.combined_departments().await
    }

    async fn aggregated_departments(&self, fragment: &str) -> HrResult<Vec<Department>> {
        self.reader.aggregated_departments(fragment).await
    }

    async fn create_department(
        &self,
        input: Option<DepartmentDraft>,
    ) -> HrResult<DualWrite<Department>> {
        self.coordinator.create_department(input).await
    }
}

#[async_trait]
impl EmployeeOperations for HrService {
    async fn list_employees(&self) -> HrResult<Vec<Employee>> {
        self.on_relational(self.relational.list_employees()).await
    }

    async fn get_employee(&self, employee_id: i32) -> HrResult<Option<Employee>> {
        self.on_relational(self.relational.get_employee(employee_id))
            .await
    }

    async fn find_employee_by_email(&self, email: &str) -> HrResult<Option<Employee>> {
        self.on_relational(self.relational.find_employee_by_email(email))
            .await
    }

    async fn list_employee_documents(&self) -> HrResult<Vec<EmployeeDocument>> {
        self.on_document(self.document.list_employees()).await
    }

    async fn get_employee_document(
        &self,
        native_id: &NativeId,
    ) -> HrResult<Option<EmployeeDocument>> {
        self.on_document(self.document.get_employee(native_id)).await
    }

    async fn find_employee_document(
        &self,
        employee_id: i32,
    ) -> HrResult<Option<EmployeeDocument>> {
        self.on_document(self.document.find_employee(employee_id)).await
    }

    async fn combined_employees(&self) -> HrResult<Vec<Employee>> {
        self.reader.combined_employees().await
    }

    async fn create_employee(&self, input: Option<EmployeeDraft>) -> HrResult<DualWrite<Employee>> {
        self.coordinator.create_employee(input).await
    }
}
