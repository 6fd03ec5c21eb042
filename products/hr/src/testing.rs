//! In-memory store doubles with fault and latency injection.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

use crate::{
    error::{HrError, HrResult},
    model::{
        Department, DepartmentDocument, DepartmentDraft, Employee, EmployeeDocument, EmployeeDraft,
        NativeId,
    },
    store::{DocumentStore, RelationalStore, relational::SeaOrmStore},
};

pub async fn sqlite_store() -> SeaOrmStore {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    SeaOrmStore::new(db)
}

fn unreachable(what: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, format!("{what} unreachable"))
}

#[derive(Default)]
pub struct MemoryRelational {
    departments: Mutex<Vec<Department>>,
    employees: Mutex<Vec<Employee>>,
    fail_writes: AtomicBool,
}

impl MemoryRelational {
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn employee_count(&self) -> usize {
        self.employees.lock().unwrap().len()
    }

    fn check_write(&self) -> HrResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HrError::relational(unreachable("relational store")));
        }
        Ok(())
    }

    fn joined(&self, mut employee: Employee) -> Employee {
        employee.department = self
            .departments
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.department_id == employee.department_id)
            .cloned();
        employee
    }
}

#[async_trait]
impl RelationalStore for MemoryRelational {
    async fn get_department(&self, department_id: i32) -> HrResult<Option<Department>> {
        let rows = self.departments.lock().unwrap();
        Ok(rows.iter().find(|d| d.department_id == department_id).cloned())
    }

    async fn list_departments(&self) -> HrResult<Vec<Department>> {
        Ok(self.departments.lock().unwrap().clone())
    }

    async fn find_departments_by_name(&self, fragment: &str) -> HrResult<Vec<Department>> {
        let rows = self.departments.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|d| d.department_name.contains(fragment))
            .cloned()
            .collect())
    }

    async fn add_department(&self, draft: DepartmentDraft) -> HrResult<Department> {
        self.check_write()?;
        let mut rows = self.departments.lock().unwrap();
        let next = rows.iter().map(|d| d.department_id).max().unwrap_or(0) + 1;
        let row = Department::new(next, draft.department_name);
        rows.push(row.clone());
        Ok(row)
    }

    async fn get_employee(&self, employee_id: i32) -> HrResult<Option<Employee>> {
        let found = {
            let rows = self.employees.lock().unwrap();
            rows.iter().find(|e| e.employee_id == employee_id).cloned()
        };
        Ok(found.map(|e| self.joined(e)))
    }

    async fn list_employees(&self) -> HrResult<Vec<Employee>> {
        let rows = self.employees.lock().unwrap().clone();
        Ok(rows.into_iter().map(|e| self.joined(e)).collect())
    }

    async fn find_employee_by_email(&self, email: &str) -> HrResult<Option<Employee>> {
        let found = {
            let rows = self.employees.lock().unwrap();
            rows.iter().find(|e| e.email == email).cloned()
        };
        Ok(found.map(|e| self.joined(e)))
    }

    async fn add_employee(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        self.check_write()?;
        let mut rows = self.employees.lock().unwrap();
        let next = rows.iter().map(|e| e.employee_id).max().unwrap_or(0) + 1;
        let row = Employee {
            employee_id: next,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            date_of_birth: draft.date_of_birth,
            gender: draft.gender,
            department_id: draft.department_id,
            photo_path: draft.photo_path,
            department: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn has_departments(&self) -> HrResult<bool> {
        Ok(!self.departments.lock().unwrap().is_empty())
    }

    async fn has_employees(&self) -> HrResult<bool> {
        Ok(!self.employees.lock().unwrap().is_empty())
    }

    async fn seed_departments(&self, rows: &[Department]) -> HrResult<()> {
        self.check_write()?;
        self.departments.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    async fn seed_employees(&self, rows: &[Employee]) -> HrResult<()> {
        self.check_write()?;
        let rows = rows.iter().cloned().map(|mut e| {
            e.department = None;
            e
        });
        self.employees.lock().unwrap().extend(rows);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDocuments {
    departments: Mutex<Vec<DepartmentDocument>>,
    employees: Mutex<Vec<EmployeeDocument>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryDocuments {
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Bypasses the adapter contract, for planting malformed documents.
    pub fn insert_raw_employee(&self, document: EmployeeDocument) {
        self.employees.lock().unwrap().push(document);
    }

    pub fn employee_count(&self) -> usize {
        self.employees.lock().unwrap().len()
    }

    fn check_write(&self) -> HrResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HrError::document(unreachable("document store")));
        }
        Ok(())
    }

    async fn check_read(&self) -> HrResult<()> {
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HrError::document(unreachable("document store")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn get_department(&self, native_id: &NativeId) -> HrResult<Option<DepartmentDocument>> {
        self.check_read().await?;
        let rows = self.departments.lock().unwrap();
        Ok(rows.iter().find(|d| d.native_id == Some(*native_id)).cloned())
    }

    async fn find_department(&self, department_id: i32) -> HrResult<Option<DepartmentDocument>> {
        self.check_read().await?;
        let rows = self.departments.lock().unwrap();
        Ok(rows.iter().find(|d| d.department_id == department_id).cloned())
    }

    async fn list_departments(&self) -> HrResult<Vec<DepartmentDocument>> {
        self.check_read().await?;
        Ok(self.departments.lock().unwrap().clone())
    }

    async fn find_departments_by_name(
        &self,
        fragment: &str,
    ) -> HrResult<Vec<DepartmentDocument>> {
        self.check_read().await?;
        let rows = self.departments.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|d| d.department_name.contains(fragment))
            .cloned()
            .collect())
    }

    async fn add_department(
        &self,
        mut document: DepartmentDocument,
    ) -> HrResult<DepartmentDocument> {
        self.check_write()?;
        document.native_id = Some(NativeId::generate());
        self.departments.lock().unwrap().push(document.clone());
        Ok(document)
    }

    async fn get_employee(&self, native_id: &NativeId) -> HrResult<Option<EmployeeDocument>> {
        self.check_read().await?;
        let rows = self.employees.lock().unwrap();
        Ok(rows.iter().find(|e| e.native_id == Some(*native_id)).cloned())
    }

    async fn find_employee(&self, employee_id: i32) -> HrResult<Option<EmployeeDocument>> {
        self.check_read().await?;
        let rows = self.employees.lock().unwrap();
        Ok(rows.iter().find(|e| e.employee_id == employee_id).cloned())
    }

    async fn list_employees(&self) -> HrResult<Vec<EmployeeDocument>> {
        self.check_read().await?;
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn add_employee(&self, mut document: EmployeeDocument) -> HrResult<EmployeeDocument> {
        self.check_write()?;
        document.native_id = Some(NativeId::generate());
        self.employees.lock().unwrap().push(document.clone());
        Ok(document)
    }

    async fn has_departments(&self) -> HrResult<bool> {
        self.check_read().await?;
        Ok(!self.departments.lock().unwrap().is_empty())
    }

    async fn has_employees(&self) -> HrResult<bool> {
        self.check_read().await?;
        Ok(!self.employees.lock().unwrap().is_empty())
    }

    async fn add_departments(&self, documents: Vec<DepartmentDocument>) -> HrResult<()> {
        self.check_write()?;
        let documents = documents.into_iter().map(|mut d| {
            d.native_id = Some(NativeId::generate());
            d
        });
        self.departments.lock().unwrap().extend(documents);
        Ok(())
    }

    async fn add_employees(&self, documents: Vec<EmployeeDocument>) -> HrResult<()> {
        self.check_write()?;
        let documents = documents.into_iter().map(|mut e| {
            e.native_id = Some(NativeId::generate());
            e
        });
        self.employees.lock().unwrap().extend(documents);
        Ok(())
    }
}
