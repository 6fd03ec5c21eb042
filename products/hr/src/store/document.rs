use async_trait::async_trait;
use bson::{Bson, doc};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use tracing::instrument;

use super::DocumentStore;
use crate::{
    error::{HrError, HrResult},
    model::{DepartmentDocument, EmployeeDocument, NativeId},
};

pub const DEPARTMENTS: &str = "Departments";
pub const EMPLOYEES: &str = "Employees";

/// [`DocumentStore`] over two MongoDB collections.
#[derive(Clone, Debug)]
pub struct MongoStore {
    departments: Collection<DepartmentDocument>,
    employees: Collection<EmployeeDocument>,
}

impl MongoStore {
    pub fn new(database: &Database) -> Self {
        Self {
            departments: database.collection(DEPARTMENTS),
            employees: database.collection(EMPLOYEES),
        }
    }
}

fn native_id_of(inserted: &Bson) -> Option<NativeId> {
    inserted.as_object_id().map(NativeId::from)
}

/// Case-sensitive containment; the fragment is matched literally.
fn contains_filter(field: &str, fragment: &str) -> bson::Document {
    doc! { field: { "$regex": regex::escape(fragment) } }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn get_department(&self, native_id: &NativeId) -> HrResult<Option<DepartmentDocument>> {
        self.departments
            .find_one(doc! { "_id": native_id.object_id() })
            .await
            .map_err(HrError::document)
    }

    async fn find_department(&self, department_id: i32) -> HrResult<Option<DepartmentDocument>> {
        self.departments
            .find_one(doc! { "DepartmentId": department_id })
            .await
            .map_err(HrError::document)
    }

    async fn list_departments(&self) -> HrResult<Vec<DepartmentDocument>> {
        let cursor = self
            .departments
            .find(doc! {})
            .await
            .map_err(HrError::document)?;
        cursor.try_collect().await.map_err(HrError::document)
    }

    async fn find_departments_by_name(
        &self,
        fragment: &str,
    ) -> HrResult<Vec<DepartmentDocument>> {
        let cursor = self
            .departments
            .find(contains_filter("DepartmentName", fragment))
            .await
            .map_err(HrError::document)?;
        cursor.try_collect().await.map_err(HrError::document)
    }

    #[instrument(name = "document.add_department", skip_all)]
    async fn add_department(
        &self,
        mut document: DepartmentDocument,
    ) -> HrResult<DepartmentDocument> {
        let result = self
            .departments
            .insert_one(&document)
            .await
            .map_err(HrError::document)?;
        document.native_id = native_id_of(&result.inserted_id);
        Ok(document)
    }

    async fn get_employee(&self, native_id: &NativeId) -> HrResult<Option<EmployeeDocument>> {
        self.employees
            .find_one(doc! { "_id": native_id.object_id() })
            .await
            .map_err(HrError::document)
    }

    async fn find_employee(&self, employee_id: i32) -> HrResult<Option<EmployeeDocument>> {
        self.employees
            .find_one(doc! { "EmployeeId": employee_id })
            .await
            .map_err(HrError::document)
    }

    async fn list_employees(&self) -> HrResult<Vec<EmployeeDocument>> {
        let cursor = self
            .employees
            .find(doc! {})
            .await
            .map_err(HrError::document)?;
        cursor.try_collect().await.map_err(HrError::document)
    }

    #[instrument(name = "document.add_employee", skip_all)]
    async fn add_employee(&self, mut document: EmployeeDocument) -> HrResult<EmployeeDocument> {
        let result = self
            .employees
            .insert_one(&document)
            .await
            .map_err(HrError::document)?;
        document.native_id = native_id_of(&result.inserted_id);
        Ok(document)
    }

    async fn has_departments(&self) -> HrResult<bool> {
        let count = self
            .departments
            .count_documents(doc! {})
            .limit(1)
            .await
            .map_err(HrError::document)?;
        Ok(count > 0)
    }

    async fn has_employees(&self) -> HrResult<bool> {
        let count = self
            .employees
            .count_documents(doc! {})
            .limit(1)
            .await
            .map_err(HrError::document)?;
        Ok(count > 0)
    }

    async fn add_departments(&self, documents: Vec<DepartmentDocument>) -> HrResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.departments
            .insert_many(&documents)
            .await
            .map_err(HrError::document)?;
        Ok(())
    }

    async fn add_employees(&self, documents: Vec<EmployeeDocument>) -> HrResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.employees
            .insert_many(&documents)
            .await
            .map_err(HrError::document)?;
        Ok(())
    }
}
