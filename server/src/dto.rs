//! Wire shapes for the REST surface.

use std::collections::BTreeMap;

use chrono::{NaiveDate, SecondsFormat};
use products_hr::{Department, DepartmentDocument, Employee, EmployeeDocument, EmployeeDraft, Gender};
use serde::{Deserialize, Serialize};

/// Relational employee without the joined department.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub department_id: i32,
    pub photo_path: Option<String>,
}

impl From<Employee> for EmployeeView {
    fn from(e: Employee) -> Self {
        Self {
            employee_id: e.employee_id,
            first_name: e.first_name,
            last_name: e.last_name,
            email: e.email,
            date_of_birth: e.date_of_birth,
            gender: e.gender,
            department_id: e.department_id,
            photo_path: e.photo_path,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDocumentView {
    pub id: Option<String>,
    pub department_id: i32,
    pub department_name: String,
}

impl From<DepartmentDocument> for DepartmentDocumentView {
    fn from(d: DepartmentDocument) -> Self {
        Self {
            id: d.native_id.map(|id| id.to_string()),
            department_id: d.department_id,
            department_name: d.department_name,
        }
    }
}

/// Document employee; `gender` stays the stored ordinal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocumentView {
    pub id: Option<String>,
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub gender: i32,
    pub department_id: i32,
    pub photo_path: Option<String>,
}

impl From<EmployeeDocument> for EmployeeDocumentView {
    fn from(d: EmployeeDocument) -> Self {
        Self {
            id: d.native_id.map(|id| id.to_string()),
            employee_id: d.employee_id,
            first_name: d.first_name,
            last_name: d.last_name,
            email: d.email,
            date_of_birth: d.date_of_birth.to_rfc3339_opts(SecondsFormat::Secs, true),
            gender: d.gender,
            department_id: d.department_id,
            photo_path: d.photo_path,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
    pub department_name: String,
}

/// Create payload. Name fields are optional on the wire so that missing
/// values surface as field errors instead of a parse rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub department_id: i32,
    #[serde(default)]
    pub photo_path: Option<String>,
    #[serde(default)]
    pub department: Option<Department>,
}

pub type FieldErrors = BTreeMap<String, Vec<String>>;

impl NewEmployee {
    pub fn validate(self) -> Result<EmployeeDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let first_name = self.first_name.unwrap_or_default();
        let last_name = self.last_name.unwrap_or_default();

        if first_name.trim().is_empty() {
            push(&mut errors, "firstName", "The FirstName field is required.");
        } else if first_name.chars().count() < 2 {
            push(&mut errors, "firstName", "FirstName must contain at least 2 characters");
        }
        if last_name.trim().is_empty() {
            push(&mut errors, "lastName", "The LastName field is required.");
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(EmployeeDraft {
            first_name,
            last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            department_id: self.department_id,
            photo_path: self.photo_path,
            department: self.department,
        })
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}
