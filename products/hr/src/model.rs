use std::{fmt, str::FromStr};

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HrError, HrResult, StoreKind};

/// Canonical gender. Both stores persist the ordinal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const fn ordinal(self) -> i32 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
            Gender::Other => 2,
        }
    }

    /// Fails on anything outside `0..=2`; `store` names where the value was read.
    pub fn from_ordinal(store: StoreKind, value: i32) -> HrResult<Self> {
        match value {
            0 => Ok(Gender::Male),
            1 => Ok(Gender::Female),
            2 => Ok(Gender::Other),
            value => Err(HrError::InvalidGender { store, value }),
        }
    }
}

/// Document-store address. Only meaningful inside the document adapter and
/// never copied into relational records.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeId(ObjectId);

impl NativeId {
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for NativeId {
    fn from(value: ObjectId) -> Self {
        Self(value)
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for NativeId {
    type Err = bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s).map(Self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub department_id: i32,
    pub department_name: String,
}

impl Department {
    pub fn new(department_id: i32, department_name: impl Into<String>) -> Self {
        Self {
            department_id,
            department_name: department_name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDraft {
    pub department_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub department_id: i32,
    pub photo_path: Option<String>,
    /// Joined from the department table on relational reads.
    pub department: Option<Department>,
}

/// Create input for an employee. The store assigns `employee_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub department_id: i32,
    #[serde(default)]
    pub photo_path: Option<String>,
    /// Reference to an existing department. Never inserted; when present its
    /// id replaces `department_id`.
    #[serde(default)]
    pub department: Option<Department>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepartmentDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<NativeId>,
    pub department_id: i32,
    pub department_name: String,
}

impl DepartmentDocument {
    pub fn mirror_of(department: &Department) -> Self {
        Self {
            native_id: None,
            department_id: department.department_id,
            department_name: department.department_name.clone(),
        }
    }

    pub fn into_relational(self) -> Department {
        Department {
            department_id: self.department_id,
            department_name: self.department_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<NativeId>,
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date_of_birth: DateTime<Utc>,
    /// Ordinal, see [`Gender::ordinal`].
    pub gender: i32,
    pub department_id: i32,
    #[serde(default)]
    pub photo_path: Option<String>,
}

impl EmployeeDocument {
    pub fn mirror_of(employee: &Employee) -> Self {
        Self {
            native_id: None,
            employee_id: employee.employee_id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            date_of_birth: midnight_utc(employee.date_of_birth),
            gender: employee.gender.ordinal(),
            department_id: employee.department_id,
            photo_path: employee.photo_path.clone(),
        }
    }

    /// Relational shape of this document. The native id is dropped and no
    /// department is joined.
    pub fn into_relational(self) -> HrResult<Employee> {
        Ok(Employee {
            employee_id: self.employee_id,
            gender: Gender::from_ordinal(StoreKind::Document, self.gender)?,
            date_of_birth: self.date_of_birth.date_naive(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            department_id: self.department_id,
            photo_path: self.photo_path,
            department: None,
        })
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
