use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::{
    error::HrResult,
    model::{Department, DepartmentDocument, Employee, EmployeeDocument, Gender},
    store::{DocumentStore, RelationalStore},
};

/// Canonical departments, ids 1-4.
pub fn departments() -> Vec<Department> {
    vec![
        Department::new(1, "IT"),
        Department::new(2, "HR"),
        Department::new(3, "Payroll"),
        Department::new(4, "Admin"),
    ]
}

/// Canonical employees, ids 1-4, each in one of the canonical departments.
pub fn employees() -> Vec<Employee> {
    vec![
        canonical(1, "John", "Hastings", "David@pragimtech.com", (1980, 10, 5), Gender::Male, 1, "images/john.png"),
        canonical(2, "Sam", "Galloway", "Sam@pragimtech.com", (1981, 12, 22), Gender::Male, 2, "images/sam.jpg"),
        canonical(3, "Mary", "Smith", "mary@pragimtech.com", (1979, 11, 11), Gender::Female, 1, "images/mary.png"),
        canonical(4, "Sara", "Longway", "sara@pragimtech.com", (1982, 9, 23), Gender::Female, 3, "images/sara.png"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn canonical(
    employee_id: i32,
    first_name: &str,
    last_name: &str,
    email: &str,
    (year, month, day): (i32, u32, u32),
    gender: Gender,
    department_id: i32,
    photo_path: &str,
) -> Employee {
    Employee {
        employee_id,
        first_name: first_name.into(),
        last_name: last_name.into(),
        email: email.into(),
        date_of_birth: NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date"),
        gender,
        department_id,
        photo_path: Some(photo_path.into()),
        department: None,
    }
}

/// Which collections of one store were empty and got seeded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StoreSeed {
    pub departments: bool,
    pub employees: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SeedReport {
    pub relational: StoreSeed,
    pub document: StoreSeed,
}

impl SeedReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Bootstraps both stores with the canonical data. Each collection is seeded
/// only when it holds no rows at all, so reruns are no-ops.
pub struct Seeder {
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
}

impl Seeder {
    pub fn new(relational: Arc<dyn RelationalStore>, document: Arc<dyn DocumentStore>) -> Self {
        Self {
            relational,
            document,
        }
    }

    #[instrument(name = "hr.seed", skip_all)]
    pub async fn run(&self) -> HrResult<SeedReport> {
        let relational = self.seed_relational().await?;
        let document = self.seed_document().await?;
        let report = SeedReport {
            relational,
            document,
        };
        info!(?report, "seeding finished");
        Ok(report)
    }

    async fn seed_relational(&self) -> HrResult<StoreSeed> {
        let mut seeded = StoreSeed::default();
        if !self.relational.has_departments().await? {
            self.relational.seed_departments(&departments()).await?;
            info!(store = "relational", "seeded departments");
            seeded.departments = true;
        }
        if !self.relational.has_employees().await? {
            self.relational.seed_employees(&employees()).await?;
            info!(store = "relational", "seeded employees");
            seeded.employees = true;
        }
        Ok(seeded)
    }

    async fn seed_document(&self) -> HrResult<StoreSeed> {
        let mut seeded = StoreSeed::default();
        if !self.document.has_departments().await? {
            let documents = departments()
                .iter()
                .map(DepartmentDocument::mirror_of)
                .collect();
            self.document.add_departments(documents).await?;
            info!(store = "document", "seeded departments");
            seeded.departments = true;
        }
        if !self.document.has_employees().await? {
            let documents = employees().iter().map(EmployeeDocument::mirror_of).collect();
            self.document.add_employees(documents).await?;
            info!(store = "document", "seeded employees");
            seeded.employees = true;
        }
        Ok(seeded)
    }
}
