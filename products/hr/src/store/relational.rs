use async_trait::async_trait;
use entity::{department, employee};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseBackend, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, LikeExpr},
};
use tracing::{debug, instrument};

use super::RelationalStore;
use crate::{
    error::{HrError, HrResult},
    model::{Department, DepartmentDraft, Employee, EmployeeDraft, Gender},
};

/// [`RelationalStore`] over a sea-orm connection (PostgreSQL in production,
/// SQLite in tests).
#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Moves a PostgreSQL serial sequence past rows inserted with explicit keys.
    async fn advance_sequence(&self, table: &str, column: &str) -> HrResult<()> {
        if self.db.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', '{column}'), \
             (SELECT COALESCE(MAX({column}), 1) FROM {table}))"
        );
        self.db
            .execute_unprepared(&sql)
            .await
            .map_err(HrError::relational)?;
        debug!(table, "serial sequence advanced past seeded keys");
        Ok(())
    }
}

impl From<employee::Gender> for Gender {
    fn from(value: employee::Gender) -> Self {
        match value {
            employee::Gender::Male => Gender::Male,
            employee::Gender::Female => Gender::Female,
            employee::Gender::Other => Gender::Other,
        }
    }
}

impl From<Gender> for employee::Gender {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Male => employee::Gender::Male,
            Gender::Female => employee::Gender::Female,
            Gender::Other => employee::Gender::Other,
        }
    }
}

impl From<department::Model> for Department {
    fn from(model: department::Model) -> Self {
        Self {
            department_id: model.department_id,
            department_name: model.department_name,
        }
    }
}

fn employee_row(model: employee::Model, department: Option<department::Model>) -> Employee {
    Employee {
        employee_id: model.employee_id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        date_of_birth: model.date_of_birth,
        gender: model.gender.into(),
        department_id: model.department_id,
        photo_path: model.photo_path,
        department: department.map(Department::from),
    }
}

/// `LIKE` pattern matching `fragment` literally anywhere in the value.
fn contains_pattern(fragment: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

fn seeded_employee(row: &Employee) -> employee::ActiveModel {
    employee::ActiveModel {
        employee_id: Set(row.employee_id),
        first_name: Set(row.first_name.clone()),
        last_name: Set(row.last_name.clone()),
        email: Set(row.email.clone()),
        date_of_birth: Set(row.date_of_birth),
        gender: Set(row.gender.into()),
        department_id: Set(row.department_id),
        photo_path: Set(row.photo_path.clone()),
    }
}

#[async_trait]
impl RelationalStore for SeaOrmStore {
    async fn get_department(&self, department_id: i32) -> HrResult<Option<Department>> {
        let row = department::Entity::find_by_id(department_id)
            .one(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(row.map(Department::from))
    }

    async fn list_departments(&self) -> HrResult<Vec<Department>> {
        let rows = department::Entity::find()
            .order_by_asc(department::Column::DepartmentId)
            .all(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn find_departments_by_name(&self, fragment: &str) -> HrResult<Vec<Department>> {
        let rows = department::Entity::find()
            .filter(
                Expr::col(department::Column::DepartmentName).like(contains_pattern(fragment)),
            )
            .order_by_asc(department::Column::DepartmentId)
            .all(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    #[instrument(name = "relational.add_department", skip_all)]
    async fn add_department(&self, draft: DepartmentDraft) -> HrResult<Department> {
        let active = department::ActiveModel {
            department_id: NotSet,
            department_name: Set(draft.department_name),
        };
        let model = active.insert(&self.db).await.map_err(HrError::relational)?;
        Ok(model.into())
    }

    async fn get_employee(&self, employee_id: i32) -> HrResult<Option<Employee>> {
        let row = employee::Entity::find_by_id(employee_id)
            .find_also_related(department::Entity)
            .one(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(row.map(|(model, department)| employee_row(model, department)))
    }

    async fn list_employees(&self) -> HrResult<Vec<Employee>> {
        let rows = employee::Entity::find()
            .find_also_related(department::Entity)
            .order_by_asc(employee::Column::EmployeeId)
            .all(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(rows
            .into_iter()
            .map(|(model, department)| employee_row(model, department))
            .collect())
    }

    async fn find_employee_by_email(&self, email: &str) -> HrResult<Option<Employee>> {
        let row = employee::Entity::find()
            .filter(employee::Column::Email.eq(email))
            .find_also_related(department::Entity)
            .one(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(row.map(|(model, department)| employee_row(model, department)))
    }

    #[instrument(name = "relational.add_employee", skip_all)]
    async fn add_employee(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        let active = employee::ActiveModel {
            employee_id: NotSet,
            first_name: Set(draft.first_name),
            last_name: Set(draft.last_name),
            email: Set(draft.email),
            date_of_birth: Set(draft.date_of_birth),
            gender: Set(draft.gender.into()),
            department_id: Set(draft.department_id),
            photo_path: Set(draft.photo_path),
        };
        let model = active.insert(&self.db).await.map_err(HrError::relational)?;
        Ok(employee_row(model, None))
    }

    async fn has_departments(&self) -> HrResult<bool> {
        let count = department::Entity::find()
            .count(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(count > 0)
    }

    async fn has_employees(&self) -> HrResult<bool> {
        let count = employee::Entity::find()
            .count(&self.db)
            .await
            .map_err(HrError::relational)?;
        Ok(count > 0)
    }

    async fn seed_departments(&self, rows: &[Department]) -> HrResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let models = rows.iter().map(|row| department::ActiveModel {
            department_id: Set(row.department_id),
            department_name: Set(row.department_name.clone()),
        });
        department::Entity::insert_many(models)
            .exec_without_returning(&self.db)
            .await
            .map_err(HrError::relational)?;
        self.advance_sequence("department", "department_id").await
    }

    async fn seed_employees(&self, rows: &[Employee]) -> HrResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        employee::Entity::insert_many(rows.iter().map(seeded_employee))
            .exec_without_returning(&self.db)
            .await
            .map_err(HrError::relational)?;
        self.advance_sequence("employee", "employee_id").await
    }
}
