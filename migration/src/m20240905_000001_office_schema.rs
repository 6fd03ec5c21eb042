use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Department { Table, DepartmentId, DepartmentName }

#[derive(DeriveIden)]
enum Employee {
    Table,
    EmployeeId,
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    Gender,
    DepartmentId,
    PhotoPath,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Department::Table)
                .if_not_exists()
                .col(ColumnDef::new(Department::DepartmentId).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Department::DepartmentName).string_len(128).not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Employee::Table)
                .if_not_exists()
                .col(ColumnDef::new(Employee::EmployeeId).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Employee::FirstName).string_len(128).not_null())
                .col(ColumnDef::new(Employee::LastName).string_len(128).not_null())
                .col(ColumnDef::new(Employee::Email).string_len(320).not_null())
                .col(ColumnDef::new(Employee::DateOfBirth).date().not_null())
                // 0 = Male, 1 = Female, 2 = Other
                .col(ColumnDef::new(Employee::Gender).integer().not_null())
                .col(ColumnDef::new(Employee::DepartmentId).integer().not_null())
                .col(ColumnDef::new(Employee::PhotoPath).string_len(512))
                .foreign_key(ForeignKey::create()
                    .name("fk_employee_department")
                    .from(Employee::Table, Employee::DepartmentId)
                    .to(Department::Table, Department::DepartmentId)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        // Lookup index only; email uniqueness is checked by callers before create.
        manager.create_index(
            Index::create().name("idx_employee_email").table(Employee::Table).col(Employee::Email).to_owned()
        ).await?;

        manager.create_index(
            Index::create().name("idx_employee_department").table(Employee::Table).col(Employee::DepartmentId).to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Employee::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Department::Table).to_owned()).await?;
        Ok(())
    }
}
