use std::{sync::Arc, time::Duration};

use tracing::{error, info, instrument};

use crate::{
    deadline::Deadline,
    error::{HrError, HrResult, StoreKind},
    model::{Department, DepartmentDocument, DepartmentDraft, Employee, EmployeeDocument, EmployeeDraft},
    store::{DocumentStore, RelationalStore},
};

/// Which stores a dual write actually reached.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WriteOutcome {
    pub relational_written: bool,
    pub document_written: bool,
}

/// Result of a dual write whose relational step succeeded.
#[derive(Debug)]
pub struct DualWrite<T> {
    pub record: T,
    pub outcome: WriteOutcome,
    /// Why the mirror insert failed; `None` when both stores hold the record.
    pub mirror_failure: Option<HrError>,
}

impl<T> DualWrite<T> {
    pub fn is_consistent(&self) -> bool {
        self.outcome.relational_written && self.outcome.document_written
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

/// Writes to the relational store first, then mirrors into the document store.
///
/// No transaction spans the two stores. A failed relational insert fails the
/// call with nothing written; a failed mirror keeps the relational row and is
/// reported through [`DualWrite::outcome`].
#[derive(Clone)]
pub struct DualWriteCoordinator {
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
    timeout: Option<Duration>,
}

impl DualWriteCoordinator {
    pub fn new(
        relational: Arc<dyn RelationalStore>,
        document: Arc<dyn DocumentStore>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            relational,
            document,
            timeout,
        }
    }

    #[instrument(name = "hr.create_employee", skip_all)]
    pub async fn create_employee(
        &self,
        input: Option<EmployeeDraft>,
    ) -> HrResult<DualWrite<Employee>> {
        let mut draft = input.ok_or(HrError::InvalidArgument("employee"))?;
        let deadline = Deadline::start(self.timeout);

        // An attached department already exists; only its key is written.
        let department = draft.department.take();
        if let Some(department) = &department {
            draft.department_id = department.department_id;
        }

        let mut record = deadline
            .run(StoreKind::Relational, self.relational.add_employee(draft))
            .await?;
        record.department = department;
        info!(employee_id = record.employee_id, "employee row inserted");

        let mirror = EmployeeDocument::mirror_of(&record);
        let mirrored = deadline
            .run(StoreKind::Document, self.document.add_employee(mirror))
            .await;
        Ok(settle("employee", record.employee_id, record, mirrored.map(drop)))
    }

    #[instrument(name = "hr.create_department", skip_all)]
    pub async fn create_department(
        &self,
        input: Option<DepartmentDraft>,
    ) -> HrResult<DualWrite<Department>> {
        let draft = input.ok_or(HrError::InvalidArgument("department"))?;
        let deadline = Deadline::start(self.timeout);

        let record = deadline
            .run(StoreKind::Relational, self.relational.add_department(draft))
            .await?;
        info!(department_id = record.department_id, "department row inserted");

        let mirror = DepartmentDocument::mirror_of(&record);
        let mirrored = deadline
            .run(StoreKind::Document, self.document.add_department(mirror))
            .await;
        Ok(settle("department", record.department_id, record, mirrored.map(drop)))
    }
}

fn settle<T>(kind: &'static str, id: i32, record: T, mirrored: HrResult<()>) -> DualWrite<T> {
    match mirrored {
        Ok(()) => DualWrite {
            record,
            outcome: WriteOutcome {
                relational_written: true,
                document_written: true,
            },
            mirror_failure: None,
        },
        Err(err) => {
            error!(kind, id, error = %err, "partial dual write: mirror document missing");
            DualWrite {
                record,
                outcome: WriteOutcome {
                    relational_written: true,
                    document_written: false,
                },
                mirror_failure: Some(err),
            }
        }
    }
}
