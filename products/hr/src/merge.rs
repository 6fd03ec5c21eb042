use std::{sync::Arc, time::Duration};

use tracing::{debug, instrument};

use crate::{
    deadline::Deadline,
    error::{HrResult, StoreKind},
    model::{Department, DepartmentDocument, Employee, EmployeeDocument},
    store::{DocumentStore, RelationalStore},
};

/// Reads a collection from both stores at once and concatenates the results,
/// relational rows first. Mirrors are projected into the relational shape but
/// never matched against their source rows, so steady state yields each record
/// twice.
#[derive(Clone)]
pub struct MergeReader {
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
    timeout: Option<Duration>,
}

impl MergeReader {
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

    #[instrument(name = "hr.combined_employees", skip_all)]
    pub async fn combined_employees(&self) -> HrResult<Vec<Employee>> {
        let deadline = Deadline::start(self.timeout);
        let (rows, documents) = tokio::try_join!(
            deadline.run(StoreKind::Relational, self.relational.list_employees()),
            deadline.run(StoreKind::Document, self.document.list_employees()),
        )?;
        debug!(relational = rows.len(), document = documents.len(), "merging employees");
        concat_employees(rows, documents)
    }

    #[instrument(name = "hr.combined_departments", skip_all)]
    pub async fn combined_departments(&self) -> HrResult<Vec<Department>> {
        let deadline = Deadline::start(self.timeout);
        let (rows, documents) = tokio::try_join!(
            deadline.run(StoreKind::Relational, self.relational.list_departments()),
            deadline.run(StoreKind::Document, self.document.list_departments()),
        )?;
        debug!(relational = rows.len(), document = documents.len(), "merging departments");
        Ok(concat_departments(rows, documents))
    }

    /// Departments whose name contains `fragment`, filtered inside each store
    /// with that store's own case rules.
    #[instrument(name = "hr.aggregated_departments", skip(self))]
    pub async fn aggregated_departments(&self, fragment: &str) -> HrResult<Vec<Department>> {
        let deadline = Deadline::start(self.timeout);
        let (rows, documents) = tokio::try_join!(
            deadline.run(
                StoreKind::Relational,
                self.relational.find_departments_by_name(fragment)
            ),
            deadline.run(
                StoreKind::Document,
                self.document.find_departments_by_name(fragment)
            ),
        )?;
        Ok(concat_departments(rows, documents))
    }
}

fn concat_employees(
    mut rows: Vec<Employee>,
    documents: Vec<EmployeeDocument>,
) -> HrResult<Vec<Employee>> {
    rows.reserve(documents.len());
    for document in documents {
        rows.push(document.into_relational()?);
    }
    Ok(rows)
}

fn concat_departments(
    mut rows: Vec<Department>,
    documents: Vec<DepartmentDocument>,
) -> Vec<Department> {
    rows.extend(documents.into_iter().map(DepartmentDocument::into_relational));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::HrError,
        seed::{self, Seeder},
        testing::{MemoryDocuments, MemoryRelational, sqlite_store},
    };

    async fn seeded() -> (Arc<dyn RelationalStore>, Arc<MemoryDocuments>) {
        let relational: Arc<dyn RelationalStore> = Arc::new(sqlite_store().await);
        let document = Arc::new(MemoryDocuments::default());
        Seeder::new(relational.clone(), document.clone())
            .run()
            .await
            .unwrap();
        (relational, document)
    }

    #[tokio::test]
    async fn combined_is_relational_then_document() {
        let (relational, document) = seeded().await;
        let reader = MergeReader::new(relational, document, None);

        let employees = reader.combined_employees().await.unwrap();
        assert_eq!(employees.len(), 8);
        assert_eq!(
            employees.iter().map(|e| e.employee_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 1, 2, 3, 4]
        );
        assert!(employees[..4].iter().all(|e| e.department.is_some()));
        assert!(employees[4..].iter().all(|e| e.department.is_none()));

        let mut departments = seed::departments();
        departments.extend(seed::departments());
        assert_eq!(reader.combined_departments().await.unwrap(), departments);
    }

    #[tokio::test]
    async fn combined_length_is_the_sum_of_both_stores() {
        let relational = Arc::new(MemoryRelational::default());
        relational.seed_employees(&seed::employees()[..3]).await.unwrap();
        let document = Arc::new(MemoryDocuments::default());
        document
            .add_employee(EmployeeDocument::mirror_of(&seed::employees()[3]))
            .await
            .unwrap();

        let reader = MergeReader::new(relational, document, None);
        let employees = reader.combined_employees().await.unwrap();
        assert_eq!(employees.len(), 3 + 1);
        assert_eq!(
            employees.iter().map(|e| e.employee_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn aggregated_filters_each_store() {
        let (relational, document) = seeded().await;
        let reader = MergeReader::new(relational, document, None);

        let pay = reader.aggregated_departments("Pay").await.unwrap();
        assert_eq!(
            pay,
            vec![Department::new(3, "Payroll"), Department::new(3, "Payroll")]
        );
        assert!(reader.aggregated_departments("Finance").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aggregated_matches_wildcard_characters_literally() {
        let (relational, document) = seeded().await;
        let reader = MergeReader::new(relational, document, None);
        assert!(reader.aggregated_departments("_").await.unwrap().is_empty());
        assert!(reader.aggregated_departments("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aggregated_keeps_document_store_case_sensitivity() {
        let relational = Arc::new(MemoryRelational::default());
        let document = Arc::new(MemoryDocuments::default());
        document
            .add_departments(seed::departments().iter().map(DepartmentDocument::mirror_of).collect())
            .await
            .unwrap();
        let reader = MergeReader::new(relational, document, None);
        assert!(reader.aggregated_departments("pay").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_gender_fails_the_merge() {
        let (relational, document) = seeded().await;
        let mut bad = EmployeeDocument::mirror_of(&seed::employees()[0]);
        bad.employee_id = 9;
        bad.gender = 7;
        document.insert_raw_employee(bad);

        let err = MergeReader::new(relational, document, None)
            .combined_employees()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HrError::InvalidGender {
                store: StoreKind::Document,
                value: 7
            }
        ));
    }

    #[tokio::test]
    async fn slow_document_store_times_out() {
        let (relational, document) = seeded().await;
        document.delay_reads(Duration::from_secs(5));
        let reader = MergeReader::new(relational, document, Some(Duration::from_millis(50)));

        let err = reader.combined_departments().await.unwrap_err();
        assert!(matches!(
            err,
            HrError::Timeout {
                store: StoreKind::Document,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn document_read_failure_propagates() {
        let (relational, document) = seeded().await;
        document.fail_reads();
        let reader = MergeReader::new(relational, document, None);

        let err = reader.combined_employees().await.unwrap_err();
        assert_eq!(err.store(), Some(StoreKind::Document));
        let err = reader.aggregated_departments("Pay").await.unwrap_err();
        assert!(matches!(err, HrError::Store { store: StoreKind::Document, .. }));
    }
}
