use crate::{
    config::database::ConnectionConfig,
    data::student::StudentRecord,
    error::{
        BeginTransactionSnafu, CommitTransactionSnafu, InsertStudentSnafu, MakeQuerySnafu,
        StudentFormResult,
    },
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::Connection;
use std::{fmt::Debug, sync::Arc};

pub const STUDENTS_TABLE: &str = "Students_data";

const INSERT_STUDENT: &str =
    r#"INSERT INTO "Students_data" (name, class, roll_no, subject) VALUES ($1, $2, $3, $4)"#;

/// Where validated student records end up.
#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    /// Persists exactly one record, or nothing at all.
    async fn insert_student(&self, record: &StudentRecord) -> StudentFormResult<()>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StudentFormResult<()>;
}

/// Opens a fresh connection per call. There is no pool.
#[derive(Clone, Debug)]
pub struct SqlStudentStore {
    config: Arc<ConnectionConfig>,
}

impl SqlStudentStore {
    pub const fn new(config: Arc<ConnectionConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StudentStore for SqlStudentStore {
    async fn insert_student(&self, record: &StudentRecord) -> StudentFormResult<()> {
        let mut conn = self.config.connect().await?;

        //dropping an uncommitted transaction rolls it back, and dropping the connection closes it
        let mut transaction = conn.begin().await.context(BeginTransactionSnafu)?;
        sqlx::query(INSERT_STUDENT)
            .bind(&record.name)
            .bind(&record.class_name)
            .bind(record.roll_no)
            .bind(&record.subject)
            .execute(&mut *transaction)
            .await
            .context(InsertStudentSnafu)?;
        transaction.commit().await.context(CommitTransactionSnafu)?;

        if let Err(e) = conn.close().await {
            warn!(?e, "Error closing database connection after insert");
        }

        Ok(())
    }

    async fn ping(&self) -> StudentFormResult<()> {
        let mut conn = self.config.connect().await?;
        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .context(MakeQuerySnafu)?;

        if let Err(e) = conn.close().await {
            warn!(?e, "Error closing database connection after ping");
        }

        Ok(())
    }
}
