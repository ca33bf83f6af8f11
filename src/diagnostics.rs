use crate::{
    config::database::ConnectionConfig,
    data::student::StoredStudent,
    error::{MakeQuerySnafu, StudentFormResult},
    store::STUDENTS_TABLE,
};
use snafu::ResultExt;
use sqlx::{Connection, PgConnection};
use std::fmt;
use time::OffsetDateTime;

pub const TROUBLESHOOTING_STEPS: [&str; 5] = [
    "Ensure the database server is running",
    "Check server name and database name (DB_SERVER, DB_NAME)",
    "Check the server accepts connections from this machine",
    "Check trusted-connection permissions, or DB_USERNAME/DB_PASSWORD",
    "Ensure the target database exists",
];

pub const CREATE_TABLE_SQL: &str = r#"CREATE TABLE "Students_data" (
    id INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    class VARCHAR(50) NOT NULL,
    roll_no INT NOT NULL,
    subject VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);"#;

const RECENT_RECORDS: i64 = 3;

#[derive(Debug)]
pub enum TableReport {
    Missing,
    Present {
        record_count: i64,
        recent: Vec<StoredStudent>,
    },
}

#[derive(Debug)]
pub struct ConnectionReport {
    pub database_name: String,
    pub server_version: String,
    pub server_time: OffsetDateTime,
    pub table: TableReport,
}

#[derive(Debug)]
pub enum DiagnosticReport {
    Connected(ConnectionReport),
    Failed { cause: String },
}

impl DiagnosticReport {
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Read-only connectivity check. Errors end up inside the report rather than being returned.
pub async fn check_connection(config: &ConnectionConfig) -> DiagnosticReport {
    match inspect(config).await {
        Ok(report) => {
            info!(database = %report.database_name, "Database connection successful");
            DiagnosticReport::Connected(report)
        }
        Err(e) => {
            error!(?e, "Database connection failed");
            DiagnosticReport::Failed {
                cause: e.to_string(),
            }
        }
    }
}

async fn inspect(config: &ConnectionConfig) -> StudentFormResult<ConnectionReport> {
    let mut conn = config.connect().await?;

    let database_name: String = sqlx::query_scalar("SELECT current_database()")
        .fetch_one(&mut conn)
        .await
        .context(MakeQuerySnafu)?;
    let server_version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&mut conn)
        .await
        .context(MakeQuerySnafu)?;
    let server_time: OffsetDateTime = sqlx::query_scalar("SELECT now()")
        .fetch_one(&mut conn)
        .await
        .context(MakeQuerySnafu)?;

    let table = inspect_table(&mut conn).await?;

    if let Err(e) = conn.close().await {
        warn!(?e, "Error closing diagnostic connection");
    }

    Ok(ConnectionReport {
        database_name,
        server_version: server_version.lines().next().unwrap_or_default().to_string(),
        server_time,
        table,
    })
}

async fn inspect_table(conn: &mut PgConnection) -> StudentFormResult<TableReport> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name::text = $1)",
    )
    .bind(STUDENTS_TABLE)
    .fetch_one(&mut *conn)
    .await
    .context(MakeQuerySnafu)?;

    if !exists {
        return Ok(TableReport::Missing);
    }

    let record_count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "Students_data""#)
        .fetch_one(&mut *conn)
        .await
        .context(MakeQuerySnafu)?;

    let recent = if record_count > 0 {
        sqlx::query_as::<_, StoredStudent>(
            r#"SELECT name, class, roll_no, subject FROM "Students_data" ORDER BY id DESC LIMIT $1"#,
        )
        .bind(RECENT_RECORDS)
        .fetch_all(&mut *conn)
        .await
        .context(MakeQuerySnafu)?
    } else {
        vec![]
    };

    Ok(TableReport::Present {
        record_count,
        recent,
    })
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(report) => {
                writeln!(f, "DATABASE CONNECTION SUCCESSFUL!")?;
                writeln!(f, "Connected to: {}", report.database_name)?;
                writeln!(f, "Server: {}", report.server_version)?;
                writeln!(f, "Server time: {}", report.server_time)?;

                match &report.table {
                    TableReport::Missing => {
                        writeln!(f, "{STUDENTS_TABLE} table: NOT FOUND")?;
                        writeln!(f)?;
                        writeln!(f, "To create the {STUDENTS_TABLE} table, run this SQL:")?;
                        writeln!(f, "{CREATE_TABLE_SQL}")?;
                    }
                    TableReport::Present {
                        record_count,
                        recent,
                    } => {
                        writeln!(f, "{STUDENTS_TABLE} table: EXISTS")?;
                        writeln!(f, "Records in table: {record_count}")?;
                        if !recent.is_empty() {
                            writeln!(f)?;
                            writeln!(f, "Recent records:")?;
                            for student in recent {
                                writeln!(
                                    f,
                                    "   - {} | Class: {} | Roll: {} | Subject: {}",
                                    student.name,
                                    student.class_name,
                                    student.roll_no,
                                    student.subject
                                )?;
                            }
                        }
                    }
                }
            }
            Self::Failed { cause } => {
                writeln!(f, "DATABASE CONNECTION FAILED!")?;
                writeln!(f, "Error: {cause}")?;
                writeln!(f)?;
                writeln!(f, "Troubleshooting steps:")?;
                for (i, step) in TROUBLESHOOTING_STEPS.iter().enumerate() {
                    writeln!(f, "{}. {step}", i + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn connected(table: TableReport) -> DiagnosticReport {
        DiagnosticReport::Connected(ConnectionReport {
            database_name: "Students".into(),
            server_version: "PostgreSQL 16.2".into(),
            server_time: OffsetDateTime::UNIX_EPOCH,
            table,
        })
    }

    #[tokio::test]
    async fn unreachable_server_reports_failure_with_checklist() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([
            ("DB_SERVER", "127.0.0.1:1"),
            ("DB_CONNECT_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();

        let report = check_connection(&config).await;
        assert!(!report.is_connected());

        let printed = report.to_string();
        assert!(printed.contains("DATABASE CONNECTION FAILED!"));
        for step in TROUBLESHOOTING_STEPS {
            assert!(printed.contains(step));
        }
    }

    #[test]
    fn missing_table_suggests_create_statement() {
        let printed = connected(TableReport::Missing).to_string();
        assert!(printed.contains("Connected to: Students"));
        assert!(printed.contains("Students_data table: NOT FOUND"));
        assert!(printed.contains(CREATE_TABLE_SQL));
    }

    #[test]
    fn present_table_lists_recent_records() {
        let printed = connected(TableReport::Present {
            record_count: 7,
            recent: vec![StoredStudent {
                name: "Ann".into(),
                class_name: "5A".into(),
                roll_no: 12,
                subject: "Math".into(),
            }],
        })
        .to_string();

        assert!(printed.contains("Records in table: 7"));
        assert!(printed.contains("   - Ann | Class: 5A | Roll: 12 | Subject: Math"));
        assert!(!printed.contains("CREATE TABLE"));
    }
}
