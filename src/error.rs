use crate::data::student::StudentValidationError;
use axum::http::StatusCode;
use snafu::Snafu;
use std::{num::ParseIntError, time::Duration};

pub type StudentFormResult<T> = Result<T, StudentFormError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Connection,
    Statement,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StudentFormError {
    #[snafu(display(
        "DB_USERNAME and DB_PASSWORD must be set when not using trusted connection"
    ))]
    MissingCredentials,
    #[snafu(display("Unable to parse setting `{}` from {:?}", name, value))]
    ParseSetting {
        source: ParseIntError,
        name: &'static str,
        value: String,
    },
    #[snafu(display("Unable to connect to the database: {}", source))]
    Connect { source: sqlx::Error },
    #[snafu(display("Timed out after {}s connecting to the database", timeout.as_secs()))]
    ConnectTimeout { timeout: Duration },
    #[snafu(display("Error making SQL query: {}", source))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error starting SQL transaction: {}", source))]
    BeginTransaction { source: sqlx::Error },
    #[snafu(display("Error inserting student record: {}", source))]
    InsertStudent { source: sqlx::Error },
    #[snafu(display("Error commiting SQL transaction: {}", source))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("{}", violations.joined()))]
    InvalidStudent { violations: StudentValidationError },
}

impl StudentFormError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials | Self::ParseSetting { .. } => ErrorKind::Configuration,
            Self::InvalidStudent { .. } => ErrorKind::Validation,
            Self::Connect { .. } | Self::ConnectTimeout { .. } => ErrorKind::Connection,
            Self::MakeQuery { .. }
            | Self::BeginTransaction { .. }
            | Self::InsertStudent { .. }
            | Self::CommitTransaction { .. } => ErrorKind::Statement,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Connection => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Configuration | ErrorKind::Statement => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
