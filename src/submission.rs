use crate::{
    data::student::{RawStudentForm, StudentRecord},
    error::{ErrorKind, StudentFormError},
    store::StudentStore,
};

/// What happened to one form submission. Either way the record is not kept.
#[derive(Debug)]
pub enum Submission {
    Accepted(StudentRecord),
    Rejected(StudentFormError),
}

impl Submission {
    pub fn message(&self) -> String {
        match self {
            Self::Accepted(record) => {
                format!("Data submitted successfully for {}!", record.name)
            }
            Self::Rejected(e) if e.kind() == ErrorKind::Validation => {
                format!("Please fix the following: {e}")
            }
            Self::Rejected(e) => format!("Error: {e}"),
        }
    }
}

/// Validates the raw fields and, only if they all pass, writes one row.
///
/// Never returns an error: every failure becomes a [`Submission::Rejected`].
pub async fn handle_submission(store: &dyn StudentStore, form: &RawStudentForm) -> Submission {
    let record = match StudentRecord::validate(form) {
        Ok(record) => record,
        Err(e) => {
            warn!(%e, "Rejected student submission");
            return Submission::Rejected(e);
        }
    };

    match store.insert_student(&record).await {
        Ok(()) => {
            info!(name = %record.name, class = %record.class_name, roll_no = record.roll_no, "Stored student record");
            Submission::Accepted(record)
        }
        Err(e) => {
            error!(?e, "Error storing student record");
            Submission::Rejected(e)
        }
    }
}
