use crate::error::{InvalidStudentSnafu, StudentFormError};
use bitflags::bitflags;
use serde::Deserialize;

pub const MIN_NAME_LEN: usize = 2;

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentValidationError: u8 {
        const NAME_TOO_SHORT =  0b0000_0001;
        const CLASS_EMPTY =     0b0000_0010;
        const ROLL_NO_INVALID = 0b0000_0100;
        const SUBJECT_EMPTY =   0b0000_1000;
    }
}

impl StudentValidationError {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|e| match e {
            Self::NAME_TOO_SHORT => Some("Name must be at least 2 characters"),
            Self::CLASS_EMPTY => Some("Class is required"),
            Self::ROLL_NO_INVALID => Some("Roll number must be a positive whole number"),
            Self::SUBJECT_EMPTY => Some("Subject is required"),
            _ => None,
        })
    }

    pub fn joined(&self) -> String {
        self.as_nice_list().collect::<Vec<_>>().join("; ")
    }
}

/// Untrusted form input, exactly as the browser sent it.
///
/// Missing fields deserialise as empty strings so they are reported as validation messages.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawStudentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub roll_no: String,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub name: String,
    pub class_name: String,
    pub roll_no: i32,
    pub subject: String,
}

impl StudentRecord {
    pub fn validate(form: &RawStudentForm) -> Result<Self, StudentFormError> {
        let name = form.name.trim();
        let class_name = form.class_name.trim();
        let subject = form.subject.trim();
        let roll_no = form
            .roll_no
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|roll_no| *roll_no > 0);

        let mut violations = StudentValidationError::empty();
        if name.chars().count() < MIN_NAME_LEN {
            violations |= StudentValidationError::NAME_TOO_SHORT;
        }
        if class_name.is_empty() {
            violations |= StudentValidationError::CLASS_EMPTY;
        }
        if roll_no.is_none() {
            violations |= StudentValidationError::ROLL_NO_INVALID;
        }
        if subject.is_empty() {
            violations |= StudentValidationError::SUBJECT_EMPTY;
        }

        let Some(roll_no) = roll_no else {
            return InvalidStudentSnafu { violations }.fail();
        };
        snafu::ensure!(violations.is_empty(), InvalidStudentSnafu { violations });

        Ok(Self {
            name: name.to_string(),
            class_name: class_name.to_string(),
            roll_no,
            subject: subject.to_string(),
        })
    }
}

/// A row read back from `Students_data` for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredStudent {
    pub name: String,
    #[sqlx(rename = "class")]
    pub class_name: String,
    pub roll_no: i32,
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{
        Deserialize,
        de::value::{Error as DeError, MapDeserializer},
    };

    fn form(name: &str, class_name: &str, roll_no: &str, subject: &str) -> RawStudentForm {
        RawStudentForm {
            name: name.into(),
            class_name: class_name.into(),
            roll_no: roll_no.into(),
            subject: subject.into(),
        }
    }

    fn violations_of(form: &RawStudentForm) -> StudentValidationError {
        match StudentRecord::validate(form) {
            Err(StudentFormError::InvalidStudent { violations }) => violations,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn valid_input_is_trimmed_and_parsed() {
        let record = StudentRecord::validate(&form("  Ann ", " 5A", " 12 ", "Math  ")).unwrap();
        assert_eq!(
            record,
            StudentRecord {
                name: "Ann".into(),
                class_name: "5A".into(),
                roll_no: 12,
                subject: "Math".into(),
            }
        );
    }

    #[test]
    fn short_name_is_rejected_after_trimming() {
        assert_eq!(
            violations_of(&form("A", "5A", "12", "Math")),
            StudentValidationError::NAME_TOO_SHORT
        );
        assert_eq!(
            violations_of(&form("  B   ", "5A", "12", "Math")),
            StudentValidationError::NAME_TOO_SHORT
        );
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        assert!(StudentRecord::validate(&form("Zoë", "5A", "1", "Art")).is_ok());
        assert_eq!(
            violations_of(&form("é", "5A", "1", "Art")),
            StudentValidationError::NAME_TOO_SHORT
        );
    }

    #[test]
    fn roll_number_must_be_positive_integer() {
        for bad in ["-3", "0", "abc", "12.5", "", "99999999999"] {
            assert_eq!(
                violations_of(&form("Ann", "5A", bad, "Math")),
                StudentValidationError::ROLL_NO_INVALID,
                "roll number {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn every_violation_is_reported() {
        let violations = violations_of(&form(" ", "", "x", "   "));
        assert_eq!(violations, StudentValidationError::all());
        assert_eq!(
            violations.joined(),
            "Name must be at least 2 characters; Class is required; \
             Roll number must be a positive whole number; Subject is required"
        );
    }

    #[test]
    fn missing_fields_deserialise_as_empty() {
        let deserializer: MapDeserializer<'_, _, DeError> =
            MapDeserializer::new([("name", "Ann"), ("class", "5A")].into_iter());
        let form = RawStudentForm::deserialize(deserializer).unwrap();

        assert_eq!(form.name, "Ann");
        assert_eq!(form.class_name, "5A");
        assert!(form.roll_no.is_empty());
        assert!(form.subject.is_empty());
    }
}
