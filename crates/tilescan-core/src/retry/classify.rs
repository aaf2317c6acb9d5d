//! Classify tile source errors into retry policy error kinds.

use crate::retry::policy::ErrorKind;
use crate::source::SourceError;

/// Absence is final and never retried; every other failure is transient.
pub fn classify(e: &SourceError) -> ErrorKind {
    match e {
        SourceError::NotFound => ErrorKind::Absent,
        SourceError::Failed(_) => ErrorKind::Transient,
    }
}
