use serde::{Deserialize, Serialize};

/// One submitted patient-detail form.
///
/// `hospital` is free text. Nothing ties it to a row in `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: i64,
    pub image_id: i64,
    pub hospital: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub age: i64,
    pub gender: i64,
    pub image_id: i64,
    pub hospital: String,
}
