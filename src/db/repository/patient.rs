use rusqlite::{params, Connection};

use crate::db::{is_unique_violation, DatabaseError, InsertOutcome};
use crate::models::{NewPatient, PatientRecord};

/// Insert a patient intake record.
pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<InsertOutcome, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO patient (name, age, gender, image_id, hospital) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient.name,
            patient.age,
            patient.gender,
            patient.image_id,
            patient.hospital,
        ],
    );

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
        Err(e) => Err(e.into()),
    }
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<PatientRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, age, gender, image_id, hospital FROM patient WHERE id = ?1",
    )?;
    match stmt.query_row(params![id], patient_from_row) {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All records carrying the given hospital name, oldest first.
pub fn list_patients_by_hospital(
    conn: &Connection,
    hospital: &str,
) -> Result<Vec<PatientRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, age, gender, image_id, hospital FROM patient
         WHERE hospital = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![hospital], patient_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM patient", [], |row| row.get(0))?)
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        image_id: row.get(4)?,
        hospital: row.get(5)?,
    })
}
