use serde::Deserialize;

use super::{max_length, required, required_integer, FormErrors};
use crate::models::NewPatient;

pub const NAME_MAX: usize = 250;
pub const HOSPITAL_MAX: usize = 500;
pub const AGE_MAX: i64 = 150;

/// Patient details as posted. Numeric fields arrive as text and are coerced
/// here so a bad value produces a message instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
}

impl PatientForm {
    pub fn validate(&self) -> Result<NewPatient, FormErrors> {
        let mut errors = FormErrors::new();

        let name = required(&mut errors, "name", &self.name);
        if let Some(n) = name {
            max_length(&mut errors, "name", n, NAME_MAX);
        }
        let age = required_integer(&mut errors, "age", &self.age);
        if let Some(a) = age {
            if !(0..=AGE_MAX).contains(&a) {
                errors.add("age", format!("Number must be between 0 and {AGE_MAX}."));
            }
        }
        let gender = required_integer(&mut errors, "gender", &self.gender);
        let image_id = required_integer(&mut errors, "image_id", &self.image_id);
        let hospital = required(&mut errors, "hospital", &self.hospital);
        if let Some(h) = hospital {
            max_length(&mut errors, "hospital", h, HOSPITAL_MAX);
        }

        errors.finish(|| NewPatient {
            name: name.unwrap_or_default().to_string(),
            age: age.unwrap_or_default(),
            gender: gender.unwrap_or_default(),
            image_id: image_id.unwrap_or_default(),
            hospital: hospital.unwrap_or_default().to_string(),
        })
    }
}
