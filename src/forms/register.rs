use serde::Deserialize;

use super::{max_length, required, FormErrors};

pub const HOSPITAL_MAX: usize = 500;
pub const CODE_MAX: usize = 250;

/// Hospital registration as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub hospital: String,
    pub code: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<ValidRegistration, FormErrors> {
        let mut errors = FormErrors::new();

        let hospital = required(&mut errors, "name", &self.name);
        if let Some(h) = hospital {
            max_length(&mut errors, "name", h, HOSPITAL_MAX);
        }
        let code = required(&mut errors, "code", &self.code);
        if let Some(c) = code {
            max_length(&mut errors, "code", c, CODE_MAX);
        }
        let password = required(&mut errors, "password", &self.password);

        errors.finish(|| ValidRegistration {
            hospital: hospital.unwrap_or_default().to_string(),
            code: code.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
        })
    }
}
