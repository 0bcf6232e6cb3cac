use serde::Deserialize;

use super::{required, FormErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub code: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<ValidLogin, FormErrors> {
        let mut errors = FormErrors::new();
        let code = required(&mut errors, "code", &self.code);
        let password = required(&mut errors, "password", &self.password);
        errors.finish(|| ValidLogin {
            code: code.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
        })
    }
}
