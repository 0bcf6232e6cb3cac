use super::{FormErrors, MSG_REQUIRED};
use crate::uploads::{is_allowed_image, IMAGE_EXTENSIONS};

/// The `photo` part of the upload form, collected from multipart.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ValidUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadForm {
    pub fn validate(self) -> Result<ValidUpload, FormErrors> {
        let mut errors = FormErrors::new();

        let file_name = match self.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                errors.add("photo", MSG_REQUIRED);
                return Err(errors);
            }
        };

        if !is_allowed_image(&file_name) {
            errors.add(
                "photo",
                format!(
                    "File does not have an approved extension: {}",
                    IMAGE_EXTENSIONS.join(", ")
                ),
            );
        }

        errors.finish(|| ValidUpload {
            file_name,
            bytes: self.bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_required_error() {
        let errors = UploadForm::default().validate().unwrap_err();
        assert_eq!(errors.for_field("photo"), [MSG_REQUIRED.to_string()]);
    }

    #[test]
    fn image_extension_is_accepted() {
        let valid = UploadForm {
            file_name: Some("xray.JPG".into()),
            bytes: vec![1, 2, 3],
        }
        .validate()
        .unwrap();
        assert_eq!(valid.file_name, "xray.JPG");
        assert_eq!(valid.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn non_image_is_rejected() {
        for name in ["notes.txt", "scan.pdf", "archive.tar.gz", "noextension"] {
            let errors = UploadForm {
                file_name: Some(name.into()),
                bytes: vec![0],
            }
            .validate()
            .unwrap_err();
            assert!(errors.has("photo"), "{name} should be rejected");
        }
    }
}
