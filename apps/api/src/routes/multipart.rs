//! Buffered multipart form shared by the upload routes.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;

pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Reads every part. Parts carrying a file name are kept as files, the rest as text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_some() {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read `{name}`: {e}")))?;
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read `{name}`: {e}")))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Result<&str, AppError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::Validation(format!("`{name}` is required")))
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        let raw = self.text("user_id")?;
        Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Validation("`user_id` must be a UUID".to_string()))
    }

    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.files
            .remove(name)
            .ok_or_else(|| AppError::Validation(format!("`{name}` file is required")))
    }
}
