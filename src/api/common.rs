//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use axum::extract::Multipart;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::middleware::ApiError;
use crate::services::FileUpload;

/// Local calendar date used for running/upcoming decisions
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `?search=` query shared by the list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// `?status=` query shared by the board/inbox endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// `{ "text": ... }` body for comments, replies and chat messages
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Generic `{ "success": true }` body for deletes and other empty results
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// A decoded multipart form: text fields plus uploaded files by field name
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<(String, FileUpload)>,
}

impl MultipartForm {
    /// Read every part of a multipart body into memory
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::validation_error(format!("Failed to read file: {}", e))
                    })?;
                    // Browsers send an empty part for untouched file inputs
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.push((
                        name,
                        FileUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::validation_error(format!("Failed to read field: {}", e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Text field, trimmed; `None` when absent or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text field or an empty string
    pub fn text_or_default(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// Checkbox-style flag: "true", "on", "1" or "yes"
    pub fn flag(&self, name: &str) -> bool {
        self.text(name).is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
        })
    }

    /// Optional `YYYY-MM-DD` date field
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, ApiError> {
        self.text(name).map(|v| parse_date(name, v)).transpose()
    }

    /// Optional integer field
    pub fn int(&self, name: &str) -> Result<Option<i64>, ApiError> {
        self.text(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| ApiError::validation_error(format!("Invalid {}: {}", name, v)))
            })
            .transpose()
    }

    /// Take every file sent under one of the given field names
    pub fn take_files(&mut self, names: &[&str]) -> Vec<FileUpload> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| names.contains(&field.as_str()));
        self.files = rest;
        taken.into_iter().map(|(_, file)| file).collect()
    }

    /// Take the first file sent under `name`
    pub fn take_file(&mut self, name: &str) -> Option<FileUpload> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation_error(format!("Invalid {}: {}", field, value)))
}
