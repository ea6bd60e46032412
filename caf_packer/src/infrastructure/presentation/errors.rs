// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! HTTP error envelope (§7 User-visible failures):
//! `{"error": string, "message"?: string, "taskId"?: string, "filePath"?: string}`.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use caf_packer_domain::PackerError;

#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Domain(#[from] PackerError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "taskId")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "filePath")]
    file_path: Option<String>,
}

impl FacadeError {
    pub fn with_context(self, task_id: Option<&str>, file_path: Option<&str>) -> ContextualError {
        ContextualError {
            inner: self,
            task_id: task_id.map(str::to_string),
            file_path: file_path.map(str::to_string),
        }
    }
}

/// Wraps a [`FacadeError`] with the `taskId`/`filePath` the request named,
/// so the error envelope can echo them back.
#[derive(Debug)]
pub struct ContextualError {
    inner: FacadeError,
    task_id: Option<String>,
    file_path: Option<String>,
}

impl std::fmt::Display for ContextualError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl ResponseError for ContextualError {
    fn status_code(&self) -> StatusCode {
        match &self.inner {
            FacadeError::Validation(_) => StatusCode::BAD_REQUEST,
            FacadeError::Domain(e) => StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message) = match &self.inner {
            // §8 scenario 4 asserts the exact validation message lands in `error`.
            FacadeError::Validation(msg) => (msg.clone(), None),
            FacadeError::Domain(PackerError::NotFound(msg)) => ("not_found".to_string(), Some(msg.clone())),
            FacadeError::Domain(e) => ("internal_error".to_string(), Some(e.to_string())),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            message,
            task_id: self.task_id.clone(),
            file_path: self.file_path.clone(),
        })
    }
}
