// /////////////////////////////////////////////////////////////////////////////
// CAF Packer
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! HTTP route handlers for the retrieval façade (§4.G).

use std::sync::Arc;

use actix_web::http::header::{self, HeaderValue};
use actix_web::web::{self, Data, Path, ServiceConfig};
use actix_web::HttpResponse;
use serde::Serialize;

use caf_packer_domain::repositories::CatalogRepository;
use caf_packer_domain::services::{CafReader, RemoteBlobAdapter};
use caf_packer_domain::PackerError;

use super::container_cache::ContainerCache;
use super::errors::FacadeError;
use super::proof_cache::ProofCache;
use super::validation::{validate_file_path, validate_task_id};

/// A fixed allow-list of origins echoed back when matched (§4.G CORS).
pub const ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:8080"];

pub struct AppState {
    pub worker_id: i64,
    pub catalog: Arc<dyn CatalogRepository>,
    pub remote_blob: Arc<dyn RemoteBlobAdapter>,
    pub container_cache: ContainerCache,
    pub proof_cache: ProofCache,
}

type AppResult<T> = Result<T, super::errors::ContextualError>;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    #[serde(rename = "workerId")]
    worker_id: i64,
    timestamp: String,
}

async fn health(state: Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthBody {
        status: "ok",
        worker_id: state.worker_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(serde::Deserialize)]
struct TaskFilePath {
    task_id: String,
    file_path: String,
}

fn validated(path: &TaskFilePath) -> Result<(), FacadeError> {
    validate_task_id(&path.task_id)?;
    validate_file_path(&path.file_path)?;
    Ok(())
}

async fn get_file(state: Data<AppState>, path: Path<TaskFilePath>) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    validated(&path).map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?;

    let record = state
        .catalog
        .lookup(&path.task_id, &path.file_path)
        .await
        .map_err(FacadeError::Domain)
        .map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?
        .ok_or_else(|| {
            FacadeError::Domain(PackerError::not_found(format!(
                "no catalog record for {}/{}",
                path.task_id, path.file_path
            )))
            .with_context(Some(&path.task_id), Some(&path.file_path))
        })?;

    let member_path = format!("{}/{}", path.task_id, path.file_path);

    let result: Result<Vec<u8>, FacadeError> = async {
        let reader = state.container_cache.resolve(&record.bundle_id).await?;
        let bytes = reader.extract(&member_path).await.map_err(|_| {
            PackerError::internal_error(format!(
                "catalog asserted member '{member_path}' present in {} but extraction failed",
                record.bundle_id
            ))
        })?;
        Ok(bytes)
    }
    .await;

    let bytes = result.map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?;

    state.container_cache.cleanup_after_serve(&record.bundle_id).await;

    let filename = path
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(path.file_path.as_str())
        .to_string();

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .append_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes))
}

#[derive(Serialize)]
struct FileInfoBody {
    #[serde(rename = "filePath")]
    file_path: String,
    #[serde(rename = "taskId")]
    task_id: String,
    #[serde(rename = "bundleId")]
    bundle_id: String,
    #[serde(rename = "jsWorkerId")]
    js_worker_id: String,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "updatedAt")]
    updated_at: String,
}

async fn get_file_info(state: Data<AppState>, path: Path<TaskFilePath>) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    validated(&path).map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?;

    let record = state
        .catalog
        .lookup(&path.task_id, &path.file_path)
        .await
        .map_err(FacadeError::Domain)
        .map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?
        .ok_or_else(|| {
            FacadeError::Domain(PackerError::not_found(format!(
                "no catalog record for {}/{}",
                path.task_id, path.file_path
            )))
            .with_context(Some(&path.task_id), Some(&path.file_path))
        })?;

    Ok(HttpResponse::Ok().json(FileInfoBody {
        file_path: record.file_path,
        task_id: record.task_id,
        bundle_id: record.bundle_id,
        js_worker_id: record.js_worker_id,
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
    }))
}

#[derive(Serialize)]
struct ProofsBody {
    proofs: Vec<caf_packer_domain::services::MembershipProof>,
}

async fn get_file_proof(state: Data<AppState>, path: Path<TaskFilePath>) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    validated(&path).map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?;

    let record = state
        .catalog
        .lookup(&path.task_id, &path.file_path)
        .await
        .map_err(FacadeError::Domain)
        .map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?
        .ok_or_else(|| {
            FacadeError::Domain(PackerError::not_found(format!(
                "no catalog record for {}/{}",
                path.task_id, path.file_path
            )))
            .with_context(Some(&path.task_id), Some(&path.file_path))
        })?;

    if let Some(cached) = state.proof_cache.get(&record.bundle_id, &path.file_path, &path.task_id) {
        return Ok(HttpResponse::Ok().json(ProofsBody { proofs: cached }));
    }

    let member_path = format!("{}/{}", path.task_id, path.file_path);
    let proofs = state
        .remote_blob
        .get_proofs(&record.bundle_id, std::slice::from_ref(&member_path))
        .await
        .map_err(FacadeError::Domain)
        .map_err(|e| e.with_context(Some(&path.task_id), Some(&path.file_path)))?;

    state
        .proof_cache
        .put(&record.bundle_id, &path.file_path, &path.task_id, proofs.clone());

    Ok(HttpResponse::Ok().json(ProofsBody { proofs }))
}

/// Applies the fixed CORS allow-list to every response, and short-circuits
/// `OPTIONS` preflight requests (§4.G CORS).
pub async fn cors_middleware(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<actix_web::body::BoxBody>,
) -> Result<actix_web::dev::ServiceResponse<actix_web::body::BoxBody>, actix_web::Error> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let allowed_origin = origin.filter(|o| ALLOWED_ORIGINS.contains(&o.as_str()));

    if req.method() == actix_web::http::Method::OPTIONS {
        let mut res = HttpResponse::Ok();
        apply_cors_headers(&mut res, allowed_origin.as_deref());
        res.append_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"));
        res.append_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"));
        return Ok(req.into_response(res.finish()));
    }

    let mut res = next.call(req).await?;
    if let Some(origin) = allowed_origin {
        res.response_mut().headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_str(&origin).unwrap(),
        );
        res.response_mut().headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    } else {
        res.response_mut().headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("null"),
        );
    }
    Ok(res)
}

fn apply_cors_headers(res: &mut actix_web::HttpResponseBuilder, allowed_origin: Option<&str>) {
    match allowed_origin {
        Some(origin) => {
            res.append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin));
            res.append_header((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"));
        }
        None => {
            res.append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "null"));
        }
    }
}

pub fn config(cfg: &mut ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/file/{task_id}/{file_path:.*}", web::get().to(get_file))
        .route("/file-info/{task_id}/{file_path:.*}", web::get().to(get_file_info))
        .route("/file-proof/{task_id}/{file_path:.*}", web::get().to(get_file_proof));
}
