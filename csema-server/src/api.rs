// HTTP API endpoint handlers

use std::path::PathBuf;

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::compiler;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub initialized: bool,
    pub generation: u64,
    pub file_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

pub async fn get_status(state: web::Data<SharedState>) -> impl Responder {
    let state = state.read().await;
    HttpResponse::Ok().json(StatusResponse {
        initialized: state.initialized,
        generation: state.generation,
        file_count: state.files.len(),
        error_count: state.error_count(),
        warning_count: state.warning_count(),
    })
}

#[derive(Serialize)]
pub struct DiagnosticInfo {
    pub severity: String,
    pub code: Option<String>,
    pub message: String,
    pub span_start: u32,
    pub span_end: u32,
}

impl From<&csema_core::Diagnostic> for DiagnosticInfo {
    fn from(d: &csema_core::Diagnostic) -> Self {
        Self {
            severity: d.severity.as_str().to_string(),
            code: d.code.clone(),
            message: d.message.clone(),
            span_start: d.span.start,
            span_end: d.span.end,
        }
    }
}

#[derive(Serialize)]
pub struct FileDiagnostics {
    pub path: String,
    pub diagnostics: Vec<DiagnosticInfo>,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Serialize)]
pub struct DiagnosticsResponse {
    pub files: Vec<FileDiagnostics>,
}

pub async fn get_all_diagnostics(state: web::Data<SharedState>) -> impl Responder {
    let state = state.read().await;
    let files = state
        .files
        .iter()
        .map(|(path, entry)| FileDiagnostics {
            path: path.display().to_string(),
            diagnostics: entry.diagnostics.iter().map(DiagnosticInfo::from).collect(),
            error_count: entry.diagnostics.error_count(),
            warning_count: entry.diagnostics.warning_count(),
        })
        .collect();
    HttpResponse::Ok().json(DiagnosticsResponse { files })
}

pub async fn get_file_diagnostics(
    state: web::Data<SharedState>,
    path: web::Path<String>,
) -> impl Responder {
    let state = state.read().await;
    let requested = PathBuf::from(path.into_inner());
    match state.files.get(&requested) {
        Some(entry) => HttpResponse::Ok().json(FileDiagnostics {
            path: requested.display().to_string(),
            diagnostics: entry.diagnostics.iter().map(DiagnosticInfo::from).collect(),
            error_count: entry.diagnostics.error_count(),
            warning_count: entry.diagnostics.warning_count(),
        }),
        None => HttpResponse::NotFound().body("file not analysed"),
    }
}

#[derive(Serialize)]
pub struct AstResponse {
    pub path: String,
    pub ast: serde_json::Value,
}

pub async fn get_file_ast(state: web::Data<SharedState>, path: web::Path<String>) -> impl Responder {
    let state = state.read().await;
    let requested = PathBuf::from(path.into_inner());
    match state.files.get(&requested) {
        Some(entry) => match serde_json::to_value(&entry.file) {
            Ok(ast) => HttpResponse::Ok().json(AstResponse {
                path: requested.display().to_string(),
                ast,
            }),
            Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
        },
        None => HttpResponse::NotFound().body("file not analysed"),
    }
}

#[derive(Deserialize)]
pub struct NotifyRequest {
    pub path: String,
}

#[derive(Serialize)]
pub struct NotifyResponse {
    pub success: bool,
    pub duration_ms: u64,
    pub error_count: usize,
}

pub async fn post_notify(
    state: web::Data<SharedState>,
    body: web::Json<NotifyRequest>,
) -> impl Responder {
    let path = PathBuf::from(&body.path);
    let result = {
        let mut state = state.write().await;
        compiler::handle_file_change(&mut state, &path)
    };
    HttpResponse::Ok().json(NotifyResponse {
        success: true,
        duration_ms: result.duration.as_millis() as u64,
        error_count: result.error_count,
    })
}
