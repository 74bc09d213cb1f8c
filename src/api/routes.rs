use actix_web::{delete, get, post, put, web, HttpResponse, Result as WebResult};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::api::middleware::OwnerId;
use crate::api::models::{AttachQuery, SendMessageRequest, SetLevelRequest, SetTopicStatusRequest};
use crate::orchestrator::{OrchestratorError, SessionOrchestrator};

fn error_response(e: OrchestratorError) -> HttpResponse {
    match e {
        OrchestratorError::NotFound => HttpResponse::NotFound().body("Session not found"),
        OrchestratorError::InvalidArgument(msg) => HttpResponse::BadRequest().body(msg),
        OrchestratorError::Upstream(e) => {
            HttpResponse::BadGateway().body(format!("Reasoning service error: {}", e))
        }
        OrchestratorError::Persistence(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

// --- Sessions ---

#[post("")]
pub async fn create_session(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
) -> WebResult<HttpResponse> {
    match orchestrator.create_session(&owner.0) {
        Ok(session) => Ok(HttpResponse::Created().json(session)),
        Err(e) => Ok(error_response(e)),
    }
}

#[get("")]
pub async fn list_sessions(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
) -> WebResult<HttpResponse> {
    match orchestrator.list_sessions(&owner.0) {
        Ok(sessions) => Ok(HttpResponse::Ok().json(sessions)),
        Err(e) => Ok(error_response(e)),
    }
}

#[get("/{id}")]
pub async fn get_session(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
) -> WebResult<HttpResponse> {
    match orchestrator.get_session(&owner.0, id.into_inner()) {
        Ok(session) => Ok(HttpResponse::Ok().json(session)),
        Err(e) => Ok(error_response(e)),
    }
}

#[delete("/{id}")]
pub async fn delete_session(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
) -> WebResult<HttpResponse> {
    match orchestrator.delete_session(&owner.0, id.into_inner()) {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(error_response(e)),
    }
}

// --- Documents ---

#[post("/documents")]
pub async fn attach_document(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    query: web::Query<AttachQuery>,
    mut payload: web::Payload,
) -> WebResult<HttpResponse> {
    // Spool the upload through a temp file that is removed on every
    // exit path when it drops. Chunks are written through tokio so the
    // worker thread never blocks on disk.
    let spool = match tempfile::NamedTempFile::new() {
        Ok(file) => file,
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };
    let mut sink = match spool.reopen() {
        Ok(file) => tokio::fs::File::from_std(file),
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if let Err(e) = sink.write_all(&chunk).await {
            return Ok(HttpResponse::InternalServerError().body(e.to_string()));
        }
    }
    if let Err(e) = sink.flush().await {
        return Ok(HttpResponse::InternalServerError().body(e.to_string()));
    }

    let query = query.into_inner();
    match orchestrator
        .attach_document(&owner.0, query.session_id, &query.filename, spool.path())
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Created().json(outcome)),
        Err(e) => Ok(error_response(e)),
    }
}

// --- Conversation ---

#[post("/{id}/messages")]
pub async fn send_message(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> WebResult<HttpResponse> {
    match orchestrator
        .send_message(&owner.0, id.into_inner(), &req.content)
        .await
    {
        Ok(turn) => Ok(HttpResponse::Created().json(turn)),
        Err(e) => Ok(error_response(e)),
    }
}

// --- Study plan ---

#[post("/{id}/plan")]
pub async fn generate_plan(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
) -> WebResult<HttpResponse> {
    match orchestrator.generate_plan(&owner.0, id.into_inner()).await {
        Ok(session) => Ok(HttpResponse::Ok().json(session)),
        Err(e) => Ok(error_response(e)),
    }
}

#[put("/{id}/plan/{index}")]
pub async fn set_topic_status(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    path: web::Path<(Uuid, usize)>,
    req: web::Json<SetTopicStatusRequest>,
) -> WebResult<HttpResponse> {
    let (id, index) = path.into_inner();
    match orchestrator
        .set_topic_status(&owner.0, id, index, &req.status)
        .await
    {
        Ok(session) => Ok(HttpResponse::Ok().json(session)),
        Err(e) => Ok(error_response(e)),
    }
}

#[put("/{id}/level")]
pub async fn set_level(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
    req: web::Json<SetLevelRequest>,
) -> WebResult<HttpResponse> {
    match orchestrator
        .set_level(&owner.0, id.into_inner(), &req.level)
        .await
    {
        Ok(session) => Ok(HttpResponse::Ok().json(session)),
        Err(e) => Ok(error_response(e)),
    }
}

// --- Export ---

#[get("/{id}/export")]
pub async fn export_session(
    orchestrator: web::Data<SessionOrchestrator>,
    owner: OwnerId,
    id: web::Path<Uuid>,
) -> WebResult<HttpResponse> {
    let id = id.into_inner();
    let session = match orchestrator.get_session(&owner.0, id) {
        Ok(session) => session,
        Err(e) => return Ok(error_response(e)),
    };

    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"session_{}.txt\"", id),
        ))
        .body(session.export_text()))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .service(attach_document)
            .service(create_session)
            .service(list_sessions)
            .service(get_session)
            .service(delete_session)
            .service(send_message)
            .service(generate_plan)
            .service(set_topic_status)
            .service(set_level)
            .service(export_session),
    );
}
