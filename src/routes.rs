use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_web_lab::middleware::from_fn;
use database::{consts::consts::Email, model::participant::ParticipantUpdate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    auth::require_admin,
    error::{ApiError, EMAIL_NOT_PROVIDED, NOT_FOUND_OR_DELETED, PARTICIPANT_NOT_FOUND},
    state::AppState,
    validation::into_participant,
};

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Serialize)]
struct MessageWithParticipant<T> {
    message: &'static str,
    participant: T,
}

#[derive(Serialize)]
struct Participants<T> {
    participants: Vec<T>,
}

#[derive(Serialize)]
struct SingleParticipant<T> {
    participant: T,
}

/// Registers every route, the participants scope behind the admin gate
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(health)
    .service(
        web::scope("/participants")
            .wrap(from_fn(require_admin))
            .route("", web::get().to(list_participants))
            .route("/", web::get().to(list_participants))
            .route("/", web::delete().to(missing_email))
            .route("/add", web::post().to(add_participant))
            .route("/details", web::get().to(list_active_details))
            .route("/details/deleted", web::get().to(list_deleted_details))
            .route("/details/work/{email}", web::get().to(get_participant_work))
            .route("/details/home/{email}", web::get().to(get_participant_home))
            .route("/details/{email}", web::get().to(get_participant))
            .route("/{email}", web::delete().to(delete_participant))
            .route("/{email}", web::put().to(update_participant)),
    )
    .default_service(web::to(unknown_route));
}

/// Liveness check, unauthenticated
#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn unknown_route(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    log::debug!("No route for {} {}", req.method(), req.path());

    Err(ApiError::UnknownRoute)
}

async fn add_participant(
    state: web::Data<AppState>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let participant = into_participant(body.into_inner())?;

    state.repository.add(&participant).await?;

    log::info!("Added participant {}", participant.email().unwrap_or_default());

    Ok(HttpResponse::Ok().json(Message {
        message: "Participant added successfully",
    }))
}

/// Every stored record, soft deleted ones included
async fn list_participants(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let participants = state.repository.list_all().await?;

    Ok(HttpResponse::Ok().json(Participants { participants }))
}

async fn list_active_details(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let participants = state.repository.list_details(true).await?;

    Ok(HttpResponse::Ok().json(Participants { participants }))
}

async fn list_deleted_details(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let participants = state.repository.list_details(false).await?;

    Ok(HttpResponse::Ok().json(Participants { participants }))
}

/// Responds with a one element array, the shape of a key query
async fn get_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let email = Email::from(path.into_inner());

    let participant = state.repository.find_active(&email).await?;

    if participant.is_empty() {
        return Err(ApiError::NotFound(NOT_FOUND_OR_DELETED));
    }

    Ok(HttpResponse::Ok().json(SingleParticipant { participant }))
}

async fn get_participant_work(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let email = Email::from(path.into_inner());

    let participant = state
        .repository
        .find_active_work(&email)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND_OR_DELETED))?;

    Ok(HttpResponse::Ok().json(SingleParticipant { participant }))
}

async fn get_participant_home(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let email = Email::from(path.into_inner());

    let participant = state
        .repository
        .find_active_home(&email)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND_OR_DELETED))?;

    Ok(HttpResponse::Ok().json(SingleParticipant { participant }))
}

async fn missing_email() -> Result<HttpResponse, ApiError> {
    Err(ApiError::BadRequest(EMAIL_NOT_PROVIDED.to_string()))
}

/// Soft delete: only `active` flips to false, the record stays readable through the deleted
/// listing and `GET /participants`
async fn delete_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let email = path.into_inner();

    if email.is_empty() {
        return Err(ApiError::BadRequest(EMAIL_NOT_PROVIDED.to_string()));
    }

    let email = Email::from(email);

    let participant = state
        .repository
        .soft_delete(&email)
        .await?
        .ok_or(ApiError::NotFound(PARTICIPANT_NOT_FOUND))?;

    log::info!("Soft deleted participant {}", email);

    Ok(HttpResponse::Ok().json(MessageWithParticipant {
        message: "Deleted successfully",
        participant,
    }))
}

/// Replaces every attribute but the email with the body's values as sent. The email in the body
/// is validated and ignored, the path decides which record changes.
async fn update_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let email = Email::from(path.into_inner());
    let update = into_participant(body.into_inner())?;

    let updated = state
        .repository
        .update(&email, ParticipantUpdate::from(&update))
        .await?
        .ok_or(ApiError::NotFound(PARTICIPANT_NOT_FOUND))?;

    log::info!("Updated participant {}", email);

    Ok(HttpResponse::Ok().json(MessageWithParticipant {
        message: "Participant updated successfully",
        participant: updated,
    }))
}
