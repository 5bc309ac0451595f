//! # API REST
//!
//! REST API implementation for Fable.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, status mapping, CORS)
//!
//! Uses `api-shared` for DTOs and requester extraction, and `fable-core`
//! for the tale lifecycle itself. The server binary lives in the workspace
//! root crate and calls [`router`].

#![warn(rust_2018_idioms)]

pub mod error;

use axum::{
    extract::{Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::requester_from_headers;
use api_shared::{
    CreateTaleReq, DeleteTaleRes, GenerateTaleReq, GeneratedTaleBody, GeneratedTaleRes, HealthRes,
    HealthService, LikeRes, LikeStatusRes, TaleBody, TaleListRes, TaleRes, UpdateTaleReq,
};
use error::{ApiError, ApiResult};
use fable_core::{
    AgeRange, NarrativeClient, StoryPrompt, TaleError, TaleId, TaleService, Topic, UserId,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub tale_service: TaleService,
    /// Absent when no generator endpoint is configured; generation requests
    /// then fail with a `Generation` error while the CRUD surface stays up.
    pub narrator: Option<Arc<NarrativeClient>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        generate_tale,
        create_tale,
        list_user_tales,
        list_public_tales,
        get_tale,
        update_tale,
        delete_tale,
        toggle_like,
        like_status,
    ),
    components(schemas(
        HealthRes,
        CreateTaleReq,
        UpdateTaleReq,
        GenerateTaleReq,
        GeneratedTaleBody,
        GeneratedTaleRes,
        TaleBody,
        TaleRes,
        TaleListRes,
        DeleteTaleRes,
        LikeRes,
        LikeStatusRes,
        api_shared::ErrorRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router over the given state.
///
/// Static segments (`/tales/public`, `/tales/user`, `/tales/generate`) are
/// registered alongside `/tales/:id`; axum prefers the static match.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tales/generate", post(generate_tale))
        .route("/tales", post(create_tale))
        .route("/tales/user", get(list_user_tales))
        .route("/tales/public", get(list_public_tales))
        .route("/tales/:id", get(get_tale))
        .route("/tales/:id", patch(update_tale))
        .route("/tales/:id", delete(delete_tale))
        .route("/tales/:id/like", post(toggle_like))
        .route("/tales/:id/like", get(like_status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn require_requester(headers: &HeaderMap) -> ApiResult<UserId> {
    requester_from_headers(headers).ok_or(ApiError::Unauthorized)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/tales/generate",
    request_body = GenerateTaleReq,
    responses(
        (status = 200, description = "Story generated", body = GeneratedTaleRes),
        (status = 400, description = "Invalid age range or topic"),
        (status = 401, description = "Missing requester identity"),
        (status = 500, description = "Generation failed")
    )
)]
/// Generate a story from structured parameters.
///
/// The generated title and content are returned for the user to review and
/// save via `POST /tales`; nothing is persisted here.
#[axum::debug_handler]
async fn generate_tale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateTaleReq>,
) -> ApiResult<Json<GeneratedTaleRes>> {
    let _requester = require_requester(&headers)?;

    let age_range: AgeRange = req.age_range.parse()?;
    let topic: Topic = req.topic.parse()?;

    let narrator = state.narrator.as_ref().ok_or_else(|| {
        ApiError::Tale(TaleError::Generation(
            "no generator endpoint configured".into(),
        ))
    })?;

    let prompt = StoryPrompt {
        age_range,
        topic,
        main_character: req.main_character,
        setting: req.setting,
        additional_details: req.additional_details,
    };
    let generated = narrator.generate(&prompt).await?;

    Ok(Json(GeneratedTaleRes {
        success: true,
        tale: GeneratedTaleBody {
            title: generated.title,
            content: generated.content,
            age_range: age_range.as_str().into(),
            topic: topic.as_str().into(),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/tales",
    request_body = CreateTaleReq,
    responses(
        (status = 201, description = "Tale created", body = TaleRes),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing requester identity")
    )
)]
/// Save a new tale owned by the requester.
#[axum::debug_handler]
async fn create_tale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaleReq>,
) -> ApiResult<(StatusCode, Json<TaleRes>)> {
    let requester = require_requester(&headers)?;

    let tale = state.tale_service.create(requester, req.into())?;

    Ok((
        StatusCode::CREATED,
        Json(TaleRes {
            success: true,
            tale: TaleBody::from(&tale),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/tales/user",
    responses(
        (status = 200, description = "Requester's tales, newest first", body = TaleListRes),
        (status = 401, description = "Missing requester identity")
    )
)]
/// List the requester's own tales, newest first.
#[axum::debug_handler]
async fn list_user_tales(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TaleListRes>> {
    let requester = require_requester(&headers)?;

    let tales: Vec<TaleBody> = state
        .tale_service
        .list_for_author(&requester)
        .iter()
        .map(TaleBody::from)
        .collect();

    Ok(Json(TaleListRes {
        success: true,
        count: tales.len(),
        tales,
    }))
}

#[utoipa::path(
    get,
    path = "/tales/public",
    responses(
        (status = 200, description = "Public tales, newest first", body = TaleListRes)
    )
)]
/// List all public tales, newest first. No authentication required.
#[axum::debug_handler]
async fn list_public_tales(State(state): State<AppState>) -> Json<TaleListRes> {
    let tales: Vec<TaleBody> = state
        .tale_service
        .list_public()
        .iter()
        .map(TaleBody::from)
        .collect();

    Json(TaleListRes {
        success: true,
        count: tales.len(),
        tales,
    })
}

#[utoipa::path(
    get,
    path = "/tales/{id}",
    responses(
        (status = 200, description = "Tale retrieved", body = TaleRes),
        (status = 400, description = "Invalid tale id"),
        (status = 403, description = "Private tale, requester is not the author"),
        (status = 404, description = "No tale for id")
    )
)]
/// Fetch a single tale.
///
/// Identity is optional here: anonymous requesters can read public tales and
/// are rejected from private ones.
#[axum::debug_handler]
async fn get_tale(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<TaleRes>> {
    let requester = requester_from_headers(&headers);
    let id = TaleId::parse(&id)?;

    let tale = state.tale_service.get(&id, requester.as_ref())?;

    Ok(Json(TaleRes {
        success: true,
        tale: TaleBody::from(&tale),
    }))
}

#[utoipa::path(
    patch,
    path = "/tales/{id}",
    request_body = UpdateTaleReq,
    responses(
        (status = 200, description = "Tale updated", body = TaleRes),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing requester identity"),
        (status = 403, description = "Requester is not the author"),
        (status = 404, description = "No tale for id")
    )
)]
/// Update fields of a tale. Author only.
#[axum::debug_handler]
async fn update_tale(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateTaleReq>,
) -> ApiResult<Json<TaleRes>> {
    let requester = require_requester(&headers)?;
    let id = TaleId::parse(&id)?;

    let tale = state.tale_service.update(&id, &requester, req.into())?;

    Ok(Json(TaleRes {
        success: true,
        tale: TaleBody::from(&tale),
    }))
}

#[utoipa::path(
    delete,
    path = "/tales/{id}",
    responses(
        (status = 200, description = "Tale deleted", body = DeleteTaleRes),
        (status = 401, description = "Missing requester identity"),
        (status = 403, description = "Requester is not the author"),
        (status = 404, description = "No tale for id")
    )
)]
/// Delete a tale permanently. Author only.
#[axum::debug_handler]
async fn delete_tale(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<DeleteTaleRes>> {
    let requester = require_requester(&headers)?;
    let id = TaleId::parse(&id)?;

    state.tale_service.delete(&id, &requester)?;

    Ok(Json(DeleteTaleRes {
        success: true,
        message: "Tale deleted".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/tales/{id}/like",
    responses(
        (status = 200, description = "Like toggled", body = LikeRes),
        (status = 401, description = "Missing requester identity"),
        (status = 403, description = "Tale is private"),
        (status = 404, description = "No tale for id")
    )
)]
/// Toggle the requester's like on a tale.
///
/// One endpoint, not separate like/unlike: a second call by the same user
/// undoes the first.
#[axum::debug_handler]
async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<LikeRes>> {
    let requester = require_requester(&headers)?;
    let id = TaleId::parse(&id)?;

    let outcome = state.tale_service.toggle_like(&id, &requester)?;

    Ok(Json(LikeRes {
        success: true,
        liked: outcome.liked,
        likes: outcome.likes,
    }))
}

#[utoipa::path(
    get,
    path = "/tales/{id}/like",
    responses(
        (status = 200, description = "Like status", body = LikeStatusRes),
        (status = 401, description = "Missing requester identity"),
        (status = 403, description = "Tale is private"),
        (status = 404, description = "No tale for id")
    )
)]
/// Whether the requester currently likes a tale.
#[axum::debug_handler]
async fn like_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<LikeStatusRes>> {
    let requester = require_requester(&headers)?;
    let id = TaleId::parse(&id)?;

    let liked = state.tale_service.like_status(&id, &requester)?;

    Ok(Json(LikeStatusRes {
        success: true,
        liked,
    }))
}
