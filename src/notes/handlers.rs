use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{Json, Path},
    notes::repo_types::NoteDraft,
    state::AppState,
};

use super::dto::{NoteMessage, NoteRequest, NoteResponse};

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
}

#[instrument(skip(state))]
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = state.notes.list_notes().await?;
    if notes.is_empty() {
        return Err(ApiError::NoteNotFound);
    }
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

#[instrument(skip(state, body))]
pub async fn create_note(
    State(state): State<AppState>,
    Json(body): Json<NoteRequest>,
) -> Result<(StatusCode, Json<NoteMessage>), ApiError> {
    let draft = NoteDraft::try_from(body)?;
    let note = state.notes.create_note(draft).await?;
    info!(note_id = %note.id, "note created");
    Ok((StatusCode::CREATED, Json(NoteMessage { message: "Note added" })))
}

#[instrument(skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state
        .notes
        .find_note(id)
        .await?
        .ok_or(ApiError::NoteNotFound)?;
    Ok(Json(note.into()))
}

#[instrument(skip(state, body))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NoteRequest>,
) -> Result<Json<NoteMessage>, ApiError> {
    let draft = NoteDraft::try_from(body)?;
    state
        .notes
        .update_note(id, draft)
        .await?
        .ok_or(ApiError::NoteNotFound)?;
    Ok(Json(NoteMessage { message: "Note updated" }))
}

#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteMessage>, ApiError> {
    if !state.notes.delete_note(id).await? {
        return Err(ApiError::NoteNotFound);
    }
    info!(note_id = %id, "note deleted");
    Ok(Json(NoteMessage { message: "Note deleted" }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, notify::LogNotifier, state::AppState};

    fn app() -> Router {
        build_app(AppState::fake(Arc::new(LogNotifier)))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn empty_collection_is_not_found() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/notes", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "note_not_found");
    }

    #[tokio::test]
    async fn note_lifecycle() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/notes",
            Some(json!({"title": "groceries", "content": "milk"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Note added");

        let (status, list) = call(&app, Method::GET, "/api/notes", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = list[0]["id"].as_str().unwrap().to_string();
        assert_eq!(list[0]["title"], "groceries");

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/notes/{id}"),
            Some(json!({"title": "groceries", "content": "milk, eggs"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, note) = call(&app, Method::GET, &format!("/api/notes/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(note["content"], "milk, eggs");

        let (status, _) = call(&app, Method::DELETE, &format!("/api/notes/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, &format!("/api/notes/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_requires_title_and_content() {
        let app = app();
        let (status, body) =
            call(&app, Method::POST, "/api/notes", Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn update_missing_note_is_not_found() {
        let app = app();
        let uri = format!("/api/notes/{}", uuid::Uuid::new_v4());
        let (status, _) = call(&app, Method::PUT, &uri, Some(json!({"title": "t", "content": "c"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_validation_error() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/notes/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }
}
