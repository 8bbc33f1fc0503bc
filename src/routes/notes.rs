use actix_identity::Identity;
use actix_web::{
    delete, get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth, db, errors::ApiError, AppState};

#[derive(Deserialize)]
pub struct NotesQuery {
    q: Option<String>,
}

#[get("/api/notes")]
pub async fn list(
    query: web::Query<NotesQuery>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let notes = db::list_notes(&state, user.id, query.q.as_deref(), None).await?;
    Ok(HttpResponse::Ok().json(json!({ "notes": notes })))
}

#[derive(Deserialize)]
pub struct CreateNotePayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    tags: Option<String>,
}

#[post("/api/notes")]
pub async fn create(
    payload: web::Json<CreateNotePayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let payload = payload.into_inner();
    let title = payload.title.trim().to_owned();
    let content = payload.content.trim().to_owned();

    if title.is_empty() || content.is_empty() {
        return Err(ApiError::Validation(
            "Title and content are required".to_owned(),
        ));
    }

    let note = db::create_note(&state, user.id, title, content, payload.tags).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Note created", "note": note })))
}

#[derive(Deserialize)]
pub struct UpdateNotePayload {
    title: Option<String>,
    content: Option<String>,
    tags: Option<String>,
}

#[put("/api/notes/{note_id}")]
pub async fn update(
    path: web::Path<i64>,
    payload: web::Json<UpdateNotePayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let note = db::get_note(&state, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    if !auth::owns_or_admin(&user, note.user_id) {
        return Err(ApiError::Forbidden);
    }

    let payload = payload.into_inner();
    let note = db::update_note(
        &state,
        note.id,
        db::NoteChanges {
            title: payload.title,
            content: payload.content,
            tags: payload.tags,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Note updated", "note": note })))
}

#[delete("/api/notes/{note_id}")]
pub async fn delete(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let note = db::get_note(&state, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    if !auth::owns_or_admin(&user, note.user_id) {
        return Err(ApiError::Forbidden);
    }

    db::delete_note(&state, note.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Note deleted" })))
}
