use actix_identity::Identity;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth, db, errors::ApiError, models::Role, AppState};

const SEARCH_LIMIT: i64 = 20;

#[derive(Deserialize)]
pub struct FeedbackPayload {
    #[serde(default)]
    message: String,
    #[serde(default)]
    rating: serde_json::Value,
}

/// Feedback may be submitted anonymously; the principal is attached when
/// there is one.
#[post("/api/feedback")]
pub async fn submit(
    payload: web::Json<FeedbackPayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::maybe_user(&state, identity).await?;
    let payload = payload.into_inner();

    let message = payload.message.trim().to_owned();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".to_owned()));
    }

    let rating = match payload.rating {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(
            s.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::Validation("Invalid rating".to_owned()))?,
        ),
        _ => return Err(ApiError::Validation("Invalid rating".to_owned())),
    };

    db::create_feedback(&state, user.map(|u| u.id), message, rating).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Thank you for your feedback!" })))
}

#[get("/api/feedback")]
pub async fn list(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    auth::require_role(&user, &[Role::Admin])?;

    let entries = db::list_feedback(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "feedback": entries })))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Combined search: notes scoped to the principal, products unscoped, both
/// capped at 20 matches. An empty term matches everything up to the limit.
#[get("/api/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let term = query.q.trim();

    let notes = db::list_notes(&state, user.id, Some(term), Some(SEARCH_LIMIT)).await?;
    let products = db::search_products(&state, term, SEARCH_LIMIT).await?;
    Ok(HttpResponse::Ok().json(json!({ "notes": notes, "products": products })))
}
