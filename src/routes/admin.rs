use actix_identity::Identity;
use actix_web::{get, web::Data, HttpResponse, Responder};
use serde_json::json;

use crate::{auth, db, errors::ApiError, models::Role, AppState};

#[get("/api/admin/users")]
pub async fn list_users(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    auth::require_role(&user, &[Role::Admin])?;

    let users = db::list_users(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

#[get("/api/admin/orders")]
pub async fn list_orders(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    auth::require_role(&user, &[Role::Admin])?;

    let orders = db::list_orders(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
