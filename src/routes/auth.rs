use std::collections::BTreeMap;

use actix_identity::Identity;
use actix_session::Session;
use actix_web::{
    get, post, put,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth, cart::SessionCart, db, errors::ApiError, models::Role, AppState};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
}

#[post("/api/auth/register")]
pub async fn register(
    payload: web::Json<RegisterPayload>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, ApiError> {
    let payload = payload.into_inner();
    let email = payload.email.trim().to_lowercase();

    // Validation problems accumulate so the client sees them all at once.
    let mut errors: BTreeMap<String, String> = BTreeMap::new();
    if !auth::is_valid_email(&email) {
        errors.insert("email".to_owned(), "Invalid email address".to_owned());
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        errors.insert(
            "password".to_owned(),
            "Password must be at least 8 characters long".to_owned(),
        );
    }
    if db::get_user_by_email(&state, &email).await?.is_some() {
        errors.insert(
            "email".to_owned(),
            "A user with this email already exists".to_owned(),
        );
    }
    if !errors.is_empty() {
        return Err(ApiError::Fields(errors));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = db::create_user(
        &state,
        db::NewUser {
            email,
            password_hash,
            name: payload.name,
            phone: payload.phone,
            role: Role::User,
        },
    )
    .await?;

    Identity::login(&request.extensions(), user.id.to_string())
        .map_err(|e| ApiError::Session(e.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Registration successful", "user": user })))
}

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[post("/api/auth/login")]
pub async fn login(
    payload: web::Json<LoginPayload>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, ApiError> {
    let email = payload.email.trim().to_lowercase();

    // Missing user and bad password produce the same generic error.
    let user = db::get_user_by_email(&state, &email)
        .await?
        .ok_or(ApiError::Auth)?;
    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Auth);
    }

    Identity::login(&request.extensions(), user.id.to_string())
        .map_err(|e| ApiError::Session(e.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged in", "user": user })))
}

#[post("/api/auth/logout")]
pub async fn logout(user: Identity, session: Session) -> impl Responder {
    SessionCart::new(session).clear();
    user.logout();
    HttpResponse::Ok().json(json!({ "message": "Logged out" }))
}

#[get("/api/auth/me")]
pub async fn me(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

#[derive(Deserialize)]
pub struct ProfilePayload {
    name: Option<String>,
    phone: Option<String>,
}

#[put("/api/auth/profile")]
pub async fn update_profile(
    payload: web::Json<ProfilePayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let payload = payload.into_inner();
    let user = db::update_profile(&state, user.id, payload.name, payload.phone).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Profile updated", "user": user })))
}

#[derive(Deserialize)]
pub struct PreferencesPayload {
    #[serde(default)]
    preferences: serde_json::Value,
}

#[put("/api/auth/preferences")]
pub async fn update_preferences(
    payload: web::Json<PreferencesPayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;

    // Strings are stored verbatim, anything else is re-serialized. No schema
    // is imposed on the stored value.
    let stored = match payload.into_inner().preferences {
        serde_json::Value::String(raw) => raw,
        serde_json::Value::Null => "{}".to_owned(),
        value => value.to_string(),
    };
    db::update_preferences(&state, user.id, stored).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Preferences saved" })))
}

#[derive(Deserialize)]
pub struct ChangePasswordPayload {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

#[put("/api/auth/password")]
pub async fn change_password(
    payload: web::Json<ChangePasswordPayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;

    if !auth::verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::Validation("Current password is incorrect".to_owned()));
    }
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("New password is too short".to_owned()));
    }

    let password_hash = auth::hash_password(&payload.new_password)?;
    db::update_password(&state, user.id, password_hash).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}
