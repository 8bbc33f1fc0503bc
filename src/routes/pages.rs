use actix_identity::Identity;
use actix_web::{get, web::Data, HttpResponse, Responder};
use serde_json::json;
use tera::Context;

use crate::{auth, errors::ApiError, models::User, AppState, TEMPLATES};

/// Templates only learn whether someone is logged in and which role they
/// hold; no business data crosses this boundary.
fn render_page(template: &str, title: &str, user: Option<&User>) -> Result<HttpResponse, ApiError> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("authenticated", &user.is_some());
    context.insert(
        "role",
        match user {
            Some(user) => user.role.as_str(),
            None => "anonymous",
        },
    );
    context.insert("version", env!("CARGO_PKG_VERSION"));

    let rendered = TEMPLATES.render(template, &context).map_err(|e| {
        log::error!("Failed to render template: {}", e);
        ApiError::Template(e)
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

fn redirect_home() -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", "/"))
        .finish()
}

#[get("/")]
pub async fn landing(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    let user = auth::maybe_user(&state, identity).await?;
    match user {
        Some(user) => render_page("dashboard.html", "Dashboard", Some(&user)),
        None => render_page("index.html", "Welcome", None),
    }
}

#[get("/dashboard")]
pub async fn dashboard(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    match auth::maybe_user(&state, identity).await? {
        Some(user) => render_page("dashboard.html", "Dashboard", Some(&user)),
        None => Ok(redirect_home()),
    }
}

#[get("/shop")]
pub async fn shop(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    match auth::maybe_user(&state, identity).await? {
        Some(user) => render_page("shop.html", "Shop", Some(&user)),
        None => Ok(redirect_home()),
    }
}

#[get("/admin")]
pub async fn admin(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, ApiError> {
    match auth::maybe_user(&state, identity).await? {
        Some(user) if user.is_admin() => render_page("admin.html", "Admin", Some(&user)),
        Some(_) => Err(ApiError::Forbidden),
        None => Ok(redirect_home()),
    }
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
