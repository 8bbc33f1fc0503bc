#[macro_use]
extern crate lazy_static;

use std::{env, str::FromStr};

use actix_files::{Files, NamedFile};
use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::Key,
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};
use tera::Tera;

mod auth;
mod cart;
mod db;
mod errors;
mod models;
mod routes;
mod seed;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

fn get_session_key() -> Key {
    match env::var("SESSION_KEY") {
        Ok(key_str) => Key::try_from(key_str.as_bytes()).unwrap_or_else(|e| {
            log::error!("FATAL: SESSION_KEY is not usable as a session key: {}", e);
            std::process::exit(1);
        }),
        Err(_) => {
            log::warn!("SESSION_KEY not set; sessions will not survive a restart");
            Key::generate()
        }
    }
}

/// JSON API surface; shared between the server and the test harness.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::auth::register)
        .service(routes::auth::login)
        .service(routes::auth::logout)
        .service(routes::auth::me)
        .service(routes::auth::update_profile)
        .service(routes::auth::update_preferences)
        .service(routes::auth::change_password)
        .service(routes::notes::list)
        .service(routes::notes::create)
        .service(routes::notes::update)
        .service(routes::notes::delete)
        .service(routes::feedback::submit)
        .service(routes::feedback::list)
        .service(routes::feedback::search)
        .service(routes::shop::list_products)
        .service(routes::shop::add_cart_item)
        .service(routes::shop::get_cart)
        .service(routes::shop::remove_cart_item)
        .service(routes::shop::clear_cart)
        .service(routes::shop::checkout)
        .service(routes::admin::list_users)
        .service(routes::admin::list_orders)
        .service(routes::pages::health);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://notecart.db".to_owned());

    let opts = SqliteConnectOptions::from_str(&database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Database migrated successfully");

    if env::args().nth(1).as_deref() == Some("seed") {
        seed::run(&AppState {
            db_pool: db_pool.clone(),
        })
        .await?;
        return Ok(());
    }

    info!("Starting HTTP server on http://localhost:8080/");

    // resolved once so every worker shares the same key
    let session_key = get_session_key();

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                session_key.clone(),
            ))
            // always register the Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(configure_api)
            .service(routes::pages::landing)
            .service(routes::pages::dashboard)
            .service(routes::pages::shop)
            .service(routes::pages::admin)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
            }))
            .default_service(web::to(default_handler))
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
