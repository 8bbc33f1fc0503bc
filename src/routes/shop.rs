use actix_identity::Identity;
use actix_session::Session;
use actix_web::{
    delete, get, post,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth, cart::SessionCart, db, errors::ApiError, models::CartItemView, AppState};

#[derive(Deserialize)]
pub struct ProductQuery {
    category: Option<String>,
    q: Option<String>,
    max_price: Option<String>,
}

#[get("/api/products")]
pub async fn list_products(
    query: web::Query<ProductQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let query = query.into_inner();
    let products = db::list_products(
        &state,
        db::ProductFilters {
            category: query.category,
            term: query.q,
            // an unparsable max_price skips the filter rather than erroring
            max_price: query.max_price.and_then(|raw| raw.parse::<f64>().ok()),
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

fn default_quantity() -> i64 {
    1
}

#[derive(Deserialize)]
pub struct AddCartPayload {
    product_id: i64,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

#[post("/api/cart")]
pub async fn add_cart_item(
    payload: web::Json<AddCartPayload>,
    state: Data<AppState>,
    identity: Option<Identity>,
    session: Session,
) -> Result<impl Responder, ApiError> {
    auth::require_user(&state, identity).await?;

    if payload.quantity <= 0 {
        return Err(ApiError::Validation("Quantity must be positive".to_owned()));
    }
    let product = db::get_product(&state, payload.product_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if product.stock < payload.quantity {
        return Err(ApiError::Validation("Not enough stock available".to_owned()));
    }

    SessionCart::new(session).add(payload.product_id, payload.quantity)?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Added to cart" })))
}

#[get("/api/cart")]
pub async fn get_cart(
    state: Data<AppState>,
    identity: Option<Identity>,
    session: Session,
) -> Result<impl Responder, ApiError> {
    auth::require_user(&state, identity).await?;

    let mut items = Vec::new();
    let mut total = 0.0;
    for entry in SessionCart::new(session).entries() {
        // entries for products that vanished from the catalog are dropped
        let Some(product) = db::get_product(&state, entry.product_id).await? else {
            continue;
        };
        let subtotal = product.price * entry.quantity as f64;
        total += subtotal;
        items.push(CartItemView {
            product,
            quantity: entry.quantity,
            subtotal,
        });
    }
    Ok(HttpResponse::Ok().json(json!({ "items": items, "total": total })))
}

#[delete("/api/cart/{product_id}")]
pub async fn remove_cart_item(
    path: web::Path<i64>,
    state: Data<AppState>,
    identity: Option<Identity>,
    session: Session,
) -> Result<impl Responder, ApiError> {
    auth::require_user(&state, identity).await?;
    SessionCart::new(session).remove(path.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Removed from cart" })))
}

#[post("/api/cart/clear")]
pub async fn clear_cart(
    state: Data<AppState>,
    identity: Option<Identity>,
    session: Session,
) -> Result<impl Responder, ApiError> {
    auth::require_user(&state, identity).await?;
    SessionCart::new(session).clear();
    Ok(HttpResponse::Ok().json(json!({ "message": "Cart cleared" })))
}

#[post("/api/checkout")]
pub async fn checkout(
    state: Data<AppState>,
    identity: Option<Identity>,
    session: Session,
) -> Result<impl Responder, ApiError> {
    let user = auth::require_user(&state, identity).await?;
    let cart = SessionCart::new(session);

    let order = db::checkout(&state, user.id, &cart.entries()).await?;
    cart.clear();
    Ok(HttpResponse::Ok().json(json!({ "message": "Order placed", "order": order })))
}
