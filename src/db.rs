use crate::{
    errors::ApiError,
    models::{
        CartEntry, Feedback, FeedbackView, Note, Order, OrderItemDetail, OrderPayload,
        OrderStatus, Product, Role, User,
    },
    AppState,
};

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", term.to_lowercase())
}

// -----------------
// Users
// -----------------

pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
}

pub async fn get_user_by_id(state: &AppState, id: i64) -> Result<Option<User>, ApiError> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

/// Looks up by normalized (lower-cased, trimmed) email.
pub async fn get_user_by_email(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn create_user(state: &AppState, new_user: NewUser) -> Result<User, ApiError> {
    let pool = state.db_pool.clone();
    let created_at = now();
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, role, name, phone, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.role)
    .bind(new_user.name)
    .bind(new_user.phone)
    .bind(&created_at)
    .bind(&created_at)
    .fetch_one(&pool)
    .await?;
    log::info!("User created: {}", user.email);
    Ok(user)
}

pub async fn update_profile(
    state: &AppState,
    id: i64,
    name: Option<String>,
    phone: Option<String>,
) -> Result<User, ApiError> {
    let pool = state.db_pool.clone();
    // Build the statement and bind parameters in order
    let mut param_index = 2;
    let mut query = String::from("UPDATE users SET updated_at = $1");
    let updated_at = now();

    if name.is_some() {
        query.push_str(&format!(", name = ${}", param_index));
        param_index += 1;
    }
    if phone.is_some() {
        query.push_str(&format!(", phone = ${}", param_index));
        param_index += 1;
    }
    query.push_str(&format!(" WHERE id = ${} RETURNING *", param_index));

    let mut q = sqlx::query_as::<_, User>(&query).bind(&updated_at);
    if let Some(name) = &name {
        q = q.bind(name);
    }
    if let Some(phone) = &phone {
        q = q.bind(phone);
    }
    let user = q.bind(id).fetch_one(&pool).await?;
    Ok(user)
}

pub async fn update_preferences(state: &AppState, id: i64, preferences: String) -> Result<(), ApiError> {
    let pool = state.db_pool.clone();
    sqlx::query("UPDATE users SET preferences = $1, updated_at = $2 WHERE id = $3")
        .bind(preferences)
        .bind(now())
        .bind(id)
        .execute(&pool)
        .await?;
    Ok(())
}

pub async fn update_password(state: &AppState, id: i64, password_hash: String) -> Result<(), ApiError> {
    let pool = state.db_pool.clone();
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(now())
        .bind(id)
        .execute(&pool)
        .await?;
    log::info!("Password changed for user id {}", id);
    Ok(())
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    let pool = state.db_pool.clone();
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await?;
    Ok(users)
}

// -----------------
// Notes
// -----------------

/// Changed fields for a note update; absent fields are left untouched.
#[derive(Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
}

/// Notes are always scoped to their owner, whatever the caller's role.
pub async fn list_notes(
    state: &AppState,
    user_id: i64,
    term: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<Note>, ApiError> {
    let pool = state.db_pool.clone();
    let term = term.map(str::trim).filter(|t| !t.is_empty());

    let mut query = String::from("SELECT * FROM notes WHERE user_id = $1");
    let mut param_index = 2;
    if term.is_some() {
        query.push_str(&format!(
            " AND (LOWER(title) LIKE ${} OR LOWER(content) LIKE ${} OR LOWER(IFNULL(tags, '')) LIKE ${})",
            param_index,
            param_index + 1,
            param_index + 2
        ));
        param_index += 3;
    }
    query.push_str(" ORDER BY updated_at DESC");
    if limit.is_some() {
        query.push_str(&format!(" LIMIT ${}", param_index));
    }

    let mut q = sqlx::query_as::<_, Note>(&query).bind(user_id);
    if let Some(term) = term {
        let pattern = like_pattern(term);
        q = q.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }
    if let Some(limit) = limit {
        q = q.bind(limit);
    }
    let notes = q.fetch_all(&pool).await?;
    Ok(notes)
}

pub async fn get_note(state: &AppState, id: i64) -> Result<Option<Note>, ApiError> {
    let pool = state.db_pool.clone();
    let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(note)
}

pub async fn create_note(
    state: &AppState,
    user_id: i64,
    title: String,
    content: String,
    tags: Option<String>,
) -> Result<Note, ApiError> {
    let pool = state.db_pool.clone();
    let note = sqlx::query_as::<_, Note>(
        "INSERT INTO notes (user_id, title, content, tags, updated_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(tags)
    .bind(now())
    .fetch_one(&pool)
    .await?;
    Ok(note)
}

pub async fn update_note(state: &AppState, id: i64, changes: NoteChanges) -> Result<Note, ApiError> {
    let pool = state.db_pool.clone();
    let mut param_index = 2;
    let mut query = String::from("UPDATE notes SET updated_at = $1");

    if changes.title.is_some() {
        query.push_str(&format!(", title = ${}", param_index));
        param_index += 1;
    }
    if changes.content.is_some() {
        query.push_str(&format!(", content = ${}", param_index));
        param_index += 1;
    }
    if changes.tags.is_some() {
        query.push_str(&format!(", tags = ${}", param_index));
        param_index += 1;
    }
    query.push_str(&format!(" WHERE id = ${} RETURNING *", param_index));

    let mut q = sqlx::query_as::<_, Note>(&query).bind(now());
    if let Some(title) = &changes.title {
        q = q.bind(title);
    }
    if let Some(content) = &changes.content {
        q = q.bind(content);
    }
    if let Some(tags) = &changes.tags {
        q = q.bind(tags);
    }
    let note = q.bind(id).fetch_one(&pool).await?;
    Ok(note)
}

pub async fn delete_note(state: &AppState, id: i64) -> Result<(), ApiError> {
    let pool = state.db_pool.clone();
    sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    Ok(())
}

// -----------------
// Feedback
// -----------------

pub async fn create_feedback(
    state: &AppState,
    user_id: Option<i64>,
    message: String,
    rating: Option<i64>,
) -> Result<Feedback, ApiError> {
    let pool = state.db_pool.clone();
    let entry = sqlx::query_as::<_, Feedback>(
        "INSERT INTO feedback (user_id, message, rating, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(message)
    .bind(rating)
    .bind(now())
    .fetch_one(&pool)
    .await?;
    Ok(entry)
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: i64,
    message: String,
    rating: Option<i64>,
    created_at: String,
    user_name: Option<String>,
}

pub async fn list_feedback(state: &AppState) -> Result<Vec<FeedbackView>, ApiError> {
    let pool = state.db_pool.clone();
    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT f.id, f.message, f.rating, f.created_at, u.name AS user_name \
         FROM feedback f LEFT JOIN users u ON u.id = f.user_id \
         ORDER BY f.created_at DESC",
    )
    .fetch_all(&pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| FeedbackView {
            id: row.id,
            message: row.message,
            rating: row.rating,
            created_at: row.created_at,
            user: row.user_name.unwrap_or_else(|| "Guest".to_owned()),
        })
        .collect())
}

// -----------------
// Catalog
// -----------------

#[derive(Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub term: Option<String>,
    pub max_price: Option<f64>,
}

pub async fn list_products(
    state: &AppState,
    filters: ProductFilters,
) -> Result<Vec<Product>, ApiError> {
    let pool = state.db_pool.clone();
    let mut query = String::from("SELECT * FROM products WHERE 1 = 1");
    let mut param_index = 1;

    if filters.category.is_some() {
        query.push_str(&format!(" AND category = ${}", param_index));
        param_index += 1;
    }
    let term = filters.term.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if term.is_some() {
        query.push_str(&format!(
            " AND (LOWER(name) LIKE ${} OR LOWER(IFNULL(description, '')) LIKE ${} OR LOWER(IFNULL(tags, '')) LIKE ${})",
            param_index,
            param_index + 1,
            param_index + 2
        ));
        param_index += 3;
    }
    if filters.max_price.is_some() {
        query.push_str(&format!(" AND price <= ${}", param_index));
    }
    query.push_str(" ORDER BY name");

    let mut q = sqlx::query_as::<_, Product>(&query);
    if let Some(category) = &filters.category {
        q = q.bind(category);
    }
    if let Some(term) = term {
        let pattern = like_pattern(term);
        q = q.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }
    if let Some(max_price) = filters.max_price {
        q = q.bind(max_price);
    }
    let products = q.fetch_all(&pool).await?;
    Ok(products)
}

pub async fn search_products(
    state: &AppState,
    term: &str,
    limit: i64,
) -> Result<Vec<Product>, ApiError> {
    let pool = state.db_pool.clone();
    let term = term.trim();
    if term.is_empty() {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products LIMIT $1")
            .bind(limit)
            .fetch_all(&pool)
            .await?;
        return Ok(products);
    }
    let pattern = like_pattern(term);
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products \
         WHERE LOWER(name) LIKE $1 OR LOWER(IFNULL(description, '')) LIKE $2 \
            OR LOWER(IFNULL(tags, '')) LIKE $3 \
         LIMIT $4",
    )
    .bind(pattern.clone())
    .bind(pattern.clone())
    .bind(pattern)
    .bind(limit)
    .fetch_all(&pool)
    .await?;
    Ok(products)
}

pub async fn get_product(state: &AppState, id: i64) -> Result<Option<Product>, ApiError> {
    let pool = state.db_pool.clone();
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(product)
}

// -----------------
// Orders & checkout
// -----------------

pub async fn order_items(state: &AppState, order_id: i64) -> Result<Vec<OrderItemDetail>, ApiError> {
    let pool = state.db_pool.clone();
    let items = sqlx::query_as::<_, OrderItemDetail>(
        "SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.price \
         FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
         WHERE oi.order_id = $1 ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&pool)
    .await?;
    Ok(items)
}

/// Converts the cart into a persisted order in one transaction.
///
/// Entries whose product no longer exists are skipped; an entry whose product
/// lacks stock aborts the whole checkout with nothing written. The stock
/// decrement is conditional so that a concurrent checkout racing past the
/// initial stock check still cannot drive stock negative.
pub async fn checkout(
    state: &AppState,
    user_id: i64,
    entries: &[CartEntry],
) -> Result<OrderPayload, ApiError> {
    if entries.is_empty() {
        return Err(ApiError::EmptyCart);
    }

    let mut resolved: Vec<(Product, i64)> = Vec::new();
    let mut total = 0.0;
    for entry in entries {
        let Some(product) = get_product(state, entry.product_id).await? else {
            continue;
        };
        if product.stock < entry.quantity {
            return Err(ApiError::InsufficientStock(product.name));
        }
        total += product.price * entry.quantity as f64;
        resolved.push((product, entry.quantity));
    }
    if resolved.is_empty() {
        return Err(ApiError::Validation("No items available".to_owned()));
    }

    let pool = state.db_pool.clone();
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (user_id, total, status, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(total)
    .bind(OrderStatus::Paid)
    .bind(now())
    .fetch_one(&mut *tx)
    .await?;

    for (product, quantity) in &resolved {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id)
        .bind(product.id)
        .bind(quantity)
        .bind(product.price)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $3",
        )
        .bind(quantity)
        .bind(product.id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            // Lost a race for the last units; dropping tx rolls everything back.
            return Err(ApiError::InsufficientStock(product.name.clone()));
        }
    }

    tx.commit().await?;
    log::info!("Order {} placed by user {}", order.id, user_id);

    let items = order_items(state, order.id).await?;
    Ok(OrderPayload { order, items })
}

pub async fn list_orders(state: &AppState) -> Result<Vec<OrderPayload>, ApiError> {
    let pool = state.db_pool.clone();
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await?;
    let mut payloads = Vec::with_capacity(orders.len());
    for order in orders {
        let items = order_items(state, order.id).await?;
        payloads.push(OrderPayload { order, items });
    }
    Ok(payloads)
}
