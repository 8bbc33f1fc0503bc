use crate::{auth, db, errors::ApiError, models::Role, AppState};

/// Populates the database with demo data; skipped when users already exist.
pub async fn run(state: &AppState) -> Result<(), ApiError> {
    if !db::list_users(state).await?.is_empty() {
        log::info!("Database already has data; skipping seeding");
        return Ok(());
    }

    let admin = db::create_user(
        state,
        db::NewUser {
            email: "admin@example.com".to_owned(),
            password_hash: auth::hash_password("Admin123!")?,
            name: "Administrator".to_owned(),
            phone: "+1 555 000 0000".to_owned(),
            role: Role::Admin,
        },
    )
    .await?;
    let user = db::create_user(
        state,
        db::NewUser {
            email: "user@example.com".to_owned(),
            password_hash: auth::hash_password("User123!")?,
            name: "Mary".to_owned(),
            phone: "+1 555 111 2233".to_owned(),
            role: Role::User,
        },
    )
    .await?;
    db::update_preferences(state, admin.id, r#"{"theme": "dark"}"#.to_owned()).await?;
    db::update_preferences(state, user.id, r#"{"theme": "light"}"#.to_owned()).await?;

    db::create_note(
        state,
        user.id,
        "Shopping list".to_owned(),
        "Milk, bread, cheese".to_owned(),
        Some("home".to_owned()),
    )
    .await?;
    db::create_note(
        state,
        user.id,
        "Blog ideas".to_owned(),
        "Feature tour of the notes app".to_owned(),
        Some("work".to_owned()),
    )
    .await?;
    db::create_note(
        state,
        admin.id,
        "Release plan".to_owned(),
        "Ship the next version".to_owned(),
        Some("admin".to_owned()),
    )
    .await?;

    let products: [(&str, &str, f64, i64, &str, &str); 3] = [
        (
            "Pocket notebook",
            "Stationery",
            3.50,
            50,
            "A compact notebook",
            "notebook,mini",
        ),
        (
            "Fountain pen",
            "Writing supplies",
            12.00,
            20,
            "An elegant pen",
            "pen,gift",
        ),
        (
            "Sticker pack",
            "Accessories",
            1.50,
            200,
            "A set of motivational stickers",
            "stickers,decor",
        ),
    ];
    let pool = state.db_pool.clone();
    let mut product_ids = Vec::new();
    for (name, category, price, stock, description, tags) in products {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, category, price, stock, description, tags) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(name)
        .bind(category)
        .bind(price)
        .bind(stock)
        .bind(description)
        .bind(tags)
        .fetch_one(&pool)
        .await?;
        product_ids.push(id);
    }

    db::create_feedback(
        state,
        Some(user.id),
        "Keeping notes and shopping in one place is really handy!".to_owned(),
        Some(5),
    )
    .await?;
    db::create_feedback(
        state,
        None,
        "Would love more color themes".to_owned(),
        Some(4),
    )
    .await?;

    // One historical order so the admin panel has something to show.
    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, total, status, created_at) \
         VALUES ($1, $2, 'paid', $3) RETURNING id",
    )
    .bind(user.id)
    .bind(15.50)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_one(&pool)
    .await?;
    for (product_id, price) in [(product_ids[0], 3.50), (product_ids[1], 12.00)] {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price) \
             VALUES ($1, $2, 1, $3)",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(price)
        .execute(&pool)
        .await?;
    }

    log::info!("Demo data inserted");
    Ok(())
}
