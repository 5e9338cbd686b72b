use sqlx::PgPool;
use tracing::info;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_cache (
            id BIGSERIAL PRIMARY KEY,
            city_name VARCHAR(100) NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            temperature DOUBLE PRECISION NOT NULL,
            humidity DOUBLE PRECISION NOT NULL,
            wind_speed DOUBLE PRECISION NOT NULL,
            forecast_data JSONB NOT NULL,
            cached_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            expiry_time TIMESTAMP WITH TIME ZONE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_weather_cache_city_expiry
            ON weather_cache (city_name, expiry_time)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_weather_cache_expiry
            ON weather_cache (expiry_time)
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (user, city); replaced on every new search
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS location_history (
            user_id UUID NOT NULL,
            city_name VARCHAR(100) NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            search_time TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, city_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_request_logs (
            id BIGSERIAL PRIMARY KEY,
            user_id UUID,
            city_name VARCHAR(100) NOT NULL,
            request_url TEXT NOT NULL,
            response_status INTEGER NOT NULL,
            response_data JSONB NOT NULL,
            request_time TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_api_request_logs_user
            ON api_request_logs (user_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_cities (
            user_id UUID NOT NULL,
            city_name VARCHAR(100) NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            saved_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, city_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
