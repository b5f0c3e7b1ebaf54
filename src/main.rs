use todo_api::{app, config::Settings, db, error::BootstrapError};

#[actix_web::main]
async fn main() -> Result<(), BootstrapError> {
    // Load .env before the logger so RUST_LOG set there applies.
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| {
        log::error!("{}", e);
        e
    })?;
    log::info!(
        "starting todo-api (debug={}, origins={:?})",
        settings.debug,
        settings.allowed_origins.as_slice()
    );

    let pool = db::connect_lazy(&settings.database_url)?;
    let schema = db::PgSchema::new(pool.clone());

    let server = app::launch(settings, &schema, pool).await.map_err(|e| {
        log::error!("{}", e);
        e
    })?;
    server.await?;
    Ok(())
}
