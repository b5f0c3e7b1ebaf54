//!
//! # Application Bootstrap
//!
//! Assembles the HTTP application: CORS policy, request logging, the health
//! check, API documentation and the mounted route groups. [`launch`] runs the
//! startup hook and only then binds the listener, so a failed hook leaves the
//! port closed.

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenConfig;
use crate::config::Settings;
use crate::docs;
use crate::error::{AppError, BootstrapError};
use crate::routes::{self, health, RouterMount};
use crate::startup::{run_startup, SchemaInitializer};

pub const TITLE: &str = "Full-Stack Todo API";
pub const DESCRIPTION: &str =
    "RESTful API for multi-user todo task management with JWT authentication";
pub const VERSION: &str = "1.0.0";

/// Paths owned by the bootstrap itself; no route group may shadow them.
const RESERVED_PATHS: &[&str] = &[
    "/health",
    docs::DOCS_PATH,
    docs::REDOC_PATH,
    docs::OPENAPI_PATH,
];

/// Everything each worker needs to build an identical `App`.
#[derive(Clone)]
pub struct Bootstrap {
    settings: Arc<Settings>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenConfig>,
    mounts: Vec<RouterMount>,
}

impl Bootstrap {
    pub fn new(settings: Settings, pool: PgPool) -> Self {
        let tokens = web::Data::new(TokenConfig::from(&settings));
        Self {
            settings: Arc::new(settings),
            pool: web::Data::new(pool),
            tokens,
            mounts: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mounts(&self) -> &[RouterMount] {
        &self.mounts
    }

    /// Adds a route group, rejecting any prefix that overlaps an existing
    /// mount or a bootstrap-owned path.
    pub fn mount(mut self, mount: RouterMount) -> Result<Self, BootstrapError> {
        let conflict = self
            .mounts
            .iter()
            .map(|m| m.prefix().to_string())
            .chain(RESERVED_PATHS.iter().map(|p| p.to_string()))
            .find(|existing| mount.overlaps(existing));

        if let Some(existing) = conflict {
            return Err(BootstrapError::RouterMountConflict {
                prefix: mount.prefix().to_string(),
                existing,
            });
        }

        log::debug!("mounting {} router at {}", mount.name(), mount.prefix());
        self.mounts.push(mount);
        Ok(self)
    }

    /// Mounts auth, tasks and chat at their standard prefixes.
    pub fn with_default_routers(self) -> Result<Self, BootstrapError> {
        routes::default_mounts()
            .into_iter()
            .try_fold(self, |bootstrap, mount| bootstrap.mount(mount))
    }

    /// Registers shared state, the health check, the docs and every mounted
    /// route group. Used with `App::configure`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.pool.clone())
            .app_data(self.tokens.clone())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .service(health::health_check)
            .configure(docs::register);

        for mount in &self.mounts {
            mount.register(cfg);
        }
    }

    /// Binds the listener and returns the (not yet polled) server.
    pub fn serve(self, options: &ServeOptions) -> Result<Server, BootstrapError> {
        let workers = self.settings.workers;
        let bootstrap = self;

        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(bootstrap.settings.allowed_origins.cors())
                .wrap(Logger::default())
                .configure(|cfg| bootstrap.configure(cfg))
        });

        if options.reload_on_change {
            // A file watcher restarts the process; release the port at once.
            server = server.workers(1).shutdown_timeout(0);
        } else if let Some(workers) = workers {
            server = server.workers(workers);
        }

        let server = server
            .bind((options.host.as_str(), options.port))
            .map_err(BootstrapError::Bind)?;

        log::info!("{} v{} listening on {}", TITLE, VERSION, options.url());
        Ok(server.run())
    }
}

/// Where and how the listener runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    reload_on_change: bool,
}

impl ServeOptions {
    /// Auto-reload follows the debug flag and is never on outside debug mode.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            reload_on_change: settings.debug,
        }
    }

    pub fn reload_on_change(&self) -> bool {
        self.reload_on_change
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Validates and mounts the standard routers, runs the startup hook, then
/// binds the listener.
///
/// The returned server must be awaited (or spawned) to start serving.
pub async fn launch<I>(
    settings: Settings,
    initializer: &I,
    pool: PgPool,
) -> Result<Server, BootstrapError>
where
    I: SchemaInitializer + ?Sized,
{
    let options = ServeOptions::from_settings(&settings);
    let bootstrap = Bootstrap::new(settings, pool).with_default_routers()?;

    run_startup(bootstrap.settings(), initializer).await?;

    if options.reload_on_change() {
        log::info!("debug mode: auto-reload enabled, run under `cargo watch -x run`");
    }
    bootstrap.serve(&options)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(err.to_string()).into())
}
