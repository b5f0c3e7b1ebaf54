//! The startup hook: the one action that must finish before the listener is
//! bound. In debug mode it creates the database schema; otherwise it does
//! nothing.

use futures::future::BoxFuture;

use crate::config::Settings;
use crate::error::BootstrapError;

/// Creates the database schema when asked to.
///
/// Implemented by [`crate::db::PgSchema`]; tests substitute their own.
pub trait SchemaInitializer {
    fn initialize(&self) -> BoxFuture<'_, Result<(), sqlx::Error>>;
}

/// Runs the startup hook to completion.
///
/// Errors are fatal: the caller must not bind the listener afterwards.
pub async fn run_startup<I>(settings: &Settings, initializer: &I) -> Result<(), BootstrapError>
where
    I: SchemaInitializer + ?Sized,
{
    if !settings.debug {
        log::debug!("debug mode off, skipping schema initialization");
        return Ok(());
    }

    log::info!("debug mode on, initializing database schema");
    initializer.initialize().await.map_err(|e| {
        log::error!("schema initialization failed: {}", e);
        BootstrapError::SchemaInitializationFailure(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSchema {
        calls: AtomicUsize,
        fail: bool,
    }

    impl SchemaInitializer for CountingSchema {
        fn initialize(&self) -> BoxFuture<'_, Result<(), sqlx::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(sqlx::Error::Protocol("simulated failure".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn settings(debug: bool) -> Settings {
        let mut settings = Settings::new("postgres://localhost/unused", "secret");
        settings.debug = debug;
        settings
    }

    #[actix_rt::test]
    async fn test_debug_mode_initializes_schema_once() {
        let schema = CountingSchema::default();
        run_startup(&settings(true), &schema).await.unwrap();
        assert_eq!(schema.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn test_release_mode_skips_schema() {
        let schema = CountingSchema::default();
        run_startup(&settings(false), &schema).await.unwrap();
        assert_eq!(schema.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_rt::test]
    async fn test_failure_is_fatal() {
        let schema = CountingSchema {
            fail: true,
            ..Default::default()
        };
        let result = run_startup(&settings(true), &schema).await;
        assert!(matches!(
            result,
            Err(BootstrapError::SchemaInitializationFailure(_))
        ));
    }
}
