//! ParkSpot entry-point: loads settings, prepares storage and serves the
//! REST API, the WebSocket endpoint and the health probes.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use parkspot::inbound::http::health::HealthState;
use parkspot::inbound::http::session_config::{BuildMode, session_settings_from_env};
use parkspot::outbound::persistence::{DbPool, run_pending_migrations};
use parkspot::settings::AppSettings;
use server::{ServerConfig, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr()?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_allowed_origins(settings.allowed_origins()?)
    .with_admin_emails(settings.admin_emails()?)
    .with_booking_policy(settings.booking_policy()?);

    if let Some(pool_config) = settings.pool_config() {
        if settings.run_migrations {
            run_pending_migrations(pool_config.database_url())
                .await
                .wrap_err("failed to apply database migrations")?;
            info!("database migrations applied");
        }
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "parkspot listening");
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome.wrap_err("server terminated with an error")
}
