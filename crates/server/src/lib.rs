//! HTTP + WebSocket front end.
//!
//! Wires the ledger, sessions, registry, and the WebSocket bridge into a
//! single actix-web server:
//!
//! - `GET    /health` — liveness, including a database round trip
//! - `GET    /tables` — public table listing from the registry
//! - `POST   /tables` — open a fresh table
//! - `DELETE /tables/{id}` — close a table, unseating its occupants
//! - `GET    /ws`     — the game channel
pub mod config;
pub mod ws;

pub use config::Config;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use rvb_ledger::Ledger;
use rvb_registry::Registry;
use rvb_session::Identity;
use rvb_session::MockIdentity;
use rvb_session::SessionManager;
use rvb_table::Bank;
use std::sync::Arc;

async fn health(ledger: web::Data<Arc<Ledger>>) -> impl Responder {
    match ledger
        .ping()
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })),
        Err(_) => HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "status": "database unavailable" })),
    }
}

async fn tables(registry: web::Data<Arc<Registry>>) -> impl Responder {
    HttpResponse::Ok().json(registry.list().await)
}

async fn open_table(registry: web::Data<Arc<Registry>>) -> impl Responder {
    let id = registry.create().await;
    HttpResponse::Ok().json(serde_json::json!({ "tableId": id.to_string() }))
}

async fn close_table(
    registry: web::Data<Arc<Registry>>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    match registry.destroy(rvb_core::ID::from(path.into_inner())).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "closed" })),
        Err(e) => HttpResponse::NotFound().body(e.to_string()),
    }
}

/// Pick the ticket verifier. Platform ticket validation lives outside this
/// crate; until that adapter ships every deployment runs the mock provider.
/// TODO: swap in the Steam AuthenticateUserTicket adapter behind
/// `steam_api_key` once the web API client lands.
fn identity(config: &Config) -> Arc<dyn Identity> {
    if config.steam_api_key.is_some() {
        log::warn!("steam_api_key set but the platform adapter is not wired; using mock identity");
    }
    Arc::new(MockIdentity)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let ledger = Arc::new(Ledger::connect(&config.database_url, config.default_buy_in).await?);
    ledger.ensure().await?;
    let (sessions, reaped) = SessionManager::new(identity(&config), config.session_grace_ms);
    let bank: Arc<dyn Bank> = ledger.clone();
    let registry = Registry::new(sessions.clone(), bank, config.table(), config.social_tick_hz);
    registry.spawn_reaper(reaped);
    let gateway = web::Data::new(ws::Gateway {
        registry: registry.clone(),
        sessions: sessions.clone(),
        ledger: ledger.clone(),
    });
    let registry = web::Data::new(registry);
    let ledger = web::Data::new(ledger);
    let port = config.port;
    log::info!("listening on :{}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(gateway.clone())
            .app_data(registry.clone())
            .app_data(ledger.clone())
            .route("/health", web::get().to(health))
            .route("/tables", web::get().to(tables))
            .route("/tables", web::post().to(open_table))
            .route("/tables/{table_id}", web::delete().to(close_table))
            .route("/ws", web::get().to(ws::connect))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;
    Ok(())
}
