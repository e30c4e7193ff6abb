#![deny(missing_docs)]
//! BugAI server executable.
//!
//! Relays submitted code to the upstream model and keeps a short analysis history.

mod config;
mod db;
mod gemini;
mod models;
mod openapi;
mod routes;
mod schema;
mod store;

#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use bugai_core::{AnalysisService, SharedModelClient};
#[cfg(not(test))]
use dotenvy::dotenv;

#[cfg(not(test))]
use crate::config::{Settings, UpstreamMode};
#[cfg(not(test))]
use crate::db::init_pool;
#[cfg(not(test))]
use crate::gemini::{GeminiClient, ScriptedModelClient};
#[cfg(not(test))]
use crate::routes::{AppState, configure};
#[cfg(not(test))]
use crate::store::PgHistoryStore;

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().map_err(|err| {
        log::error!("invalid configuration: {err}");
        std::io::Error::other(err)
    })?;

    let pool = init_pool(&settings.database_url).map_err(|err| {
        log::error!("history store unavailable: {err}");
        std::io::Error::other(err)
    })?;
    log::info!("history store connected");

    // The blocking client must be built outside the actix runtime.
    let model: SharedModelClient = match settings.upstream_mode {
        UpstreamMode::Live => Arc::new(
            GeminiClient::new(&settings.upstream_url, &settings.google_api_key)
                .map_err(std::io::Error::other)?,
        ),
        UpstreamMode::Mock => {
            log::warn!("upstream mode is mock; analyses use a canned model response");
            Arc::new(ScriptedModelClient::mock())
        }
    };

    let state = web::Data::new(AppState {
        analysis: AnalysisService::new(model, Arc::new(PgHistoryStore::new(pool))),
        static_dir: settings.static_dir.clone(),
    });

    let allowed_origins = settings.ui_origins.clone();
    let listen_addr = settings.host.clone();
    let listen_port = settings.port;
    log::info!("listening on {listen_addr}:{listen_port}");

    let server_state = state.clone();
    let served = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            let static_dir = server_state.static_dir.clone();
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(server_state.clone())
                .configure(|cfg| configure(cfg, &static_dir))
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    });

    drop(state);
    log::info!("history store released");
    served
}

#[cfg(test)]
fn main() {}
