// gateway/src/lib.rs
pub mod auth;
pub mod pages;
pub mod proxy;
pub mod routes;
pub mod session_store;
pub mod static_files;
pub mod utils;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{Compress, DefaultHeaders, ErrorHandlers};
use actix_web::{web, App, Error};
use common::GatewayConfig;

use crate::auth::AuthGate;
use crate::session_store::SessionStore;

/// Assemble the gateway application: shared state, middleware and the
/// ordered route table. The binary and the integration tests both build
/// the exact same app through this function.
pub fn build_app(
    config: GatewayConfig,
    store: Arc<dyn SessionStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let auth_gate = AuthGate::new(&config, store.clone());
    let client = proxy::build_client(&config);
    let config_data = web::Data::new(config.clone());

    App::new()
        .app_data(config_data)
        .app_data(web::Data::from(store))
        .app_data(web::Data::new(client))
        .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
        .wrap(ErrorHandlers::new().handler(
            StatusCode::INTERNAL_SERVER_ERROR,
            pages::render_server_error,
        ))
        .wrap(auth_gate)
        .wrap(Compress::default())
        .configure(|cfg| routes::configure(cfg, &config))
}
