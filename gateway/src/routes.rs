// gateway/src/routes.rs
use actix_web::web;
use common::GatewayConfig;

use crate::{pages, proxy, static_files};

/// Ordered dispatch table.
///
/// Registration order is the routing contract: earlier services win.
/// The proxy must stay ahead of the application mounts, each app's asset
/// mounts ahead of its entry-document catch-all, and the public root
/// behind everything with a name. Reordering the registrations below
/// changes observable behavior; the integration tests pin it down.
pub fn configure(cfg: &mut web::ServiceConfig, config: &GatewayConfig) {
    // 1. Agent API proxy
    proxy::register(cfg, config);

    // 2. Application bundles, in configured order
    for app in &config.apps {
        static_files::register_app(cfg, app);
    }

    // 3. Login, logout, landing page
    cfg.service(
        web::resource("/login")
            .route(web::get().to(pages::login_form))
            .route(web::post().to(pages::login_submit)),
    );
    cfg.service(web::resource("/logout").route(web::get().to(pages::logout)));
    cfg.service(web::resource("/").route(web::get().to(pages::landing)));

    // 4. Public static root, then the not-found fallback
    static_files::register_public(cfg, config);
    cfg.default_service(web::route().to(pages::not_found));
}
