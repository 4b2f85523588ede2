// gateway/src/static_files.rs
use std::path::{Path, PathBuf};

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::DefaultHeaders;
use actix_web::{error, web, Error, HttpRequest, HttpResponse};
use common::{AppConfig, GatewayConfig};
use mime::Mime;

use crate::pages;

/// Bundle files and assets are immutable between deploys; one day of
/// client caching on top of the validators
const BUNDLE_CACHE_CONTROL: &str = "max-age=86400";

/// One application bundle served under a URL prefix
#[derive(Clone)]
pub struct AppMount {
    pub name: String,
    pub dir: PathBuf,
}

/// Normalize a request tail into a relative path, rejecting traversal
pub fn sanitize_request_path(tail: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for segment in tail.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => clean.push(s),
        }
    }
    Some(clean)
}

/// Content type assignment for bundle files. The fixed table mirrors what
/// the deployed bundles rely on; everything else falls back to a guess
/// from the extension.
pub fn content_type_for(path: &Path) -> Option<Mime> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "js" => mime::APPLICATION_JAVASCRIPT,
        "css" => mime::TEXT_CSS,
        "json" => mime::APPLICATION_JSON,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "svg" => mime::IMAGE_SVG,
        "gif" => mime::IMAGE_GIF,
        "html" => mime::TEXT_HTML_UTF_8,
        _ => mime_guess::from_path(path).first()?,
    };
    Some(mime)
}

/// Serve a bundle path: exact file hits win, anything else gets the entry
/// document so client-side routing can take over
pub async fn serve_app(
    req: HttpRequest,
    mount: web::Data<AppMount>,
) -> actix_web::Result<HttpResponse> {
    let tail = req.match_info().query("tail");

    if let Some(rel) = sanitize_request_path(tail) {
        if !rel.as_os_str().is_empty() {
            let candidate = mount.dir.join(&rel);
            if candidate.is_file() {
                tracing::debug!("[{}] Serving file: {}", mount.name, candidate.display());

                let mut file = NamedFile::open(&candidate)?
                    .use_etag(true)
                    .use_last_modified(true)
                    .prefer_utf8(false);
                if let Some(mime) = content_type_for(&candidate) {
                    file = file.set_content_type(mime);
                }

                let mut res = file.into_response(&req);
                res.headers_mut().insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(BUNDLE_CACHE_CONTROL),
                );
                return Ok(res);
            }
        }
    }

    let index = mount.dir.join("index.html");
    let file = NamedFile::open(&index).map_err(|e| {
        tracing::error!(
            "[{}] Missing entry document {}: {}",
            mount.name,
            index.display(),
            e
        );
        error::ErrorInternalServerError("entry document unavailable")
    })?;

    Ok(file.set_content_type(mime::TEXT_HTML_UTF_8).into_response(&req))
}

/// Register one application: explicit asset mounts first, then the
/// file-or-entry-document catch-all for the prefix
pub fn register_app(cfg: &mut web::ServiceConfig, app: &AppConfig) {
    for asset_dir in &app.asset_dirs {
        let dir = app.dir.join(asset_dir);
        if dir.is_dir() {
            cfg.service(
                web::scope(&format!("{}/{}", app.prefix, asset_dir))
                    .wrap(
                        DefaultHeaders::new().add((header::CACHE_CONTROL, BUNDLE_CACHE_CONTROL)),
                    )
                    .service(Files::new("/", dir).use_etag(true).use_last_modified(true)),
            );
        } else {
            tracing::warn!(
                "[{}] Asset directory {} does not exist, skipping mount",
                app.name,
                dir.display()
            );
        }
    }

    let mount = AppMount {
        name: app.name.clone(),
        dir: app.dir.clone(),
    };
    cfg.service(
        web::resource([app.prefix.clone(), format!("{}/{{tail:.*}}", app.prefix)])
            .app_data(web::Data::new(mount))
            .route(web::get().to(serve_app)),
    );
}

/// Register the unauthenticated public root (favicon etc.); misses fall
/// through to the not-found page
pub fn register_public(cfg: &mut web::ServiceConfig, config: &GatewayConfig) {
    if !config.public_dir.is_dir() {
        tracing::warn!(
            "Public directory {} does not exist, skipping mount",
            config.public_dir.display()
        );
        return;
    }

    cfg.service(
        Files::new("/", &config.public_dir)
            .use_etag(true)
            .use_last_modified(true)
            .default_handler(fn_service(|req: ServiceRequest| async move {
                let (req, _) = req.into_parts();
                let res = pages::not_found_response(&req);
                Ok::<_, Error>(ServiceResponse::new(req, res))
            })),
    );
}
