// gateway/src/auth.rs
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, Method};
use actix_web::{error, web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use common::{GatewayConfig, GatewaySession};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::session_store::SessionStore;
use crate::static_files::sanitize_request_path;

const LOGIN_PATH: &str = "/login";
const PUBLIC_URL_PREFIX: &str = "/public/";

/// Extensions that bypass the gate so the login page's own assets and
/// public media can load before authentication completes
const EXEMPT_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".webm", ".mp4",
];

/// True when `path` equals `prefix` or sits underneath it
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Decides which request paths bypass the authentication gate
#[derive(Clone)]
pub struct AuthPolicy {
    public_dir: PathBuf,
    /// Set when the upstream prefix is configured to skip the gate
    open_proxy_prefix: Option<String>,
}

impl AuthPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            public_dir: config.public_dir.clone(),
            open_proxy_prefix: if config.upstream.require_auth {
                None
            } else {
                Some(config.upstream.prefix.clone())
            },
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        if path == LOGIN_PATH {
            return true;
        }

        if let Some(prefix) = &self.open_proxy_prefix {
            if matches_prefix(path, prefix) {
                return true;
            }
        }

        if path.starts_with(PUBLIC_URL_PREFIX) {
            return true;
        }

        if EXEMPT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return true;
        }

        // Anything that exists under the public root stays reachable
        // before login (favicon and friends)
        if let Some(rel) = sanitize_request_path(path.trim_start_matches('/')) {
            if !rel.as_os_str().is_empty() && self.public_dir.join(rel).is_file() {
                return true;
            }
        }

        false
    }
}

/// Session token placed in request extensions by the gate
#[derive(Clone)]
pub struct SessionToken(pub String);

/// Authentication gate.
///
/// Runs before routing on every request: resolves the browser session from
/// the cookie (creating one on first touch), then either lets the request
/// through or records the intended destination and redirects to the login
/// form. Only GET and HEAD are gated; other methods fall through to
/// routing and its 404 fallback.
pub struct AuthGate {
    policy: Rc<AuthPolicy>,
    store: Arc<dyn SessionStore>,
    cookie_name: Rc<String>,
}

impl AuthGate {
    pub fn new(config: &GatewayConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            policy: Rc::new(AuthPolicy::from_config(config)),
            store,
            cookie_name: Rc::new(config.auth.cookie_name.clone()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            policy: self.policy.clone(),
            store: self.store.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    policy: Rc<AuthPolicy>,
    store: Arc<dyn SessionStore>,
    cookie_name: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Resolve or create the browser session before any routing decision
        let existing = req
            .cookie(&self.cookie_name)
            .and_then(|cookie| self.store.get(cookie.value()));

        let (session, fresh_cookie) = match existing {
            Some(session) => (session, None),
            None => {
                let session = self.store.create();
                // HTTP-only, plaintext channel, no max-age: the cookie ends
                // with the browser session
                let cookie = Cookie::build(self.cookie_name.as_str().to_owned(), session.token.clone())
                    .path("/")
                    .http_only(true)
                    .secure(false)
                    .finish();
                (session, Some(cookie))
            }
        };

        req.extensions_mut().insert(SessionToken(session.token.clone()));

        let gated = (req.method() == Method::GET || req.method() == Method::HEAD)
            && !self.policy.is_exempt(req.path());

        if gated && !session.authenticated {
            let return_to = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.path().to_string());

            tracing::debug!(
                "Unauthenticated request to {}, redirecting session {} to login",
                return_to,
                session.id
            );
            self.store.set_return_to(&session.token, Some(return_to));

            let mut builder = HttpResponse::Found();
            builder.insert_header((header::LOCATION, LOGIN_PATH));
            if let Some(cookie) = &fresh_cookie {
                builder.cookie(cookie.clone());
            }
            let response = builder.finish().map_into_right_body();

            let (req, _payload) = req.into_parts();
            return Box::pin(ready(Ok(ServiceResponse::new(req, response))));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            if let Some(cookie) = &fresh_cookie {
                if let Err(e) = res.response_mut().add_cookie(cookie) {
                    tracing::warn!("Failed to attach session cookie: {}", e);
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}

/// Extractor giving handlers the session resolved by the gate
pub struct CurrentSession {
    pub token: String,
    pub session: GatewaySession,
}

impl FromRequest for CurrentSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req.extensions().get::<SessionToken>().map(|t| t.0.clone());
        let store = req.app_data::<web::Data<dyn SessionStore>>().cloned();

        ready(match (token, store) {
            (Some(token), Some(store)) => match store.get(&token) {
                Some(session) => Ok(CurrentSession { token, session }),
                None => Err(error::ErrorInternalServerError("session not found")),
            },
            _ => Err(error::ErrorInternalServerError(
                "session middleware not installed",
            )),
        })
    }
}
