// gateway/src/pages.rs
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{web, HttpRequest, HttpResponse};
use common::{AppConfig, GatewayConfig};
use serde::Deserialize;

use crate::auth::CurrentSession;
use crate::session_store::SessionStore;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(body)
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// GET /login
pub async fn login_form(query: web::Query<LoginQuery>, current: CurrentSession) -> HttpResponse {
    if current.session.authenticated {
        return redirect("/");
    }

    let error = query.error.as_deref().map(|_| "Invalid credentials");
    html(login_page_html(error))
}

/// POST /login
pub async fn login_submit(
    form: web::Form<LoginForm>,
    current: CurrentSession,
    store: web::Data<dyn SessionStore>,
    config: web::Data<GatewayConfig>,
) -> HttpResponse {
    if form.username == config.auth.username && form.password == config.auth.password {
        store.set_authenticated(&current.token, true);
        tracing::info!("Login succeeded for session {}", current.session.id);

        // The gate records return_to, but login always lands on the root page
        redirect("/")
    } else {
        tracing::warn!("Login failed for session {}", current.session.id);
        redirect("/login?error=1")
    }
}

/// GET /logout
pub async fn logout(
    current: CurrentSession,
    store: web::Data<dyn SessionStore>,
    config: web::Data<GatewayConfig>,
) -> HttpResponse {
    store.destroy(&current.token);

    let expired = Cookie::build(config.auth.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(0))
        .finish();

    let mut res = redirect("/login");
    if let Err(e) = res.add_cookie(&expired) {
        tracing::warn!("Failed to clear session cookie: {}", e);
    }
    res
}

/// GET / — landing page linking the configured applications
pub async fn landing(config: web::Data<GatewayConfig>) -> HttpResponse {
    html(landing_page_html(&config.apps))
}

/// Fallback for paths nothing else handled
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    not_found_response(&req)
}

pub fn not_found_response(req: &HttpRequest) -> HttpResponse {
    let apps = req
        .app_data::<web::Data<GatewayConfig>>()
        .map(|config| config.apps.clone())
        .unwrap_or_default();

    HttpResponse::NotFound()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(fallback_page_html("Page not found", None, &apps))
}

/// ErrorHandlers hook rendering unhandled server errors as an HTML page
/// with the error message and navigation links; the failure is logged,
/// the process keeps going
pub fn render_server_error<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let detail = res.response().error().map(|e| e.to_string());

    tracing::error!(
        "Unhandled server error on {} {}: {}",
        res.request().method(),
        res.request().path(),
        detail.as_deref().unwrap_or("unknown error")
    );

    let apps = res
        .request()
        .app_data::<web::Data<GatewayConfig>>()
        .map(|config| config.apps.clone())
        .unwrap_or_default();
    let body = fallback_page_html("Something broke!", detail.as_deref(), &apps);

    let (req, res) = res.into_parts();
    let mut res = res.set_body(body);
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    let res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}

fn login_page_html(error: Option<&str>) -> String {
    let error_block = error
        .map(|msg| format!(r#"<div class="error">{}</div>"#, html_escape(msg)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Login - Demo Store</title>
  <style>
    body {{ font-family: Arial, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background-color: #f5f5f5; }}
    .login-container {{ background: white; padding: 2rem; border-radius: 8px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); width: 100%; max-width: 400px; }}
    h1 {{ color: #333; text-align: center; margin-bottom: 1.5rem; }}
    .form-group {{ margin-bottom: 1rem; }}
    label {{ display: block; margin-bottom: 0.5rem; color: #555; }}
    input {{ width: 100%; padding: 0.75rem; border: 1px solid #ddd; border-radius: 4px; font-size: 1rem; }}
    button {{ width: 100%; padding: 0.75rem; background-color: #4CAF50; color: white; border: none; border-radius: 4px; font-size: 1rem; cursor: pointer; margin-top: 1rem; }}
    button:hover {{ background-color: #45a049; }}
    .error {{ color: #d32f2f; text-align: center; margin-bottom: 1rem; }}
  </style>
</head>
<body>
  <div class="login-container">
    <h1>Login</h1>
    {error_block}
    <form action="/login" method="POST">
      <div class="form-group">
        <label for="username">Email</label>
        <input type="email" id="username" name="username" required>
      </div>
      <div class="form-group">
        <label for="password">Password</label>
        <input type="password" id="password" name="password" required>
      </div>
      <button type="submit">Sign In</button>
    </form>
  </div>
</body>
</html>"#
    )
}

fn landing_page_html(apps: &[AppConfig]) -> String {
    let cards: String = apps
        .iter()
        .map(|app| {
            format!(
                r#"          <a href="{}" class="app-card"><h2>{}</h2></a>
"#,
                app.prefix,
                html_escape(&app.name)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Welcome to Demo Store</title>
  <style>
    body {{ font-family: Arial, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background-color: #f5f5f5; }}
    .container {{ text-align: center; max-width: 800px; padding: 2rem; background: white; border-radius: 10px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }}
    h1 {{ color: #333; margin: 0; font-size: 1.8rem; }}
    .header {{ display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; margin-bottom: 1.5rem; }}
    .logout {{ background-color: #f44336; color: white; padding: 0.5rem 1rem; border-radius: 4px; text-decoration: none; white-space: nowrap; }}
    .apps {{ display: flex; justify-content: center; gap: 2rem; margin-top: 2rem; }}
    .app-card {{ padding: 2rem; border: 1px solid #ddd; border-radius: 8px; text-decoration: none; color: #333; transition: transform 0.2s, box-shadow 0.2s; width: 200px; }}
    .app-card:hover {{ transform: translateY(-5px); box-shadow: 0 6px 12px rgba(0, 0, 0, 0.1); }}
    .app-card h2 {{ margin-top: 1rem; color: #2c3e50; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Welcome to 1Digitals Demo Store</h1>
      <a href="/logout" class="logout">Logout</a>
    </div>
    <p>Please select an application to continue:</p>
    <div class="apps">
{cards}    </div>
  </div>
</body>
</html>"#
    )
}

fn fallback_page_html(title: &str, detail: Option<&str>, apps: &[AppConfig]) -> String {
    let links: String = apps
        .iter()
        .map(|app| {
            format!(
                r#"      <li><a href="{}">{} App</a></li>
"#,
                app.prefix,
                html_escape(&app.name)
            )
        })
        .collect();

    let detail_block = detail
        .map(|msg| format!("    <p>{}</p>\n", html_escape(msg)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
{detail_block}    <p>Available routes:</p>
    <ul>
{links}    </ul>
</body>
</html>"#
    )
}
