use askama::Template;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};

use crate::VERSION;

/// Error text carried from [`crate::error::AppError`] to the page renderer
/// through response extensions.
#[derive(Clone)]
pub struct ErrorMessage(pub String);

/// Which surface a request path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Api,
    Health,
    Page,
}

impl Surface {
    fn of(path: &str) -> Self {
        if path.starts_with("/api/") {
            Surface::Api
        } else if path == "/health" {
            Surface::Health
        } else {
            Surface::Page
        }
    }
}

#[derive(Template)]
#[template(path = "pages/error.html")]
struct ErrorPageTemplate {
    title: String,
    version: &'static str,
    status_code: u16,
    status_text: &'static str,
    message: String,
    hint: &'static str,
}

/// Turns failed page requests into a full HTML error page.
///
/// JSON and receipt endpoints under `/api/` and the health check keep their
/// own bodies; only the status is logged for them.
pub async fn error_page_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let surface = Surface::of(&path);
    let method = request.method().clone();

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = response
        .extensions()
        .get::<ErrorMessage>()
        .map(|e| e.0.clone());
    tracing::warn!(
        %status,
        %method,
        %path,
        message = message.as_deref().unwrap_or(""),
        "request failed"
    );

    match surface {
        Surface::Api | Surface::Health => response,
        Surface::Page => render_error_page(status, message),
    }
}

/// Fallback handler for unmatched routes.
pub async fn fallback_handler() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    response
        .extensions_mut()
        .insert(ErrorMessage("There is no page at this address.".into()));
    response
}

fn render_error_page(status: StatusCode, message: Option<String>) -> Response {
    let (status_text, hint) = status_info(status);

    let template = ErrorPageTemplate {
        title: status_text.to_string(),
        version: VERSION,
        status_code: status.as_u16(),
        status_text,
        message: message.unwrap_or_else(|| format!("Request failed with status {}.", status.as_u16())),
        hint,
    };

    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page template: {}", e);
            (status, "Internal Server Error").into_response()
        }
    }
}

/// Title and a short hint for the statuses the dashboard produces.
fn status_info(status: StatusCode) -> (&'static str, &'static str) {
    match status.as_u16() {
        400 => ("Bad Request", "Check the month (YYYY-MM) and category in the address."),
        404 => ("Not Found", "The dashboard lives at the site root."),
        405 => ("Method Not Allowed", ""),
        422 => ("Unreadable Data", "Check that the ticket CSV has the expected columns."),
        500 => ("Internal Server Error", ""),
        _ => ("Error", ""),
    }
}
