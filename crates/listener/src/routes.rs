//! HTTP routes and the request/response translation around the orchestrator.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use pipeline::{RawRequest, RequestHeaders, ResponseStatus, WebhookOrchestrator, WebhookResponse};
use tower_http::trace::TraceLayer;

/// Route an Azure Functions custom handler receives for the `SponsorWebhook` function.
pub const WEBHOOK_ROUTE: &str = "/api/SponsorWebhook";

/// Builds the webhook router.
///
/// `POST /api/SponsorWebhook` and `POST /` both run the pipeline; any other
/// method on those paths gets `405 Method Not Allowed`.
pub fn router(orchestrator: Arc<WebhookOrchestrator>) -> Router {
    Router::new()
        .route(WEBHOOK_ROUTE, post(receive_sponsorship))
        .route("/", post(receive_sponsorship))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// `POST /api/SponsorWebhook`
///
/// Hands the exact body bytes and headers to the orchestrator and returns its
/// outcome as a `text/plain` response.
async fn receive_sponsorship(
    State(orchestrator): State<Arc<WebhookOrchestrator>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RawRequest::new(body.to_vec(), request_headers(&headers));
    let outcome = orchestrator.handle(&request).await;
    into_http_response(outcome)
}

// Every value is kept, in order. Bytes outside UTF-8 become U+FFFD, so a
// mangled signature is still present and fails verification.
fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn status_code(status: ResponseStatus) -> StatusCode {
    match status {
        ResponseStatus::Ok => StatusCode::OK,
        ResponseStatus::BadRequest => StatusCode::BAD_REQUEST,
        ResponseStatus::Unauthorized => StatusCode::UNAUTHORIZED,
        ResponseStatus::BadGateway => StatusCode::BAD_GATEWAY,
    }
}

fn into_http_response(outcome: WebhookResponse) -> Response {
    (status_code(outcome.status), outcome.body).into_response()
}
