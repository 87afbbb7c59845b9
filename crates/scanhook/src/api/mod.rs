use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use reqwest::Url;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    adapters::ScanRequest,
    auth::verify_token,
    jobs::run_scan_job,
    message,
    models::SlashCommand,
    security::in_scope,
    target::validate_target,
    AppState,
};

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "scanhook"}))
}

pub async fn nmap_command(State(state): State<AppState>, Form(payload): Form<SlashCommand>) -> Response {
    info!(
        host = %payload.text,
        user = %payload.user_name,
        team = %payload.team_domain,
        channel = %payload.channel_name,
        "nmap request"
    );

    if !verify_token(state.config.verification_token.as_deref(), &payload.token) {
        warn!(team = %payload.team_domain, "rejected command with bad verification token");
        return (StatusCode::UNAUTHORIZED, "invalid verification token").into_response();
    }

    if !is_http_url(&payload.response_url) {
        return (StatusCode::BAD_REQUEST, "missing or invalid response_url").into_response();
    }

    let validated = match validate_target(&payload.text, state.resolver.as_ref()).await {
        Ok(v) => v,
        Err(e) => {
            info!(reason = %e, "rejected target");
            return Json(message::rejection()).into_response();
        }
    };

    if !in_scope(&validated.target, &validated.addrs, &state.config.scope_allowlist) {
        warn!(host = %validated.target, user = %payload.user_name, "target out of scope");
        return Json(message::out_of_scope(&validated.target)).into_response();
    }

    let ack = message::accepted(&validated.target);
    let request = ScanRequest::from_config(validated.target, &state.config);
    tokio::spawn(run_scan_job(
        state.scanner.clone(),
        state.callback.clone(),
        request,
        payload.response_url,
        Uuid::new_v4(),
    ));

    Json(ack).into_response()
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
