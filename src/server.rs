//! HTTP surface for a browser front end: submit, observe, cancel.

use crate::{
    error::{ErrorKind, MintError},
    models::MintRequest,
    orchestrator::MintOrchestrator,
};
use actix_web::{
    get, http::StatusCode, post, web, App, HttpResponse, HttpServer, ResponseError,
};
use alloy_primitives::Address;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

impl ResponseError for MintError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Busy => StatusCode::CONFLICT,
            ErrorKind::Wallet => StatusCode::UNAUTHORIZED,
            ErrorKind::Upstream | ErrorKind::Chain => StatusCode::BAD_GATEWAY,
            ErrorKind::Cancelled => StatusCode::GONE,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }))
    }
}

type Shared = web::Data<Arc<MintOrchestrator>>;

#[post("/connect")]
async fn connect(orchestrator: Shared) -> Result<HttpResponse, MintError> {
    let account = orchestrator.connect().await?;
    Ok(HttpResponse::Ok().json(json!({ "account": account })))
}

/// Accepts a mint request and runs it in the background; poll `/status`.
#[post("/mint")]
async fn mint(
    orchestrator: Shared,
    request: web::Json<MintRequest>,
) -> Result<HttpResponse, MintError> {
    let request = request.into_inner();
    request.validate()?;
    orchestrator.start(request)?;
    Ok(HttpResponse::Accepted().json(json!({ "state": orchestrator.state() })))
}

#[get("/status")]
async fn status(orchestrator: Shared) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "state": orchestrator.state(),
        "account": orchestrator.current_account(),
    }))
}

#[post("/cancel")]
async fn cancel(orchestrator: Shared) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "cancelled": orchestrator.cancel() }))
}

#[get("/balance/{address}")]
async fn balance(orchestrator: Shared, path: web::Path<String>) -> Result<HttpResponse, MintError> {
    let owner = path
        .parse::<Address>()
        .map_err(|e| MintError::Validation(format!("invalid address: {}", e)))?;
    let balance = orchestrator.balance_of(owner).await?;
    Ok(HttpResponse::Ok().json(json!({
        "address": owner,
        "balance": balance.to_string(),
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(connect)
        .service(mint)
        .service(status)
        .service(cancel)
        .service(balance);
}

pub async fn run_server(orchestrator: Arc<MintOrchestrator>, listen: SocketAddr) -> std::io::Result<()> {
    log::info!("🌐 Server will run on http://{}", listen);
    let data = web::Data::new(orchestrator);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(listen)?
        .run()
        .await
}
