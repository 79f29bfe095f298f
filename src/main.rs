//! BattleBottle backend - entry point
//!
//! Binds the HTTP surface to the advisor service. Routing is the only
//! logic that lives here; every request is decoded into the wire types
//! and handed straight to the facade.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;

use battlebottle::api::{RecommendRequest, ServiceInfo, SubmitRequest};
use battlebottle::core::config::NarrativeConfig;
use battlebottle::core::error::AdvisorError;
use battlebottle::llm::LlmClient;
use battlebottle::store::EventStore;
use battlebottle::AdvisorService;

#[derive(Parser, Debug)]
#[command(name = "battlebottle", about = "Tactical recommendation backend")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Path to the battle log file
    #[arg(long, env = "DB_PATH", default_value = "battlebottle.jsonl")]
    data: PathBuf,
}

const ROUTES: &[&str] = &[
    "/api/submit",
    "/api/recommend",
    "/api/recommend/narrative",
    "/api/feedback",
    "/api/stats",
    "/health",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "battlebottle=info".into()),
        )
        .init();

    let args = Args::parse();

    let store = EventStore::open(args.data.clone())?;
    tracing::info!(path = %args.data.display(), "Event store opened");

    let llm = match NarrativeConfig::from_env() {
        Some(config) => match LlmClient::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Narrative client unavailable; continuing without it");
                None
            }
        },
        None => {
            tracing::warn!("NARRATIVE_API_KEY not set - running without narrative generation");
            None
        }
    };

    let service = Arc::new(AdvisorService::new(store, llm));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let make_svc = make_service_fn(move |_conn| {
        let service = Arc::clone(&service);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let service = Arc::clone(&service);
                async move { Ok::<_, Infallible>(route(req, &service).await) }
            }))
        }
    });

    tracing::info!(%addr, "BattleBottle backend listening");
    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}

async fn route(req: Request<Body>, service: &AdvisorService) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/api/submit") => submit(req, service).await,
        (&Method::POST, "/api/recommend") => recommend(req, service, false).await,
        (&Method::POST, "/api/recommend/narrative") => recommend(req, service, true).await,
        (&Method::POST, "/api/feedback") => feedback(req, service).await,
        (&Method::GET, "/api/stats") => stats(service),
        (&Method::GET, "/health") => json(StatusCode::OK, &service.health()),
        (&Method::GET, "/") => json(
            StatusCode::OK,
            &ServiceInfo {
                service: "BattleBottle Backend",
                version: env!("CARGO_PKG_VERSION"),
                status: "running",
                endpoints: ROUTES,
            },
        ),
        _ => error_json(StatusCode::NOT_FOUND, "not found"),
    };

    tracing::debug!(%method, %path, status = %response.status(), "Request handled");
    response
}

async fn submit(req: Request<Body>, service: &AdvisorService) -> Response<Body> {
    let submission: SubmitRequest = match decode(req).await {
        Ok(v) => v,
        Err(resp) => return *resp,
    };
    match service.submit(&submission) {
        Ok(ack) => json(StatusCode::OK, &ack),
        Err(e) => error_response(e),
    }
}

async fn recommend(
    req: Request<Body>,
    service: &AdvisorService,
    with_narrative: bool,
) -> Response<Body> {
    let request: RecommendRequest = match decode(req).await {
        Ok(v) => v,
        Err(resp) => return *resp,
    };
    let result = if with_narrative {
        service.recommend_with_narrative(&request).await
    } else {
        service.recommend(&request)
    };
    match result {
        Ok(rec) => json(StatusCode::OK, &rec),
        Err(e) => error_response(e),
    }
}

async fn feedback(req: Request<Body>, service: &AdvisorService) -> Response<Body> {
    let battle: SubmitRequest = match decode(req).await {
        Ok(v) => v,
        Err(resp) => return *resp,
    };
    json(StatusCode::OK, &service.feedback(&battle).await)
}

fn stats(service: &AdvisorService) -> Response<Body> {
    match service.stats() {
        Ok(stats) => json(StatusCode::OK, &stats),
        Err(e) => error_response(e),
    }
}

/// Read and deserialize a JSON request body; malformed input is a 400.
async fn decode<T: serde::de::DeserializeOwned>(
    req: Request<Body>,
) -> std::result::Result<T, Box<Response<Body>>> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| Box::new(error_json(StatusCode::BAD_REQUEST, &e.to_string())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Box::new(error_json(StatusCode::BAD_REQUEST, &e.to_string())))
}

fn error_response(e: AdvisorError) -> Response<Body> {
    let status = match e {
        AdvisorError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "Request failed");
    }
    error_json(status, &e.to_string())
}

fn error_json(status: StatusCode, message: &str) -> Response<Body> {
    #[derive(Serialize)]
    struct ErrorBody<'a> {
        success: bool,
        error: &'a str,
    }
    json(
        status,
        &ErrorBody {
            success: false,
            error: message,
        },
    )
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::empty())),
        Err(e) => {
            tracing::error!(error = %e, "Response serialization failed");
            let mut resp = Response::new(Body::from("{\"success\":false}"));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        }
    }
}
