use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;

use crate::auth::AuthService;
use crate::dispatch::{Dispatcher, Params, error_response, parse_command};

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod game_manager;
pub mod link_manager;

/// JSON bodies may carry numbers or booleans; every parameter is handled as
/// a string downstream.
fn flatten_json_body(body: Map<String, Value>) -> Params {
    body.into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

/// JSON, then form-urlencoded, then nothing at all.
fn body_params() -> BoxedFilter<(Params,)> {
    let json = warp::body::json::<Map<String, Value>>().map(flatten_json_body);
    let form = warp::body::form::<HashMap<String, String>>();

    json.or(form)
        .unify()
        .or(warp::any().map(Params::new))
        .unify()
        .boxed()
}

fn liveness() -> Value {
    json!({
        "status": "ok",
        "service": "wordle",
        "version": env!("CARGO_PKG_VERSION"),
    })
}

pub fn create_routes(
    dispatcher: Arc<Dispatcher>,
    auth_service: Arc<AuthService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let dispatcher_filter = warp::any().map({
        let dispatcher = dispatcher.clone();
        move || dispatcher.clone()
    });

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    // Action endpoint, any method
    let api = warp::path!("api" / "wordle")
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::optional::<String>("authorization"))
        .and(body_params())
        .and(dispatcher_filter)
        .and(auth_filter)
        .and_then(handle_wordle_request);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&liveness()));

    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&liveness()));

    // Every method the action endpoint is reached with
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]);

    api.or(health)
        .or(root)
        .with(cors)
        .with(warp::log("wordle_service"))
}

async fn handle_wordle_request(
    query: HashMap<String, String>,
    auth_header: Option<String>,
    body: Params,
    dispatcher: Arc<Dispatcher>,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // Body keys override query keys
    let mut params = query;
    params.extend(body);

    let identity = match auth_service
        .resolve_identity(
            auth_header.as_deref(),
            params.get("userId").map(String::as_str),
        )
        .await
    {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!("Rejected bearer token: {}", err);
            return Ok(warp::reply::with_status(
                warp::reply::json(&json!({
                    "success": false,
                    "error": "Invalid or expired authentication token",
                })),
                StatusCode::UNAUTHORIZED,
            ));
        }
    };

    let body = match parse_command(&params, identity) {
        Ok(command) => dispatcher.dispatch(command).await,
        Err(err) => {
            tracing::debug!("Rejected request: {}", err);
            error_response(&err)
        }
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&body),
        StatusCode::OK,
    ))
}
