use std::sync::Arc;

use log::{error, warn, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::ProofingError;

pub mod admin;
mod handlers;
mod rejection;
mod request;
mod response;

pub use internal::*;

/// The maximum upload size to accept. This should be enforced by the
/// HTTP gateway, so on the Rust side it's set to an unreasonably large
/// number.
const MAX_CONTENT_LENGTH: u64 = 2 * 1024 * 1024 * 1024;

/// The maximum JSON body size to accept.
const MAX_JSON_LENGTH: u64 = 16 * 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Request failed"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            warn!(logger, "Request rejected"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status));
    }

    Err(rej)
}

fn status_code_for(e: &ProofingError) -> StatusCode {
    use ProofingError::*;

    match e {
        InvalidScopeKey | UnknownLabel(..) | MalformedFormSubmission | PartsMissing => {
            StatusCode::BAD_REQUEST
        }
        UnknownAudio(..) => StatusCode::NOT_FOUND,
        ContentUnavailable { .. } => StatusCode::GONE,
        UnsupportedAudioFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        StorageUnavailable { .. } | Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use serde::de::DeserializeOwned;
    use warp::filters::multipart::form;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put, query};

    use super::{handlers, request as r, MAX_CONTENT_LENGTH, MAX_JSON_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    fn body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_JSON_LENGTH).and(warp::body::json())
    }

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    /// Defines a route under `/<scope path>/<key>/`.
    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let s = environment.urls.scope_path.clone();

                let $route_variable = warp::any()
                    .map(move || environment.clone())
                    .and(p(s))
                    .and(par::<String>());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    pub fn make_enter_scope_route(environment: Environment) -> Route {
        warp::any()
            .map(move || environment.clone())
            .and(p("scope"))
            .and(end())
            .and(post())
            .and(body::<r::ScopeRequest>())
            .and_then(handlers::enter_scope)
            .boxed()
    }

    pub fn make_resume_scope_route(environment: Environment) -> Route {
        warp::any()
            .map(move || environment.clone())
            .and(p("scope"))
            .and(end())
            .and(g())
            .and(query::<r::ScopeQuery>())
            .and_then(handlers::resume_scope)
            .boxed()
    }

    route!(make_state_route => state, rt; p("state"), end(), g());
    route!(make_upload_route => upload, rt; p("upload"), end(), post(), form().max_length(MAX_CONTENT_LENGTH));
    route!(make_select_route => select, rt; p("select"), end(), post(), body::<r::SelectRequest>());
    route!(make_position_route => position, rt; p("position"), end(), post(), body::<r::PositionRequest>());
    route!(make_jump_route => jump, rt; p("jump"), end(), post(), body::<r::JumpRequest>());
    route!(make_log_event_route => log_event, rt; p("events"), end(), post(), body::<r::LogRequest>());
    route!(make_edit_rows_route => edit_rows, rt; p("events"), end(), put(), body::<r::EditRequest>());
    route!(make_delete_rows_route => delete_rows, rt; p("events"), end(), delete(), body::<r::DeleteRequest>());
    route!(make_undo_route => undo, rt; p("undo"), end(), post());
    route!(make_clear_route => clear, rt; p("clear"), end(), post());
    route!(make_save_route => save, rt; p("save"), end(), post());
    route!(make_export_route => export, rt; p("export.csv"), end(), g());
    route!(make_audio_route => audio, rt; p("audio"), par::<String>(), end(), g());

    /// Every route of the main server.
    pub fn make_routes(environment: Environment) -> Route {
        make_enter_scope_route(environment.clone())
            .or(make_resume_scope_route(environment.clone()))
            .unify()
            .or(make_state_route(environment.clone()))
            .unify()
            .or(make_upload_route(environment.clone()))
            .unify()
            .or(make_select_route(environment.clone()))
            .unify()
            .or(make_position_route(environment.clone()))
            .unify()
            .or(make_jump_route(environment.clone()))
            .unify()
            .or(make_log_event_route(environment.clone()))
            .unify()
            .or(make_edit_rows_route(environment.clone()))
            .unify()
            .or(make_delete_rows_route(environment.clone()))
            .unify()
            .or(make_undo_route(environment.clone()))
            .unify()
            .or(make_clear_route(environment.clone()))
            .unify()
            .or(make_save_route(environment.clone()))
            .unify()
            .or(make_export_route(environment.clone()))
            .unify()
            .or(make_audio_route(environment))
            .unify()
            .boxed()
    }
}
