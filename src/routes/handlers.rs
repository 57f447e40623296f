use std::time::{Duration, Instant};

use log::{debug, warn};
use warp::{
    filters::multipart::FormData,
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::actions::{Action, Outcome};
use crate::environment::Environment;
use crate::errors::ProofingError;
use crate::event::CSV_FILE_NAME;
use crate::identity::{Gate, ScopeKey};
use crate::io::parse_upload;
use crate::mime_type::MimeType;
use crate::routes::{
    rejection::{Context, Rejection},
    request::{
        DeleteRequest, EditRequest, JumpRequest, LogRequest, PositionRequest, ScopeQuery,
        ScopeRequest, SelectRequest,
    },
    response::SuccessResponse,
};
use crate::session::Session;
use crate::store::FsStore;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn enter_scope(environment: Environment, request: ScopeRequest) -> RouteResult {
    timed! {
        let gate = Gate::default().submit(&request.key);
        let key = scoped(gate).map_err(|e| Rejection::new(Context::scope(Some(request.key.clone())), e))?;

        debug!(environment.logger, "Entered scope"; "scope" => %key);

        with_status(
            json(&SuccessResponse::Scope {
                url: environment.urls.scope(&key),
                key: &key,
            }),
            StatusCode::CREATED,
        )
    }
}

pub async fn resume_scope(environment: Environment, query: ScopeQuery) -> RouteResult {
    timed! {
        let gate = Gate::from_location(query.key.as_deref());
        let key = scoped(gate).map_err(|e| Rejection::new(Context::scope(query.key.clone()), e))?;

        json(&SuccessResponse::Scope {
            url: environment.urls.scope(&key),
            key: &key,
        })
    }
}

pub async fn state(environment: Environment, key: String) -> RouteResult {
    timed! {
        let session = open(&environment, &key).map_err(|e| Rejection::new(Context::state(key.clone()), e))?;

        json(&SuccessResponse::State(session.view(&environment.urls)))
    }
}

pub async fn upload(environment: Environment, key: String, content: FormData) -> RouteResult {
    timed! {
        let scope = ScopeKey::sanitize(&key).map_err(|e| Rejection::new(Context::upload(key.clone(), None), e))?;

        debug!(environment.logger, "Parsing submission..."; "scope" => %scope);
        let upload = parse_upload(content)
            .await
            .map_err(|e| Rejection::new(Context::upload(key.clone(), None), e))?;

        let mut session = environment.session(scope);
        let error_handler = |e: ProofingError| Rejection::new(Context::upload(key.clone(), Some(upload.name.clone())), e);

        debug!(environment.logger, "Storing upload..."; "scope" => &key, "name" => &upload.name, "bytes" => upload.data.len());
        let outcome = session.upload(&upload.name, &upload.data).map_err(error_handler)?;

        with_status(respond(&environment, &session, outcome), StatusCode::CREATED)
    }
}

pub async fn select(environment: Environment, key: String, request: SelectRequest) -> RouteResult {
    timed! {
        let SelectRequest { audio_id } = request;
        let error_handler = |e: ProofingError| Rejection::new(Context::select(key.clone(), audio_id.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::SelectAsset { audio_id: audio_id.clone() })
            .map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn position(environment: Environment, key: String, request: PositionRequest) -> RouteResult {
    timed! {
        let PositionRequest { audio_id, current_time } = request;
        let error_handler = |e: ProofingError| Rejection::new(Context::position(key.clone(), audio_id.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::ReportPosition { audio_id: audio_id.clone(), position: current_time })
            .map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn jump(environment: Environment, key: String, request: JumpRequest) -> RouteResult {
    timed! {
        let JumpRequest { audio_id, target } = request;
        let error_handler = |e: ProofingError| Rejection::new(Context::jump(key.clone(), audio_id.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::Jump { audio_id: audio_id.clone(), target })
            .map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn log_event(environment: Environment, key: String, request: LogRequest) -> RouteResult {
    timed! {
        let LogRequest { label, note, current_time } = request;
        let error_handler = |e: ProofingError| Rejection::new(Context::log_event(key.clone(), label.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::LogEvent { label: label.clone(), note, position: current_time })
            .map_err(error_handler)?;

        with_status(respond(&environment, &session, outcome), StatusCode::CREATED)
    }
}

pub async fn edit_rows(environment: Environment, key: String, request: EditRequest) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::edit_rows(key.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::EditRows { rows: request.rows })
            .map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn delete_rows(environment: Environment, key: String, request: DeleteRequest) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::delete_rows(key.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session
            .perform(Action::DeleteRows { indices: request.indices })
            .map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn undo(environment: Environment, key: String) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::undo(key.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session.perform(Action::Undo).map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn clear(environment: Environment, key: String) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::clear(key.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session.perform(Action::Clear).map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn save(environment: Environment, key: String) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::save(key.clone()), e);

        let mut session = open(&environment, &key).map_err(error_handler)?;
        let outcome = session.perform(Action::ForceSave).map_err(error_handler)?;

        respond(&environment, &session, outcome)
    }
}

pub async fn export(environment: Environment, key: String) -> RouteResult {
    timed! {
        let session = open(&environment, &key).map_err(|e| Rejection::new(Context::export(key.clone()), e))?;

        with_header(
            with_header(
                session.export_csv(),
                "content-type",
                mime::TEXT_CSV_UTF_8.to_string(),
            ),
            "content-disposition",
            format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
        )
    }
}

pub async fn audio(environment: Environment, key: String, audio_id: String) -> RouteResult {
    timed! {
        let error_handler = |e: ProofingError| Rejection::new(Context::audio(key.clone(), audio_id.clone()), e);

        let session = open(&environment, &key).map_err(error_handler)?;
        let asset = session.audio(&audio_id).map_err(error_handler)?;

        let extension = asset
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mime_type = MimeType::for_extension(extension);

        let data = tokio::fs::read(&asset.path).await.map_err(|source| {
            warn!(environment.logger, "Could not read stored audio"; "scope" => &key, "audio_id" => &audio_id, "error" => %source);
            error_handler(ProofingError::ContentUnavailable {
                audio_id: audio_id.clone(),
                path: asset.path.clone(),
            })
        })?;

        with_header(data, "content-type", mime_type.essence)
    }
}

fn scoped(gate: Gate) -> Result<ScopeKey, ProofingError> {
    match gate {
        Gate::Scoped(key) => Ok(key),
        Gate::NoKey { .. } => Err(ProofingError::InvalidScopeKey),
    }
}

fn open(environment: &Environment, raw: &str) -> Result<Session<FsStore>, ProofingError> {
    let key = ScopeKey::sanitize(raw)?;

    Ok(environment.session(key))
}

fn respond(environment: &Environment, session: &Session<FsStore>, outcome: Outcome) -> warp::reply::Json {
    json(&SuccessResponse::Outcome {
        commands: outcome.commands,
        view: session.view(&environment.urls),
    })
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
