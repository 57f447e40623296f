use serde::Serialize;
use url::Url;

use crate::actions::Command;
use crate::identity::ScopeKey;
use crate::view::View;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Scope {
        key: &'a ScopeKey,
        url: Url,
    },
    Outcome {
        commands: Vec<Command>,
        view: View<'a>,
    },
    State(View<'a>),
}
