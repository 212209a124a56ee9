use std::io::Read;

use anyhow::Context;
use serde_json::Value;

use crate::cli::OperationKind;
use crate::client::{CliError, CliResult};
use crate::locator::ResourceLocator;
use crate::request::Verb;

/// One invocation's work, validated before any network traffic.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operation {
    Login,
    Read(ResourceLocator),
    Create {
        locator: ResourceLocator,
        payload: Value,
    },
    Update {
        locator: ResourceLocator,
        payload: Value,
    },
    Delete(ResourceLocator),
}

impl Operation {
    /// Assemble an operation from command-line positionals and, for writes,
    /// the payload read from standard input.
    ///
    /// An update without a name addresses the item named by the payload's
    /// `uuid`, falling back to its `name`.
    pub(crate) fn new(
        kind: OperationKind,
        section: &str,
        name: Option<&str>,
        payload: Option<Value>,
    ) -> CliResult<Self> {
        Ok(match kind {
            OperationKind::Login => Self::Login,
            OperationKind::Read => Self::Read(ResourceLocator::new(section, name)),
            OperationKind::Create => Self::Create {
                locator: ResourceLocator::new(section, name),
                payload: require_payload(kind, payload)?,
            },
            OperationKind::Update => {
                let payload = require_payload(kind, payload)?;
                let locator = match name {
                    Some(name) => ResourceLocator::new(section, Some(name)),
                    None => {
                        let derived = derive_identifier(&payload).ok_or_else(|| {
                            CliError::validation(
                                "update requires a NAME or a payload with a 'uuid' or 'name' field",
                            )
                        })?;
                        ResourceLocator::named(section, derived)
                    }
                };
                Self::Update { locator, payload }
            }
            OperationKind::Delete => Self::Delete(ResourceLocator::new(section, name)),
        })
    }

    /// Resource call this operation performs; `None` for login.
    pub(crate) const fn target(&self) -> Option<(Verb, &ResourceLocator, Option<&Value>)> {
        match self {
            Self::Login => None,
            Self::Read(locator) => Some((Verb::Read, locator, None)),
            Self::Create { locator, payload } => Some((Verb::Create, locator, Some(payload))),
            Self::Update { locator, payload } => Some((Verb::Update, locator, Some(payload))),
            Self::Delete(locator) => Some((Verb::Delete, locator, None)),
        }
    }
}

fn require_payload(kind: OperationKind, payload: Option<Value>) -> CliResult<Value> {
    payload.ok_or_else(|| {
        CliError::validation(format!("{} requires a JSON payload", kind.as_str()))
    })
}

/// Item identifier carried by a payload: `uuid`, else `name`.
pub(crate) fn derive_identifier(payload: &Value) -> Option<String> {
    ["uuid", "name"].into_iter().find_map(|field| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Read the JSON payload for create and update from `input`.
pub(crate) fn read_payload(mut input: impl Read) -> CliResult<Value> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read payload from standard input")
        .map_err(CliError::failure)?;
    serde_json::from_str(&raw).map_err(|err| {
        CliError::validation(format!("payload on standard input is not valid JSON: {err}"))
    })
}
