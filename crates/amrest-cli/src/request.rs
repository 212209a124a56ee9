//! Request descriptors for the Common REST endpoints.
//!
//! Reads address items through `_queryFilter` so that a name and an id both
//! resolve; mutations address the item directly as a path segment.

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::client::{CliError, CliResult};
use crate::locator::{Identifier, ResourceLocator};
use crate::session::Session;

pub(crate) const PARAM_REALM: &str = "realm";
pub(crate) const PARAM_QUERY_FILTER: &str = "_queryFilter";
pub(crate) const PARAM_ACTION: &str = "_action";

/// Resource verb requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Read,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Shape the response body is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Envelope {
    /// Query response wrapping matches in a `result` array.
    Paged,
    /// A single resource or action result.
    Single,
}

/// Fully resolved request; building one performs no I/O.
#[derive(Debug, Clone)]
pub(crate) struct ResourceRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
    pub(crate) envelope: Envelope,
}

/// `{base}/json/{section}[/{item}]?realm={realm}` with every path segment and
/// query value percent-encoded on its own.
pub(crate) fn endpoint_url(
    base: &Url,
    section: &str,
    item: Option<&str>,
    realm: &str,
) -> CliResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            CliError::validation(format!("server URL '{base}' cannot be a base"))
        })?;
        segments.pop_if_empty().push("json").push(section);
        if let Some(item) = item {
            segments.push(item);
        }
    }
    url.query_pairs_mut().append_pair(PARAM_REALM, realm);
    Ok(url)
}

/// Addressing and body resolved for one call.
struct Route<'a> {
    method: Method,
    item: Option<&'a str>,
    query: Option<(&'static str, String)>,
    envelope: Envelope,
    body: Option<Value>,
}

fn route<'a>(
    locator: &'a ResourceLocator,
    verb: Verb,
    payload: Option<&Value>,
) -> CliResult<Route<'a>> {
    if locator.section.trim().is_empty() {
        return Err(CliError::validation("section must not be empty"));
    }

    let (method, item, query, envelope) = match (verb, &locator.identifier) {
        (Verb::Read, identifier) => (
            Method::GET,
            None,
            Some((PARAM_QUERY_FILTER, read_filter(identifier))),
            Envelope::Paged,
        ),
        (Verb::Create, Identifier::ListAll) => (
            Method::POST,
            None,
            Some((PARAM_ACTION, "create".to_string())),
            Envelope::Single,
        ),
        (Verb::Create, Identifier::LiteralName(name)) => (
            Method::POST,
            Some(name.as_str()),
            Some((PARAM_ACTION, "create".to_string())),
            Envelope::Single,
        ),
        (Verb::Update, Identifier::LiteralName(name)) => {
            (Method::PUT, Some(name.as_str()), None, Envelope::Single)
        }
        (Verb::Delete, Identifier::LiteralName(name)) => {
            (Method::DELETE, Some(name.as_str()), None, Envelope::Single)
        }
        (verb, Identifier::RawFilter(expression)) => {
            return Err(CliError::validation(format!(
                "{} addresses a single item; query filter '{expression}' is only valid for read",
                verb.as_str()
            )));
        }
        (verb, Identifier::ListAll) => {
            return Err(CliError::validation(format!(
                "{} requires an item name or UUID",
                verb.as_str()
            )));
        }
    };

    let body = match verb {
        Verb::Create | Verb::Update => Some(payload.cloned().ok_or_else(|| {
            CliError::validation(format!("{} requires a JSON payload", verb.as_str()))
        })?),
        Verb::Read | Verb::Delete => None,
    };

    Ok(Route {
        method,
        item,
        query,
        envelope,
        body,
    })
}

/// Check that `verb` can be applied to `locator` without building the request.
pub(crate) fn validate(
    locator: &ResourceLocator,
    verb: Verb,
    payload: Option<&Value>,
) -> CliResult<()> {
    route(locator, verb, payload).map(|_| ())
}

/// Build the request for `verb` against `locator` within the session realm.
pub(crate) fn build(
    session: &Session,
    locator: &ResourceLocator,
    verb: Verb,
    payload: Option<&Value>,
) -> CliResult<ResourceRequest> {
    let route = route(locator, verb, payload)?;

    let mut url = endpoint_url(
        session.base_url(),
        &locator.section,
        route.item,
        session.realm(),
    )?;
    if let Some((key, value)) = route.query {
        url.query_pairs_mut().append_pair(key, &value);
    }

    Ok(ResourceRequest {
        method: route.method,
        url,
        headers: session.headers().clone(),
        body: route.body,
        envelope: route.envelope,
    })
}

fn read_filter(identifier: &Identifier) -> String {
    match identifier {
        Identifier::ListAll => "true".to_string(),
        Identifier::RawFilter(expression) => expression.clone(),
        Identifier::LiteralName(name) => format!("name eq \"{}\"", escape_filter_string(name)),
    }
}

fn escape_filter_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use reqwest::header::CONTENT_TYPE;
    use serde_json::json;

    use crate::session::HEADER_SESSION_TOKEN;

    fn session(base: &str, realm: &str) -> Result<Session> {
        Session::new(Url::parse(base)?, realm, "AQIC5w-token")
            .map_err(|err| anyhow!(err.display_message()))
    }

    fn request(
        locator: &ResourceLocator,
        verb: Verb,
        payload: Option<&Value>,
    ) -> Result<ResourceRequest> {
        let session = session("http://am.example.com:8080/openam", "/")?;
        build(&session, locator, verb, payload).map_err(|err| anyhow!(err.display_message()))
    }

    fn query(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    #[test]
    fn list_all_uses_true_filter() -> Result<()> {
        let built = request(&ResourceLocator::new("realms", None), Verb::Read, None)?;
        assert_eq!(built.method, Method::GET);
        assert_eq!(
            built.url.as_str(),
            "http://am.example.com:8080/openam/json/realms?realm=%2F&_queryFilter=true"
        );
        assert_eq!(built.envelope, Envelope::Paged);
        assert!(built.body.is_none());
        Ok(())
    }

    #[test]
    fn reads_address_names_by_filter_and_mutations_by_path() -> Result<()> {
        let payload = json!({"name": "p1"});
        for section in ["users", "policies", "agents"] {
            let locator = ResourceLocator::new(section, Some("p1"));

            let read = request(&locator, Verb::Read, None)?;
            assert_eq!(read.url.path(), format!("/openam/json/{section}"));
            assert_eq!(query(&read.url, "_queryFilter").as_deref(), Some(r#"name eq "p1""#));

            for verb in [Verb::Create, Verb::Update, Verb::Delete] {
                let built = request(&locator, verb, Some(&payload))?;
                assert_eq!(built.url.path(), format!("/openam/json/{section}/p1"));
                assert_eq!(query(&built.url, "_queryFilter"), None);
            }
        }
        Ok(())
    }

    #[test]
    fn raw_filter_is_passed_verbatim_without_path_segment() -> Result<()> {
        let locator = ResourceLocator::new("users", Some(r#"uid sw "adm""#));
        let built = request(&locator, Verb::Read, None)?;
        assert_eq!(built.url.path(), "/openam/json/users");
        assert_eq!(query(&built.url, "_queryFilter").as_deref(), Some(r#"uid sw "adm""#));
        Ok(())
    }

    #[test]
    fn create_without_name_posts_to_collection() -> Result<()> {
        let payload = json!({"name": "p1"});
        let built = request(&ResourceLocator::new("policies", None), Verb::Create, Some(&payload))?;
        assert_eq!(built.method, Method::POST);
        assert_eq!(
            built.url.as_str(),
            "http://am.example.com:8080/openam/json/policies?realm=%2F&_action=create"
        );
        assert_eq!(built.body, Some(payload));
        assert_eq!(built.envelope, Envelope::Single);
        Ok(())
    }

    #[test]
    fn update_and_delete_use_put_and_delete() -> Result<()> {
        let payload = json!({"name": "demo"});
        let locator = ResourceLocator::new("users", Some("demo"));

        let update = request(&locator, Verb::Update, Some(&payload))?;
        assert_eq!(update.method, Method::PUT);
        assert_eq!(query(&update.url, "_action"), None);
        assert_eq!(update.body, Some(payload));

        let delete = request(&locator, Verb::Delete, None)?;
        assert_eq!(delete.method, Method::DELETE);
        assert!(delete.body.is_none());
        Ok(())
    }

    #[test]
    fn path_and_query_components_are_escaped_individually() -> Result<()> {
        let session = session("https://sso.example.com/openam/", "/top/sub realm")?;
        let locator = ResourceLocator::new("groups", Some("a b/c?d"));
        let built = build(&session, &locator, Verb::Delete, None)
            .map_err(|err| anyhow!(err.display_message()))?;
        assert_eq!(
            built.url.as_str(),
            "https://sso.example.com/openam/json/groups/a%20b%2Fc%3Fd?realm=%2Ftop%2Fsub+realm"
        );
        Ok(())
    }

    #[test]
    fn literal_names_with_quotes_are_escaped_in_filters() -> Result<()> {
        let locator = ResourceLocator::new("users", Some(r#"say "hi"\now"#));
        let built = request(&locator, Verb::Read, None)?;
        assert_eq!(
            query(&built.url, "_queryFilter").as_deref(),
            Some(r#"name eq "say \"hi\"\\now""#)
        );
        Ok(())
    }

    #[test]
    fn session_headers_are_attached() -> Result<()> {
        let built = request(&ResourceLocator::new("realms", None), Verb::Read, None)?;
        assert_eq!(
            built.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(
            built.headers.get(HEADER_SESSION_TOKEN).and_then(|v| v.to_str().ok()),
            Some("AQIC5w-token")
        );
        Ok(())
    }

    #[test]
    fn mutations_reject_filters_and_missing_names() {
        let payload = json!({});
        let filter = ResourceLocator::new("users", Some("uid pr"));
        for verb in [Verb::Create, Verb::Update, Verb::Delete] {
            assert!(request(&filter, verb, Some(&payload)).is_err());
        }
        let all = ResourceLocator::new("users", None);
        assert!(request(&all, Verb::Update, Some(&payload)).is_err());
        assert!(request(&all, Verb::Delete, None).is_err());
    }

    #[test]
    fn writes_require_payload() {
        let locator = ResourceLocator::new("users", Some("demo"));
        assert!(request(&locator, Verb::Update, None).is_err());
        assert!(request(&locator, Verb::Create, None).is_err());
    }

    #[test]
    fn validation_matches_build() {
        let payload = json!({"name": "p1"});
        let named = ResourceLocator::new("users", Some("demo"));
        assert!(validate(&named, Verb::Update, Some(&payload)).is_ok());
        assert!(matches!(
            validate(&ResourceLocator::new("users", None), Verb::Delete, None),
            Err(CliError::Validation(_))
        ));
        assert!(matches!(
            validate(&ResourceLocator::new("users", Some("uid pr")), Verb::Create, Some(&payload)),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn empty_section_is_rejected() {
        assert!(request(&ResourceLocator::new(" ", None), Verb::Read, None).is_err());
    }
}
