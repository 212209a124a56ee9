//! Authenticated sessions: the authenticate call, request signing headers, and
//! logout.

use reqwest::Client;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::client::{CliError, CliResult, RawResponse, send};
use crate::request::{Envelope, PARAM_ACTION, ResourceRequest, endpoint_url};

pub(crate) const HEADER_USERNAME: &str = "x-openam-username";
pub(crate) const HEADER_PASSWORD: &str = "x-openam-password";
pub(crate) const HEADER_SESSION_TOKEN: &str = "iplanetdirectorypro";

const SECTION_AUTHENTICATE: &str = "authenticate";
const SECTION_SESSIONS: &str = "sessions";

/// Authenticated session. Only [`login`] produces one and [`logout`] consumes
/// it, so no request can be signed before login or after logout.
#[derive(Debug)]
pub(crate) struct Session {
    base_url: Url,
    realm: String,
    headers: HeaderMap,
}

impl Session {
    pub(crate) fn new(base_url: Url, realm: impl Into<String>, token: &str) -> CliResult<Self> {
        let mut token = HeaderValue::from_str(token).map_err(|_| CliError::Authentication {
            status: None,
            body: None,
            reason: "session token contains invalid characters".to_string(),
        })?;
        token.set_sensitive(true);

        let mut headers = json_headers();
        headers.insert(HEADER_SESSION_TOKEN, token);
        Ok(Self {
            base_url,
            realm: realm.into(),
            headers,
        })
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn realm(&self) -> &str {
        &self.realm
    }

    pub(crate) const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Server, realms, and credentials for one login.
#[derive(Clone, Copy)]
pub(crate) struct LoginTarget<'a> {
    pub(crate) base_url: &'a Url,
    /// Realm later requests are scoped to.
    pub(crate) realm: &'a str,
    /// Realm the credentials belong to.
    pub(crate) login_realm: &'a str,
    pub(crate) user: &'a str,
    pub(crate) password: &'a str,
}

/// Successful login: the session plus the raw authenticate response.
#[derive(Debug)]
pub(crate) struct Login {
    pub(crate) session: Session,
    pub(crate) response: RawResponse,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    #[serde(rename = "tokenId")]
    token_id: Option<String>,
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Build the authenticate request. Credentials travel in headers; the body is
/// an empty JSON object.
pub(crate) fn authenticate_request(target: &LoginTarget<'_>) -> CliResult<ResourceRequest> {
    let header = |name: &str, value: &str| {
        HeaderValue::from_str(value)
            .map_err(|_| CliError::validation(format!("{name} contains invalid characters")))
    };

    let mut headers = json_headers();
    headers.insert(HEADER_USERNAME, header("login user", target.user)?);
    let mut password = header("login password", target.password)?;
    password.set_sensitive(true);
    headers.insert(HEADER_PASSWORD, password);

    Ok(ResourceRequest {
        method: Method::POST,
        url: endpoint_url(target.base_url, SECTION_AUTHENTICATE, None, target.login_realm)?,
        headers,
        body: Some(json!({})),
        envelope: Envelope::Single,
    })
}

/// Authenticate and return a session scoped to `target.realm`.
pub(crate) async fn login(client: &Client, target: &LoginTarget<'_>) -> CliResult<Login> {
    let request = authenticate_request(target)?;
    let response = send(client, &request).await?;

    if !(200..300).contains(&response.status) {
        return Err(CliError::Authentication {
            status: Some(response.status),
            body: serde_json::from_slice(&response.body).ok(),
            reason: "login rejected".to_string(),
        });
    }

    let token = serde_json::from_slice::<AuthenticateResponse>(&response.body)
        .ok()
        .and_then(|parsed| parsed.token_id)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CliError::Authentication {
            status: Some(response.status),
            body: None,
            reason: "response did not contain tokenId".to_string(),
        })?;

    debug!(
        login_realm = target.login_realm,
        realm = target.realm,
        user = target.user,
        "authenticated"
    );
    let session = Session::new(target.base_url.clone(), target.realm, &token)?;
    Ok(Login { session, response })
}

pub(crate) fn logout_request(session: &Session) -> CliResult<ResourceRequest> {
    let mut url = endpoint_url(&session.base_url, SECTION_SESSIONS, None, &session.realm)?;
    url.query_pairs_mut().append_pair(PARAM_ACTION, "logout");
    Ok(ResourceRequest {
        method: Method::POST,
        url,
        headers: session.headers.clone(),
        body: Some(json!({})),
        envelope: Envelope::Single,
    })
}

/// Terminate the session. Failures are logged and otherwise ignored.
pub(crate) async fn logout(client: &Client, session: Session) {
    let outcome = match logout_request(&session) {
        Ok(request) => send(client, &request).await.map(|response| response.status),
        Err(err) => Err(err),
    };
    match outcome {
        Ok(status) if (200..300).contains(&status) => debug!("session logged out"),
        Ok(status) => warn!(status, "logout was not accepted"),
        Err(err) => debug!(error = %err, "logout failed"),
    }
}
