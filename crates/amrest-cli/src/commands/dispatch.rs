//! Login, run one operation, and log out.

use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

use crate::client::{CliError, CliResult, send};
use crate::commands::Operation;
use crate::request::{self, Envelope};
use crate::response::{NormalizedResult, OutputOptions, normalize};
use crate::session::{Login, LoginTarget, Session, login, logout};

/// Everything an operation needs besides the operation itself.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) realm: String,
    pub(crate) login_realm: String,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) output: OutputOptions,
    /// Close the session once the operation finished.
    pub(crate) logout: bool,
}

impl AppContext {
    fn login_target(&self) -> LoginTarget<'_> {
        LoginTarget {
            base_url: &self.base_url,
            realm: &self.realm,
            login_realm: &self.login_realm,
            user: &self.user,
            password: &self.password,
        }
    }
}

/// Run `operation` inside a fresh session.
///
/// Arguments are validated before anything is sent. Once login succeeded the
/// session is logged out (unless disabled) whatever the operation returned.
pub(crate) async fn execute(ctx: &AppContext, operation: &Operation) -> CliResult<NormalizedResult> {
    if let Some((verb, locator, payload)) = operation.target() {
        request::validate(locator, verb, payload)?;
    }

    let Login { session, response } = login(&ctx.client, &ctx.login_target())
        .await
        .inspect_err(log_server_error)?;

    let outcome = match operation.target() {
        None => normalize(&response, Envelope::Single, &ctx.output),
        Some((verb, locator, payload)) => {
            info!(
                verb = verb.as_str(),
                section = %locator.section,
                realm = %ctx.realm,
                "executing operation"
            );
            let request = request::build(&session, locator, verb, payload);
            perform(&ctx.client, request, &ctx.output).await
        }
    };

    finish(ctx, session).await;
    outcome.inspect_err(log_server_error)
}

// Logout goes through `send` as well but reports its own failures at debug.
fn log_server_error(err: &CliError) {
    if let CliError::Server { status, body } = err {
        error!(status, body = %body, "HTTP server error");
    }
}

async fn perform(
    client: &Client,
    request: CliResult<request::ResourceRequest>,
    output: &OutputOptions,
) -> CliResult<NormalizedResult> {
    let request = request?;
    let response = send(client, &request).await?;
    normalize(&response, request.envelope, output)
}

async fn finish(ctx: &AppContext, session: Session) {
    if ctx.logout {
        logout(&ctx.client, session).await;
    } else {
        debug!("leaving session open");
    }
}
