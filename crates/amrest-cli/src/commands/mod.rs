//! Operations and the login/execute/logout sequence that runs them.

pub(crate) mod dispatch;
pub(crate) mod operation;

pub(crate) use dispatch::{AppContext, execute};
pub(crate) use operation::{Operation, read_payload};
