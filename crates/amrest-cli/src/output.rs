//! JSON rendering for standard output.

use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::client::{CliError, CliResult};
use crate::tree::sort_keys;

/// Render `value` with sorted keys. `None` produces compact output; `Some(n)`
/// pretty-prints with `n` spaces per level (`0` keeps the line breaks).
pub(crate) fn render_json(value: &Value, indent: Option<usize>) -> CliResult<String> {
    let mut sorted = value.clone();
    sort_keys(&mut sorted);

    let bytes = match indent {
        None => serde_json::to_vec(&sorted)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?,
        Some(width) => {
            let indent = " ".repeat(width);
            let mut buffer = Vec::new();
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
            sorted
                .serialize(&mut serializer)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            buffer
        }
    };

    String::from_utf8(bytes)
        .map_err(|err| CliError::failure(anyhow!("formatted JSON was not UTF-8: {err}")))
}

/// Convert the `--json-indent` flag: negative disables pretty printing.
pub(crate) fn indent_width(raw: i32) -> Option<usize> {
    usize::try_from(raw).ok()
}
