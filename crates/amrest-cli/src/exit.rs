//! Process exit codes derived from HTTP outcomes.

/// Exit code for bad arguments, payloads, or settings.
pub(crate) const EXIT_USAGE: i32 = 2;

/// What the transport produced for the primary request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// A response arrived with this status.
    Response(u16),
    /// No response was obtained.
    TransportFailure,
}

/// Map an outcome to the process exit code.
///
/// Statuses of 400 and above become `status - 350` (404 -> 54, 500 -> 150).
/// Inherited offset; some results collide with shell-reserved codes.
pub(crate) fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::TransportFailure => 1,
        Outcome::Response(status) if status < 400 => 0,
        Outcome::Response(status) => i32::from(status) - 350,
    }
}
