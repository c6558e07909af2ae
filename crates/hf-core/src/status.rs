//! Operation outcomes reported to the host.

use core::fmt;

/// Outcome of a caller-facing operation.
///
/// Ordered by severity so the worst of several outcomes is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    /// Success, possibly with an informational message.
    Ok,
    /// Not (fully) performed; instance state unchanged beyond what is documented.
    Warning,
    /// Deliberately unsupported; a permanent outcome.
    Discard,
    /// Backend failure; the instance should be terminated.
    Error,
    /// Unrecoverable failure.
    Fatal,
}

impl Status {
    /// FMI 2.0 log category for messages of this severity.
    pub fn category(self) -> &'static str {
        match self {
            Status::Ok => "logAll",
            Status::Warning => "logStatusWarning",
            Status::Discard => "logStatusDiscard",
            Status::Error => "logStatusError",
            Status::Fatal => "logStatusFatal",
        }
    }

    /// Whether the host sink may drop this message while debug logging is off.
    pub fn is_suppressible(self) -> bool {
        matches!(self, Status::Ok | Status::Discard)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Discard => "discard",
            Status::Error => "error",
            Status::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Status kinds a co-simulation host may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    DoStepStatus,
    PendingStatus,
    LastSuccessfulTime,
    Terminated,
}
