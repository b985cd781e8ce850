use thiserror::Error;

/// Every way the scheduling rules can turn a request down.
///
/// `Validate` reports exactly one of these, checked in declaration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Requested time does not fit any enabled working window")]
    OutsideWindow,

    #[error("Requested time overlaps an existing appointment")]
    Conflict,

    #[error("Requested time has already passed")]
    InThePast,
}

impl SchedulingError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SchedulingError::InvalidRequest(msg.into())
    }

    /// Stable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulingError::InvalidRequest(_) => "invalid_request",
            SchedulingError::OutsideWindow => "outside_window",
            SchedulingError::Conflict => "conflict",
            SchedulingError::InThePast => "in_the_past",
        }
    }
}
