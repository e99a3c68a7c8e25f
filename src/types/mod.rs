//! Core type definitions using newtype patterns for type safety.

mod job_id;
mod port;
mod target;

pub use job_id::JobId;
pub use port::{Port, PortError, PortRange, PortSpec};
pub use target::{Target, TargetError};

/// Serialize a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
