//! Verification gates and lifecycle-stage enforcement (spec §4.11, §4.12).

pub mod gate;
pub mod lifecycle_gate;
pub mod manifest;

pub use gate::{gate_status, reset, set_gate};
pub use lifecycle_gate::{enforce, GateMode, ProtocolType};
pub use manifest::{record_stage_completion, Manifest, StageEntry, StageStatus, STAGE_ORDER};
