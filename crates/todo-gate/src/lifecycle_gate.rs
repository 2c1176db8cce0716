//! Pre-spawn lifecycle gate enforcement (spec §4.12).

use strum::{Display, EnumString};
use todo_utils::error::TodoError;
use todo_utils::paths::StorePaths;

use crate::manifest::{STAGE_ORDER, load};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum ProtocolType {
    Research,
    Consensus,
    Specification,
    Decomposition,
    Implementation,
    Contribution,
    Release,
}

impl ProtocolType {
    /// Stages from [`STAGE_ORDER`] that must be recorded before this
    /// protocol may spawn. `Contribution` requires the whole chain through
    /// `implementation`, matching its position as a post-implementation
    /// side branch.
    #[must_use]
    fn prerequisite_stages(self) -> &'static [&'static str] {
        let cutoff = match self {
            Self::Research => 0,
            Self::Consensus => 1,
            Self::Specification => 2,
            Self::Decomposition => 3,
            Self::Implementation | Self::Contribution => 4,
            Self::Release => 5,
        };
        &STAGE_ORDER[..cutoff]
    }
}

/// How a missing prerequisite is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Strict,
    Advisory,
    Off,
}

impl GateMode {
    #[must_use]
    pub fn from_config_str(raw: &str) -> Self {
        match raw {
            "strict" => Self::Strict,
            "off" => Self::Off,
            _ => Self::Advisory,
        }
    }
}

/// Check that every prerequisite stage for `protocol` is recorded as
/// completed or skipped in `epicId`'s manifest.
pub fn enforce(
    paths: &StorePaths,
    epic_id: &str,
    protocol: ProtocolType,
    mode: GateMode,
) -> Result<(), TodoError> {
    if mode == GateMode::Off {
        return Ok(());
    }

    let manifest = load(paths, epic_id)?;
    let missing: Vec<String> = protocol
        .prerequisite_stages()
        .iter()
        .filter(|stage| !manifest.is_satisfied(stage))
        .map(|s| (*s).to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    match mode {
        GateMode::Strict => Err(TodoError::LifecycleGateFailed { missing }),
        GateMode::Advisory => {
            tracing::warn!(epic_id, protocol = %protocol, ?missing, "lifecycle gate: missing prerequisite stage(s)");
            Ok(())
        }
        GateMode::Off => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{StageStatus, record_stage_completion};
    use camino::Utf8PathBuf;

    fn paths() -> (tempfile::TempDir, StorePaths) {
        let td = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join(".todo")).unwrap();
        (td, StorePaths::new(root))
    }

    #[test]
    fn strict_mode_fails_on_missing_prerequisite() {
        let (_td, paths) = paths();
        let result = enforce(&paths, "E1", ProtocolType::Specification, GateMode::Strict);
        assert!(matches!(result, Err(TodoError::LifecycleGateFailed { .. })));
    }

    #[test]
    fn advisory_mode_proceeds_despite_missing_prerequisite() {
        let (_td, paths) = paths();
        let result = enforce(&paths, "E1", ProtocolType::Specification, GateMode::Advisory);
        assert!(result.is_ok());
    }

    #[test]
    fn off_mode_skips_the_check_entirely() {
        let (_td, paths) = paths();
        let result = enforce(&paths, "E1", ProtocolType::Release, GateMode::Off);
        assert!(result.is_ok());
    }

    #[test]
    fn strict_mode_passes_once_prerequisites_recorded() {
        let (_td, paths) = paths();
        record_stage_completion(&paths, todo_lock::DEFAULT_TIMEOUT, "E1", "research", StageStatus::Completed).unwrap();
        record_stage_completion(&paths, todo_lock::DEFAULT_TIMEOUT, "E1", "consensus", StageStatus::Skipped).unwrap();
        let result = enforce(&paths, "E1", ProtocolType::Specification, GateMode::Strict);
        assert!(result.is_ok());
    }
}
