use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryMode {
    #[default]
    Strict,
    Permissive,
}

/// Caps on counts read from a buffer, on top of the check that every count
/// fits in the bytes that remain. The default is uncapped so anything the
/// encoder writes decodes; [`DecodeLimits::bounded`] opts into caps for
/// buffers from untrusted producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_numeric_args: usize,
    pub max_text_args: usize,
    /// Per text entry, in UTF-16 code units.
    pub max_text_units: usize,
    pub max_table_name_units: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DecodeLimits {
    pub fn unbounded() -> Self {
        Self {
            max_numeric_args: usize::MAX,
            max_text_args: usize::MAX,
            max_text_units: usize::MAX,
            max_table_name_units: usize::MAX,
        }
    }

    pub fn bounded() -> Self {
        Self {
            max_numeric_args: 64 * 1024,
            max_text_args: 16 * 1024,
            max_text_units: 4 * 1024,
            max_table_name_units: 1024,
        }
    }
}

/// Runtime configuration for command decoding and log replay.
#[derive(Debug, Clone)]
pub struct AlterConfig {
    pub max_numeric_args: usize,
    pub max_text_args: usize,
    pub max_text_units: usize,
    pub max_table_name_units: usize,
    pub max_frame_body_bytes: usize,
    pub recovery_mode: RecoveryMode,
}

impl Default for AlterConfig {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            max_numeric_args: limits.max_numeric_args,
            max_text_args: limits.max_text_args,
            max_text_units: limits.max_text_units,
            max_table_name_units: limits.max_table_name_units,
            max_frame_body_bytes: 64 * 1024 * 1024,
            recovery_mode: RecoveryMode::Strict,
        }
    }
}

impl AlterConfig {
    pub fn production() -> Self {
        Self {
            recovery_mode: RecoveryMode::Strict,
            ..Self::default()
        }
    }

    /// Replays as much of a damaged command log as possible instead of
    /// failing on the first corrupt frame.
    pub fn development() -> Self {
        Self {
            recovery_mode: RecoveryMode::Permissive,
            ..Self::default()
        }
    }

    pub fn strict_recovery(&self) -> bool {
        matches!(self.recovery_mode, RecoveryMode::Strict)
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_numeric_args: self.max_numeric_args,
            max_text_args: self.max_text_args,
            max_text_units: self.max_text_units,
            max_table_name_units: self.max_table_name_units,
        }
    }

    pub fn with_decode_limits(mut self, limits: DecodeLimits) -> Self {
        self.max_numeric_args = limits.max_numeric_args;
        self.max_text_args = limits.max_text_args;
        self.max_text_units = limits.max_text_units;
        self.max_table_name_units = limits.max_table_name_units;
        self
    }
}
