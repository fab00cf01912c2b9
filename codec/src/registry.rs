//! # Encoding registry
//!
//! The process picks its encoding once, at startup, through
//! [`select_encoding`]. The choice cannot be changed or repeated afterwards:
//! a second call is a wiring bug and is reported as
//! [`CodecError::DoubleInitialization`]. Reading the selection before it was
//! made is [`CodecError::NotConfigured`]; there is no fallback default.
//!
//! Selection is serialized behind a lock. Once set, reads go through a
//! [`OnceCell`] and never take the lock again.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::arm::encoding::ArmV5Encoding;
use crate::bitwise::FieldVerification;
use crate::error::{CodecError, Result};
use crate::vfp::encoding::VfpV2Encoding;

/// Base instruction set revision.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsaVersion {
    ArmV4,
    #[default]
    ArmV5,
    ArmV6M,
    ArmV7M,
    ArmV7R,
    ArmV7A,
}

impl fmt::Display for IsaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArmV4 => f.write_str("ARMv4"),
            Self::ArmV5 => f.write_str("ARMv5"),
            Self::ArmV6M => f.write_str("ARMv6-M"),
            Self::ArmV7M => f.write_str("ARMv7-M"),
            Self::ArmV7R => f.write_str("ARMv7-R"),
            Self::ArmV7A => f.write_str("ARMv7-A"),
        }
    }
}

/// Floating point profile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VfpMode {
    #[default]
    None,
    /// Floating point in library calls; no coprocessor instructions.
    Soft,
    /// VFPv2 coprocessor present.
    Hard,
}

impl fmt::Display for VfpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("no VFP"),
            Self::Soft => f.write_str("soft-float"),
            Self::Hard => f.write_str("VFP"),
        }
    }
}

/// Everything the registry needs to pick the encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub isa: IsaVersion,
    pub vfp: VfpMode,
    #[serde(default)]
    pub verification: FieldVerification,
}

/// The concrete encodings chosen for a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEncoding {
    pub version: IsaVersion,
    pub base: ArmV5Encoding,
    pub vfp: Option<VfpV2Encoding>,
}

impl ActiveEncoding {
    /// Maps a configuration to its concrete encodings.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedProfile`] for any revision other than ARMv4
    /// and ARMv5.
    pub fn resolve(config: EncodingConfig) -> Result<Self> {
        let EncodingConfig {
            isa,
            vfp,
            verification,
        } = config;

        if !matches!(isa, IsaVersion::ArmV4 | IsaVersion::ArmV5) {
            return Err(CodecError::UnsupportedProfile { isa, vfp });
        }

        let vfp = match vfp {
            VfpMode::Hard => Some(VfpV2Encoding::new(verification)),
            VfpMode::Soft => {
                warn!("soft-float requested for {isa}, VFP instructions are disabled");
                None
            }
            VfpMode::None => None,
        };

        Ok(Self {
            version: isa,
            base: ArmV5Encoding::new(verification),
            vfp,
        })
    }
}

pub(crate) struct Registry {
    active: OnceCell<ActiveEncoding>,
    setup: Mutex<()>,
}

impl Registry {
    pub(crate) const fn new() -> Self {
        Self {
            active: OnceCell::new(),
            setup: Mutex::new(()),
        }
    }

    pub(crate) fn select(&self, config: EncodingConfig) -> Result<&ActiveEncoding> {
        let _guard = self.setup.lock().unwrap_or_else(PoisonError::into_inner);

        if self.active.get().is_some() {
            error!("encoding selected twice, keeping the first selection");
            return Err(CodecError::DoubleInitialization);
        }

        let encoding = ActiveEncoding::resolve(config).inspect_err(|e| error!("{e}"))?;
        info!(
            "selected {} encoding with {}",
            encoding.version,
            if encoding.vfp.is_some() { "VFPv2" } else { "no VFP" }
        );

        Ok(self.active.get_or_init(|| encoding))
    }

    pub(crate) fn active(&self) -> Result<&ActiveEncoding> {
        self.active.get().ok_or(CodecError::NotConfigured)
    }
}

static REGISTRY: Registry = Registry::new();

/// Selects the process-wide encoding. Must be called exactly once.
///
/// # Errors
///
/// - [`CodecError::UnsupportedProfile`] when `config` names a revision
///   without an encoding.
/// - [`CodecError::DoubleInitialization`] on every call after the first
///   successful one.
pub fn select_encoding(config: EncodingConfig) -> Result<()> {
    REGISTRY.select(config).map(|_| ())
}

/// The process-wide encoding.
///
/// # Errors
///
/// [`CodecError::NotConfigured`] before [`select_encoding`] succeeded.
pub fn active_encoding() -> Result<&'static ActiveEncoding> {
    REGISTRY.active()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HARD: EncodingConfig = EncodingConfig {
        isa: IsaVersion::ArmV5,
        vfp: VfpMode::Hard,
        verification: FieldVerification::Checked,
    };

    #[test]
    fn unconfigured_registry_is_an_error() {
        let registry = Registry::new();
        assert_eq!(registry.active(), Err(CodecError::NotConfigured));
    }

    #[test]
    fn select_once() {
        let registry = Registry::new();
        let active = *registry.select(HARD).unwrap();
        assert_eq!(active.version, IsaVersion::ArmV5);
        assert_eq!(
            active.vfp,
            Some(VfpV2Encoding::new(FieldVerification::Checked))
        );
        assert_eq!(registry.active(), Ok(&active));

        assert_eq!(
            registry.select(EncodingConfig::default()),
            Err(CodecError::DoubleInitialization)
        );
        // the first selection survives
        assert_eq!(registry.active(), Ok(&active));
    }

    #[test]
    fn unsupported_revisions() {
        for isa in [
            IsaVersion::ArmV6M,
            IsaVersion::ArmV7M,
            IsaVersion::ArmV7R,
            IsaVersion::ArmV7A,
        ] {
            let registry = Registry::new();
            let config = EncodingConfig { isa, ..HARD };
            assert_eq!(
                registry.select(config),
                Err(CodecError::UnsupportedProfile {
                    isa,
                    vfp: VfpMode::Hard
                })
            );
            assert_eq!(registry.active(), Err(CodecError::NotConfigured));
        }
    }

    #[test]
    fn soft_float_means_no_vfp() {
        let config = EncodingConfig {
            isa: IsaVersion::ArmV4,
            vfp: VfpMode::Soft,
            verification: FieldVerification::Unchecked,
        };
        let active = ActiveEncoding::resolve(config).unwrap();
        assert_eq!(active.version, IsaVersion::ArmV4);
        assert_eq!(active.vfp, None);
    }

    #[test]
    fn default_configuration() {
        assert_eq!(
            EncodingConfig::default(),
            EncodingConfig {
                isa: IsaVersion::ArmV5,
                vfp: VfpMode::None,
                verification: FieldVerification::Unchecked,
            }
        );
        assert_eq!(IsaVersion::ArmV7A.to_string(), "ARMv7-A");
        assert_eq!(VfpMode::Soft.to_string(), "soft-float");
    }
}
