//! ARM instruction encoding for code generators and disassemblers.
//!
//! This crate bundles the [`codec`] with the [`logger`] setup. Most users
//! only need:
//!
//! ```no_run
//! use armature::{EncodingConfig, InstructionSet, LogKind, init_logger, select_encoding};
//!
//! let _guard = init_logger(LogKind::Stdout)?;
//! select_encoding(EncodingConfig::default())?;
//! let set = InstructionSet::from_registry()?;
//! assert!(set.decode(0xE081_0182).is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use codec::*;
pub use logger::{LogGuard, LogKind, init_logger, log_file};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn facade_exposes_the_codec() {
        let active = registry::ActiveEncoding::resolve(EncodingConfig {
            vfp: VfpMode::Hard,
            ..EncodingConfig::default()
        })
        .unwrap();
        let set = InstructionSet::from_active(&active);

        let word = 0xE081_0182;
        let instruction = set.decode(word).unwrap();
        assert_eq!(set.encode(&instruction), Ok(word));
        assert_eq!(set.version(), IsaVersion::ArmV5);
    }
}
