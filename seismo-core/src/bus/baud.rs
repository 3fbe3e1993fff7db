//! SCL divider search
//!
//! The controller derives its SCL rate from the module clock as
//! `module_clock / (multiplier × divider)`, where the divider comes from
//! a fixed 64-entry table indexed by the ICR register field and the
//! multiplier is ×1, ×2 or ×4.

use seismo_hal::i2c::{Divider, Multiplier};

/// Absolute tolerance around the requested SCL rate, in Hz
pub const TOLERANCE_HZ: u32 = 3_000;

/// SCL divider table, indexed by the ICR register field
pub const SCL_DIVIDERS: [u16; 64] = [
    20, 22, 24, 26, 28, 30, 34, 40, //
    28, 32, 36, 40, 44, 48, 56, 68, //
    48, 56, 64, 72, 80, 88, 104, 128, //
    80, 96, 112, 128, 144, 160, 192, 240, //
    160, 192, 224, 256, 288, 320, 384, 480, //
    320, 384, 448, 512, 576, 640, 768, 960, //
    640, 768, 896, 1024, 1152, 1280, 1536, 1920, //
    1280, 1536, 1792, 2048, 2304, 2560, 3072, 3840,
];

/// No divider pair reaches the requested rate
///
/// Fatal at initialization: the requested rate cannot be produced from
/// this module clock, so retrying is pointless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    /// The rate that could not be matched
    pub target_hz: u32,
}

/// SCL rate a divider pair produces from the given module clock
pub fn scl_rate(divider: Divider, module_clock_hz: u32) -> u32 {
    let total = divider.multiplier.factor() * SCL_DIVIDERS[divider.icr as usize] as u32;
    module_clock_hz / total
}

/// Find the first divider pair within [`TOLERANCE_HZ`] of `target_hz`
///
/// Scans table indices in ascending order and multipliers in ascending
/// order within each index, returning the first hit. The tie-break is
/// therefore deterministic: smallest table index, then smallest
/// multiplier.
pub fn find_divider(target_hz: u32, module_clock_hz: u32) -> Result<Divider, ConfigError> {
    for icr in 0..SCL_DIVIDERS.len() as u8 {
        for multiplier in Multiplier::ALL {
            let divider = Divider { icr, multiplier };
            if scl_rate(divider, module_clock_hz).abs_diff(target_hz) <= TOLERANCE_HZ {
                return Ok(divider);
            }
        }
    }
    Err(ConfigError { target_hz })
}
