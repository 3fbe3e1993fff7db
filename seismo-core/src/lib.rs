//! Board-agnostic core logic for the Seismo firmware
//!
//! This crate contains everything that does not depend on a specific
//! chip:
//!
//! - The interrupt-driven I2C master transaction engine ([`bus`])
//! - Median filtering for sensor samples ([`filter`])
//! - Caller-facing traits implemented by the engine and consumed by
//!   device drivers ([`traits`])
//!
//! The engine is generic over the register-level controller trait in
//! `seismo-hal`, so the whole crate is unit-tested on the host against
//! a scripted mock controller.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod filter;
pub mod traits;
