//! Device driver implementations
//!
//! This crate provides concrete drivers for the devices the firmware
//! talks to, written against the caller-facing traits defined in
//! seismo-core so each driver can be tested on the host:
//!
//! - MMA8451Q 3-axis accelerometer (register map, bring-up, mode
//!   switching, XYZ burst reads)

#![no_std]
#![deny(unsafe_code)]

pub mod accel;
