//! Kinetis MK70F12 HAL for Seismo
//!
//! Register-level implementations of the `seismo-hal` traits for the
//! K70 tower board. No maintained peripheral access crate exists for
//! this part, so the handful of registers the firmware needs are
//! addressed directly with volatile reads and writes; everything above
//! this crate stays free of `unsafe`.

#![no_std]

pub mod i2c;
pub mod interrupt;
pub mod led;
