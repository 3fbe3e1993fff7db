//! Accelerometer drivers

pub mod mma8451q;

pub use mma8451q::{AccelError, AccelMode, Mma8451q, Sa0};
