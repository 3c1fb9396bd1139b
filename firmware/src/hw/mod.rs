#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Hardware adapters that implement the `launcher-core` traits.
//!
//! The generic pieces (quadrature zeroing, H-bridge outputs, the character
//! display protocol) are written against `embedded-hal` traits so they run
//! under host tests; `board` binds them to the STM32G0 peripherals.

#[cfg(target_os = "none")]
pub mod board;
pub mod encoder;
pub mod lcd;
pub mod outputs;
