#![no_std]

// Control logic for the ball launcher.
//
// Everything here is hardware-agnostic so the same state machine runs in the
// STM32 firmware and in the host-side emulator. Hardware enters through the
// traits in `controller` and `gate`.

pub mod config;
pub mod console;
pub mod controller;
pub mod duty;
pub mod gate;
pub mod input;
pub mod presentation;
pub mod telemetry;
pub mod time;
