//! Bench console: command catalog and line parser.
//!
//! Shared between the emulator and anything else that wants to drive a
//! [`LauncherController`](crate::controller::LauncherController) from text.

pub mod catalog;
pub mod grammar;

pub use catalog::{CommandSpec, CommandTag};
pub use grammar::{ConsoleCommand, ConsoleError, EncoderMode, parse};
