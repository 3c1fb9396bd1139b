#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Glue between `launcher-core` and the Embassy runtime.
//!
//! Binds the controller to Embassy's monotonic clock, declares the
//! single-slot signals that carry status frames and buzzer notes from the
//! control task to the display task, and turns each [`TickReport`] into
//! defmt lines on target (stdout on host builds).

pub mod presenter;

use core::ops::Add;

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use launcher_core::controller::{DisarmReason, TickReport, Transition};
use launcher_core::duty::Duty;
use launcher_core::gate::GateTransition;
use launcher_core::presentation::{StatusFrame, Tone};
use launcher_core::time::ControlInstant;

#[cfg(target_os = "none")]
pub type LauncherMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
pub type LauncherMutex = NoopRawMutex;

/// Latest frame for the character display. Only the newest frame matters.
pub type FrameSignal = Signal<LauncherMutex, StatusFrame>;

/// Latest buzzer command; `None` silences it.
pub type ToneSignal = Signal<LauncherMutex, Option<Tone>>;

/// Embassy instant adapted to the controller's clock trait.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(target_os = "none")]
    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(value: Instant) -> Self {
        Self(value)
    }
}

impl Add<core::time::Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: core::time::Duration) -> Self::Output {
        let span = core_duration_to_embassy(rhs);
        Self(self.0.checked_add(span).unwrap_or(Instant::MAX))
    }
}

impl ControlInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> core::time::Duration {
        let elapsed = self.0.saturating_duration_since(earlier.0);
        core::time::Duration::from_micros(elapsed.as_micros())
    }
}

fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = duration.as_micros();
    let micros = u64::try_from(micros).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Logs everything a tick reported, in the order it happened.
pub fn log_report(report: &TickReport, now: FirmwareInstant) {
    let at_ms = now.into_embassy().as_millis();
    match report.transition {
        Some(Transition::Armed { duty }) => log_armed(duty, at_ms),
        Some(Transition::Disarmed { reason }) => log_disarmed(reason, at_ms),
        None => {}
    }
    if let Some(transition) = report.gate {
        log_gate(transition, at_ms);
    }
    if let Some(duty) = report.duty_changed {
        log_duty(duty, at_ms);
    }
}

#[cfg(target_os = "none")]
pub fn log_startup(duty: Duty, armed_timeout_ms: u64) {
    defmt::info!(
        "launcher: ready duty={} auto-disarm={}ms",
        duty.get(),
        armed_timeout_ms
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_startup(duty: Duty, armed_timeout_ms: u64) {
    println!(
        "launcher: ready duty={} auto-disarm={}ms",
        duty.get(),
        armed_timeout_ms
    );
}

#[cfg(target_os = "none")]
fn log_armed(duty: Duty, at_ms: u64) {
    defmt::info!("launcher: armed duty={} t={}ms", duty.get(), at_ms);
}

#[cfg(not(target_os = "none"))]
fn log_armed(duty: Duty, at_ms: u64) {
    println!("launcher: armed duty={} t={}ms", duty.get(), at_ms);
}

#[cfg(target_os = "none")]
fn log_disarmed(reason: DisarmReason, at_ms: u64) {
    defmt::info!("launcher: disarmed ({}) t={}ms", reason.label(), at_ms);
}

#[cfg(not(target_os = "none"))]
fn log_disarmed(reason: DisarmReason, at_ms: u64) {
    println!("launcher: disarmed ({}) t={}ms", reason.label(), at_ms);
}

#[cfg(target_os = "none")]
fn log_gate(transition: GateTransition, at_ms: u64) {
    defmt::info!(
        "gate: {} ended, {} at count {} t={}ms",
        transition.ended.label(),
        transition.cause.label(),
        transition.position,
        at_ms
    );
}

#[cfg(not(target_os = "none"))]
fn log_gate(transition: GateTransition, at_ms: u64) {
    println!(
        "gate: {} ended, {} at count {} t={}ms",
        transition.ended.label(),
        transition.cause.label(),
        transition.position,
        at_ms
    );
}

#[cfg(target_os = "none")]
fn log_duty(duty: Duty, at_ms: u64) {
    defmt::debug!("launcher: duty={} t={}ms", duty.get(), at_ms);
}

#[cfg(not(target_os = "none"))]
fn log_duty(duty: Duty, at_ms: u64) {
    println!("launcher: duty={} t={}ms", duty.get(), at_ms);
}
