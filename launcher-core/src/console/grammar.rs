//! Line parser for the bench console.
//!
//! The command keyword is looked up in the [catalog](super::catalog); the
//! arguments are parsed with `winnow` combinators over the rest of the line.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, digit1, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::take_while;

use super::catalog::{self, CommandSpec, CommandTag};
use crate::config::{ConfigKey, ConfigValue, SpinUpOrder};
use crate::duty::ADC_MAX;

/// Longest span a single console duration may cover.
pub const MAX_SPAN: Duration = Duration::from_secs(3_600);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderMode {
    Run,
    Stall,
}

/// Parsed console command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleCommand<'a> {
    Press,
    Release,
    Tap(Option<Duration>),
    Bounce(Option<Duration>),
    Pot(u16),
    Advance(Duration),
    Encoder(EncoderMode),
    Set { key: ConfigKey, value: ConfigValue },
    Config,
    Status,
    Log,
    Help(Option<&'a str>),
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleError<'a> {
    Empty,
    UnknownCommand(&'a str),
    /// Arguments did not match the command's usage line.
    Usage(&'static CommandSpec),
    UnknownOption(&'a str),
    InvalidValue(ConfigKey),
}

impl fmt::Display for ConsoleError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Empty => f.write_str("empty command"),
            ConsoleError::UnknownCommand(word) => {
                write!(f, "unknown command `{word}` (try `help`)")
            }
            ConsoleError::Usage(spec) => write!(f, "usage: {}", spec.usage),
            ConsoleError::UnknownOption(word) => {
                write!(f, "unknown option `{word}` (try `config`)")
            }
            ConsoleError::InvalidValue(key) => match key {
                ConfigKey::SpinUp => write!(f, "{key} expects with-gate or after-gate"),
                ConfigKey::Chime => write!(f, "{key} expects on or off"),
                _ => write!(f, "{key} expects a number"),
            },
        }
    }
}

/// Parses one console line.
pub fn parse(line: &str) -> Result<ConsoleCommand<'_>, ConsoleError<'_>> {
    let line = line.trim();
    let keyword = line
        .split(|c: char| c.is_ascii_whitespace())
        .next()
        .filter(|word| !word.is_empty())
        .ok_or(ConsoleError::Empty)?;
    let spec = catalog::find(keyword).ok_or(ConsoleError::UnknownCommand(keyword))?;
    let args = &line[keyword.len()..];
    let usage = ConsoleError::Usage(spec);

    let command = match spec.tag {
        CommandTag::Press => no_args(args, ConsoleCommand::Press),
        CommandTag::Release => no_args(args, ConsoleCommand::Release),
        CommandTag::Config => no_args(args, ConsoleCommand::Config),
        CommandTag::Status => no_args(args, ConsoleCommand::Status),
        CommandTag::Log => no_args(args, ConsoleCommand::Log),
        CommandTag::Exit => no_args(args, ConsoleCommand::Exit),
        CommandTag::Tap => opt(preceded(space1, duration))
            .parse(args)
            .ok()
            .map(ConsoleCommand::Tap),
        CommandTag::Bounce => opt(preceded(space1, duration))
            .parse(args)
            .ok()
            .map(ConsoleCommand::Bounce),
        CommandTag::Advance => preceded(space1, duration)
            .parse(args)
            .ok()
            .map(ConsoleCommand::Advance),
        CommandTag::Pot => preceded(space1, pot_reading)
            .parse(args)
            .ok()
            .map(ConsoleCommand::Pot),
        CommandTag::Encoder => preceded(space1, encoder_mode)
            .parse(args)
            .ok()
            .map(ConsoleCommand::Encoder),
        CommandTag::Help => opt(preceded(space1, word))
            .parse(args)
            .ok()
            .map(ConsoleCommand::Help),
        CommandTag::Set => return parse_set(args, usage),
    };

    command.ok_or(usage)
}

fn no_args<'a>(args: &str, command: ConsoleCommand<'a>) -> Option<ConsoleCommand<'a>> {
    args.is_empty().then_some(command)
}

fn parse_set<'a>(
    args: &'a str,
    usage: ConsoleError<'a>,
) -> Result<ConsoleCommand<'a>, ConsoleError<'a>> {
    let mut input = args;
    let name = preceded(space1, word)
        .parse_next(&mut input)
        .map_err(|_| usage)?;
    let key = ConfigKey::from_name(name).ok_or(ConsoleError::UnknownOption(name))?;
    let value = preceded(space1, word)
        .parse(input)
        .map_err(|_| usage)?;

    let parsed = match key {
        ConfigKey::SpinUp => spin_up.parse(value).ok().map(ConfigValue::SpinUp),
        ConfigKey::Chime => switch.parse(value).ok().map(ConfigValue::Switch),
        ConfigKey::DebounceMs
        | ConfigKey::ArmedTimeoutMs
        | ConfigKey::GateHoldMs
        | ConfigKey::GatePhaseTimeoutMs => alt((duration_millis, number))
            .parse(value)
            .ok()
            .map(ConfigValue::Number),
        ConfigKey::GateTargetCounts
        | ConfigKey::GateOpenSpeed
        | ConfigKey::GateCloseSpeed
        | ConfigKey::MaxRpm => number.parse(value).ok().map(ConfigValue::Number),
    };

    parsed
        .map(|value| ConsoleCommand::Set { key, value })
        .ok_or(ConsoleError::InvalidValue(key))
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !c.is_ascii_whitespace()).parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<u32> {
    digit1
        .try_map(|digits: &str| digits.parse::<u32>())
        .parse_next(input)
}

fn pot_reading(input: &mut &str) -> ModalResult<u16> {
    digit1
        .try_map(|digits: &str| digits.parse::<u16>())
        .verify(|raw: &u16| *raw <= ADC_MAX)
        .parse_next(input)
}

/// `<n>ms` or `<n>s`, at most [`MAX_SPAN`].
fn duration(input: &mut &str) -> ModalResult<Duration> {
    (
        number,
        alt((Caseless("ms").value(1_u64), Caseless("s").value(1_000_u64))),
    )
        .map(|(value, scale)| Duration::from_millis(u64::from(value) * scale))
        .verify(|span: &Duration| *span <= MAX_SPAN)
        .parse_next(input)
}

fn duration_millis(input: &mut &str) -> ModalResult<u32> {
    duration
        .try_map(|span| u32::try_from(span.as_millis()))
        .parse_next(input)
}

fn encoder_mode(input: &mut &str) -> ModalResult<EncoderMode> {
    alt((
        Caseless("run").value(EncoderMode::Run),
        Caseless("stall").value(EncoderMode::Stall),
    ))
    .parse_next(input)
}

fn switch(input: &mut &str) -> ModalResult<bool> {
    alt((
        Caseless("on").value(true),
        Caseless("off").value(false),
        Caseless("true").value(true),
        Caseless("false").value(false),
    ))
    .parse_next(input)
}

fn spin_up(input: &mut &str) -> ModalResult<SpinUpOrder> {
    alt((
        Caseless("with-gate").value(SpinUpOrder::WithGate),
        Caseless("after-gate").value(SpinUpOrder::AfterGate),
    ))
    .parse_next(input)
}
