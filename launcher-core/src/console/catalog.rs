//! Console command catalog.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Press,
    Release,
    Tap,
    Bounce,
    Pot,
    Advance,
    Encoder,
    Set,
    Config,
    Status,
    Log,
    Help,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub tag: CommandTag,
    pub usage: &'static str,
    pub summary: &'static str,
}

impl CommandSpec {
    /// Returns `true` when `word` names this command.
    #[must_use]
    pub fn matches(&self, word: &str) -> bool {
        self.name.eq_ignore_ascii_case(word)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(word))
    }
}

const COMMANDS: [CommandSpec; 13] = [
    CommandSpec {
        name: "press",
        aliases: &[],
        tag: CommandTag::Press,
        usage: "press",
        summary: "hold the arm button down",
    },
    CommandSpec {
        name: "release",
        aliases: &[],
        tag: CommandTag::Release,
        usage: "release",
        summary: "let go of the arm button",
    },
    CommandSpec {
        name: "tap",
        aliases: &[],
        tag: CommandTag::Tap,
        usage: "tap [duration]",
        summary: "press, hold (default 100ms) and release",
    },
    CommandSpec {
        name: "bounce",
        aliases: &[],
        tag: CommandTag::Bounce,
        usage: "bounce [duration]",
        summary: "chatter the button for a while (default 20ms), ending released",
    },
    CommandSpec {
        name: "pot",
        aliases: &[],
        tag: CommandTag::Pot,
        usage: "pot <0-4095>",
        summary: "set the speed potentiometer reading",
    },
    CommandSpec {
        name: "advance",
        aliases: &["wait"],
        tag: CommandTag::Advance,
        usage: "advance <duration>",
        summary: "run the control loop for a while (up to 3600s)",
    },
    CommandSpec {
        name: "encoder",
        aliases: &[],
        tag: CommandTag::Encoder,
        usage: "encoder run|stall",
        summary: "let the gate encoder count or freeze it",
    },
    CommandSpec {
        name: "set",
        aliases: &[],
        tag: CommandTag::Set,
        usage: "set <option> <value>",
        summary: "change a launcher option while idle",
    },
    CommandSpec {
        name: "config",
        aliases: &[],
        tag: CommandTag::Config,
        usage: "config",
        summary: "list every option and its value",
    },
    CommandSpec {
        name: "status",
        aliases: &[],
        tag: CommandTag::Status,
        usage: "status",
        summary: "show state, outputs and the display",
    },
    CommandSpec {
        name: "log",
        aliases: &[],
        tag: CommandTag::Log,
        usage: "log",
        summary: "print recent controller events",
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        tag: CommandTag::Help,
        usage: "help [command|option]",
        summary: "describe commands or options",
    },
    CommandSpec {
        name: "exit",
        aliases: &["quit"],
        tag: CommandTag::Exit,
        usage: "exit",
        summary: "leave the emulator",
    },
];

/// Returns the full command catalog.
#[must_use]
pub const fn commands() -> &'static [CommandSpec] {
    &COMMANDS
}

/// Looks up a command by its tag.
#[must_use]
pub fn command(tag: CommandTag) -> &'static CommandSpec {
    COMMANDS
        .iter()
        .find(|spec| spec.tag == tag)
        .unwrap_or(&COMMANDS[0])
}

/// Finds a command by name or alias (case insensitive).
#[must_use]
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.matches(name))
}
