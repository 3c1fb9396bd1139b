mod session;
mod sim;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use launcher_core::config::LauncherProfile;

use session::{Line, LineKind, Session};

const USAGE: &str =
    "Usage: launcher-emulator [--profile <standard|extended>] [--transcript <path>]";

#[derive(Debug, Eq, PartialEq)]
struct Options {
    profile: LauncherProfile,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let styled = stdout.is_tty();
    let mut writer = stdout.lock();
    let mut session = Session::new(options.profile, options.transcript.as_deref())?;
    let mut line = String::new();

    writeln!(
        writer,
        "Ball launcher emulator ({} profile). Type `help` for commands or `exit` to quit.",
        options.profile.label()
    )?;
    for row in session.display_lines() {
        writeln!(writer, "{}", render(&Line::row(row), styled))?;
    }

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let reply = session.handle_command(&line)?;
        for response in &reply.lines {
            writeln!(writer, "{}", render(response, styled))?;
        }
        if reply.exit {
            break;
        }
    }

    Ok(())
}

fn render(line: &Line, styled: bool) -> String {
    if !styled {
        return match line.kind {
            LineKind::Display => format!("|{}|", line.text),
            _ => line.text.clone(),
        };
    }
    match line.kind {
        LineKind::Info => line.text.clone(),
        LineKind::Event => line.text.clone().cyan().to_string(),
        LineKind::Display => format!(" {} ", line.text).black().on_green().to_string(),
        LineKind::Error => line.text.clone().red().bold().to_string(),
    }
}

fn parse_options(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        profile: LauncherProfile::Standard,
        transcript: None,
    };
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--profile=") {
            options.profile = parse_profile(value)?;
        } else if arg == "--profile" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --profile".to_string())?;
            options.profile = parse_profile(&value)?;
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args
                .next()
                .ok_or_else(|| "Expected path after --transcript".to_string())?;
            options.transcript = Some(PathBuf::from(value));
        } else {
            return Err(format!("Unexpected argument `{arg}`"));
        }
    }

    Ok(options)
}

fn parse_profile(tag: &str) -> Result<LauncherProfile, String> {
    LauncherProfile::from_tag(tag).ok_or_else(|| format!("Unknown launcher profile `{tag}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        parse_options(args.iter().map(|arg| (*arg).to_string()))
    }

    #[test]
    fn defaults_to_standard_profile() {
        assert_eq!(
            parse(&[]),
            Ok(Options {
                profile: LauncherProfile::Standard,
                transcript: None,
            })
        );
    }

    #[test]
    fn accepts_both_flag_spellings() {
        let options = parse(&["--profile", "EXTENDED", "--transcript=out/session.log"])
            .expect("options parse");
        assert_eq!(options.profile, LauncherProfile::Extended);
        assert_eq!(options.transcript, Some(PathBuf::from("out/session.log")));

        let options = parse(&["--profile=standard"]).expect("options parse");
        assert_eq!(options.profile, LauncherProfile::Standard);
    }

    #[test]
    fn rejects_unknown_input() {
        assert_eq!(
            parse(&["--profile", "turbo"]),
            Err("Unknown launcher profile `turbo`".to_string())
        );
        assert_eq!(
            parse(&["--profile"]),
            Err("Expected value after --profile".to_string())
        );
        assert_eq!(
            parse(&["reboot"]),
            Err("Unexpected argument `reboot`".to_string())
        );
    }

    #[test]
    fn plain_output_frames_display_rows() {
        let line = Line::row("IDLE RPM:    0  ".to_string());
        assert_eq!(render(&line, false), "|IDLE RPM:    0  |");
    }
}
