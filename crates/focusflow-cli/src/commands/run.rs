use clap::Args;
use focusflow_core::{
    drive, Command, CoreError, Event, Notification, Notifier, Severity, TimerError, Update,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::open_app;

const HELP: &str =
    "commands: s start/resume, p pause, r reset, m <min> duration, n <name> nickname, q quit";

#[derive(Args)]
pub struct RunArgs {
    /// Session duration in minutes
    #[arg(long)]
    pub minutes: Option<u32>,
    /// Nickname to start with
    #[arg(long)]
    pub nickname: Option<String>,
}

/// Prints notifications to the terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, n: Notification) {
        match n.severity {
            Severity::Error => eprintln!("!! {}: {}", n.title, n.message),
            Severity::Info | Severity::Success => println!("** {}: {}", n.title, n.message),
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args));
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    result
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(TerminalNotifier)?;
    if let Some(nickname) = args.nickname {
        app.set_nickname(nickname)?;
    }
    if let Some(minutes) = args.minutes {
        app.configure_minutes(minutes)?;
    }

    let (tx, rx) = mpsc::channel(16);
    let input = tokio::spawn(read_commands(tx));

    println!("{HELP}");
    drive(&mut app, rx, render).await;
    input.abort();
    Ok(())
}

/// Forward stdin lines as commands until quit, Ctrl-C or a closed driver.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            // Input closed; keep the session running until Ctrl-C.
            Ok(None) => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "failed to wait for Ctrl-C");
                }
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(Command::Shutdown)) => break,
            Ok(Some(command)) => {
                if tx.send(command).await.is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    let _ = tx.send(Command::Shutdown).await;
}

/// Parse one line of interactive input. Blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(None),
        "s" | "start" => Command::Start,
        "p" | "pause" => Command::Pause,
        "r" | "reset" => Command::Reset,
        "q" | "quit" => Command::Shutdown,
        "m" | "minutes" => {
            let minutes = rest
                .parse::<u32>()
                .map_err(|_| format!("not a number of minutes: '{rest}'"))?;
            Command::ConfigureMinutes(minutes)
        }
        "n" | "nickname" => Command::SetNickname(rest.to_string()),
        "h" | "help" | "?" => return Err(HELP.to_string()),
        other => return Err(format!("unknown command '{other}'\n{HELP}")),
    };
    Ok(Some(command))
}

fn render(update: Update) {
    for event in &update.events {
        match event {
            Event::NicknameChanged { nickname, .. } => println!("nickname: {nickname}"),
            Event::SessionRecorded { nickname, .. } => println!("recorded session for {nickname}"),
            _ => {}
        }
    }
    // Identity and duration problems already reached the notifier.
    match &update.error {
        None
        | Some(CoreError::Timer(
            TimerError::IdentityRequired | TimerError::InvalidDuration { .. },
        )) => {}
        Some(e) => eprintln!("error: {e}"),
    }

    let s = &update.snapshot;
    let who = if s.nickname.is_empty() { "-" } else { s.nickname.as_str() };
    println!("{}  [{}]  {:>5.1}%  {}", s.clock, s.status, s.progress_pct, who);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_letter_commands() {
        assert_eq!(parse_command("s"), Ok(Some(Command::Start)));
        assert_eq!(parse_command(" p "), Ok(Some(Command::Pause)));
        assert_eq!(parse_command("r"), Ok(Some(Command::Reset)));
        assert_eq!(parse_command("q"), Ok(Some(Command::Shutdown)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(parse_command("m 10"), Ok(Some(Command::ConfigureMinutes(10))));
        assert_eq!(
            parse_command("n  Ada Lovelace "),
            Ok(Some(Command::SetNickname("Ada Lovelace".into())))
        );
        assert_eq!(parse_command("n"), Ok(Some(Command::SetNickname(String::new()))));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("m ten").is_err());
        assert!(parse_command("x").is_err());
    }
}
