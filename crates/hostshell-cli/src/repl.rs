use std::borrow::Cow::{self, Borrowed, Owned};
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use hostshell_application::{SlotView, Surface};
use hostshell_core::remote::SharedStateHandle;
use hostshell_core::session::Role;
use hostshell_core::state::NotificationKind;

use crate::bootstrap::HostBootstrap;

const COMMANDS: &[&str] = &[
    "/login", "/logout", "/theme", "/notify", "/dismiss", "/clear", "/status", "/retry",
    "/reload", "/offline", "/online", "/help",
];

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Role),
    Logout,
    Theme,
    Notify { kind: NotificationKind, message: String },
    Dismiss(String),
    Clear,
    Status,
    Retry,
    Reload,
    Offline { scope: String, reason: String },
    Online(String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            return Ok(Command::Quit);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "/login" => rest
                .parse::<Role>()
                .map(Command::Login)
                .map_err(|_| "usage: /login customer|admin".to_string()),
            "/logout" => Ok(Command::Logout),
            "/theme" => Ok(Command::Theme),
            "/notify" => parse_notify(rest),
            "/dismiss" if !rest.is_empty() => Ok(Command::Dismiss(rest.to_string())),
            "/dismiss" => Err("usage: /dismiss <id>".to_string()),
            "/clear" => Ok(Command::Clear),
            "/status" => Ok(Command::Status),
            "/retry" => Ok(Command::Retry),
            "/reload" => Ok(Command::Reload),
            "/offline" => {
                let (scope, reason) = match rest.split_once(char::is_whitespace) {
                    Some((scope, reason)) => (scope, reason.trim()),
                    None => (rest, ""),
                };
                if scope.is_empty() {
                    return Err("usage: /offline <scope> [reason]".to_string());
                }
                let reason = if reason.is_empty() {
                    "connection refused"
                } else {
                    reason
                };
                Ok(Command::Offline {
                    scope: scope.to_string(),
                    reason: reason.to_string(),
                })
            }
            "/online" if !rest.is_empty() => Ok(Command::Online(rest.to_string())),
            "/online" => Err("usage: /online <scope>".to_string()),
            "/help" => Ok(Command::Help),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

/// `/notify [kind] <message>`; the kind defaults to info.
fn parse_notify(rest: &str) -> std::result::Result<Command, String> {
    let (kind, message) = match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => match first.parse::<NotificationKind>() {
            Ok(kind) => (kind, tail.trim()),
            Err(_) => (NotificationKind::Info, rest),
        },
        None => (NotificationKind::Info, rest),
    };
    if message.is_empty() {
        return Err("usage: /notify [info|success|warning|error] <message>".to_string());
    }
    Ok(Command::Notify {
        kind,
        message: message.to_string(),
    })
}

#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Runs the interactive shell until quit or EOF.
pub async fn run(host: &HostBootstrap) -> Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== hostshell ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/login customer' or '/login admin' to open a dashboard, '/help' for commands, or 'quit' to exit."
            .bright_black()
    );
    println!();
    print_surface(&host.gateway.render());

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match Command::parse(trimmed) {
                    Ok(Command::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Ok(command) => execute(host, command).await,
                    Err(message) => println!("{}", message.yellow()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

async fn execute(host: &HostBootstrap, command: Command) {
    let gateway = &host.gateway;
    // Notification commands act the way a mounted remote would
    let facet = host.store.facet(gateway.capabilities());

    match command {
        Command::Login(role) => {
            gateway.assume_role(role);
        }
        Command::Logout => {
            gateway.logout();
        }
        Command::Theme => host.store.toggle_theme(),
        Command::Notify { kind, message } => {
            let id = facet.add_notification(&message, kind);
            println!("{}", format!("Added notification {}", id).bright_black());
        }
        Command::Dismiss(id) => facet.dismiss_notification(&id),
        Command::Clear => facet.clear_notifications(),
        Command::Status => {}
        Command::Retry => {
            if !gateway.retry() {
                println!("{}", "Nothing to retry.".bright_black());
            }
        }
        Command::Reload => {
            if !gateway.reload() {
                println!("{}", "No remote is mounted.".bright_black());
            }
        }
        Command::Offline { scope, reason } => match &host.static_runtime {
            Some(runtime) => {
                runtime.take_offline(&scope, reason);
                println!(
                    "{}",
                    format!("{} is offline; /reload to see the effect.", scope).bright_black()
                );
            }
            None => println!("{}", "Outages can only be simulated for in-process remotes.".yellow()),
        },
        Command::Online(scope) => match &host.static_runtime {
            Some(runtime) => {
                runtime.bring_online(&scope);
                println!(
                    "{}",
                    format!("{} is online; /reload to see the effect.", scope).bright_black()
                );
            }
            None => println!("{}", "Outages can only be simulated for in-process remotes.".yellow()),
        },
        Command::Help => {
            print_help();
            return;
        }
        Command::Quit => return,
    }

    let surface = gateway.render();
    print_surface(&surface);

    if is_loading(&surface) {
        let limit = host
            .config
            .composition
            .resolve_timeout()
            .unwrap_or(Duration::from_secs(30));
        if tokio::time::timeout(limit, gateway.wait_settled()).await.is_ok() {
            print_surface(&gateway.render());
        }
    }
}

fn is_loading(surface: &Surface) -> bool {
    surface
        .dashboard()
        .is_some_and(|view| matches!(view.body, SlotView::Loading(_)))
}

fn print_surface(surface: &Surface) {
    match surface {
        Surface::Splash => println!("{}", surface.to_string().bright_black()),
        Surface::Landing => println!("{}", surface.to_string().bright_white()),
        Surface::Dashboard(view) => {
            println!("{}", view.header.to_string().bright_magenta().bold());
            let body = view.body.to_string();
            match view.body {
                SlotView::Loading(_) => println!("{}", body.bright_black()),
                SlotView::Mounted { .. } => {
                    for line in body.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
                SlotView::Unavailable { ref reason, .. } => {
                    println!("{}", body.yellow());
                    println!("{}", format!("({})", reason).bright_black());
                }
                SlotView::Crashed { .. } => println!("{}", body.red()),
            }
        }
    }
    println!();
}

fn print_help() {
    let lines = [
        ("/login customer|admin", "sign in with the demo identity for a role"),
        ("/logout", "sign out and return to the landing page"),
        ("/theme", "toggle light/dark"),
        ("/notify [kind] <message>", "post a notification (info, success, warning, error)"),
        ("/dismiss <id>", "dismiss one notification"),
        ("/clear", "clear all notifications"),
        ("/status", "show the current page"),
        ("/retry", "retry after a crash or a failed load"),
        ("/reload", "resolve the mounted remote again"),
        ("/offline <scope> [reason]", "simulate an unreachable remote"),
        ("/online <scope>", "end a simulated outage"),
        ("quit", "exit"),
    ];
    for (command, description) in lines {
        println!("  {:<28}{}", command.bright_cyan(), description.bright_black());
    }
    println!();
}
