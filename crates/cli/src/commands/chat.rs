use std::io::{self, BufRead, Write};

use folio_agent::{
    AnswerSource, ChatRenderer, ChatRuntime, ChatSession, NotificationSink, Role, TurnOutcome,
};
use folio_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use folio_server::bootstrap::bootstrap_with_config;

use crate::commands::CommandResult;

const QUIT_COMMANDS: [&str; 3] = ["/quit", "/exit", ":q"];

#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    pub no_pacing: bool,
    pub owner: Option<String>,
}

/// Prints bubbles as prefixed lines. The typing indicator is a single
/// placeholder line.
pub struct TerminalRenderer<W> {
    out: W,
    assistant_label: String,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, owner_name: &str) -> Self {
        let first = owner_name.split_whitespace().next().unwrap_or(owner_name);
        Self { out, assistant_label: format!("{first}'s assistant") }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        // A closed stdout ends the session on the next read; nothing to do here.
        let _ = writeln!(self.out, "{line}");
    }
}

impl<W: Write + Send> ChatRenderer for TerminalRenderer<W> {
    fn append(&mut self, role: Role, text: &str) {
        match role {
            Role::User => self.write_line(&format!("you: {text}")),
            Role::Assistant => {
                let line = format!("{}: {text}", self.assistant_label);
                self.write_line(&line);
            }
        }
    }

    fn show_typing(&mut self) {
        self.write_line("  ...");
    }

    fn hide_typing(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: u32,
    pub rejected: u32,
    pub leads_delivered: u32,
}

pub fn run(options: ChatOptions) -> CommandResult {
    let load = LoadOptions {
        overrides: ConfigOverrides {
            owner_name: options.owner,
            pacing_disabled: options.no_pacing,
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(load) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let app = bootstrap_with_config(config).await.map_err(|error| error.to_string())?;
        let mut renderer = TerminalRenderer::new(io::stdout(), &app.config.owner.name);
        renderer.append(Role::Assistant, &welcome(&app.config));
        let stdin = io::stdin();
        let summary = run_session(app.runtime.as_ref(), stdin.lock(), &mut renderer)
            .await
            .map_err(|error| format!("terminal i/o failed: {error}"))?;
        Ok::<_, String>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success(
            "chat",
            format!(
                "session ended after {} message(s); {} refused, {} lead(s) delivered",
                summary.turns, summary.rejected, summary.leads_delivered
            ),
        ),
        Err(error) => CommandResult::failure("chat", "bootstrap", error, 4),
    }
}

fn welcome(config: &AppConfig) -> String {
    let first = config.owner.name.split_whitespace().next().unwrap_or(&config.owner.name);
    format!(
        "Hi! I can tell you about {first}'s projects and expertise, or help you get in touch. Type /quit to leave."
    )
}

/// Reads visitor lines until end of input or a quit command, feeding each
/// through one chat session.
pub async fn run_session<A, N, I, R>(
    runtime: &ChatRuntime<A, N>,
    input: I,
    renderer: &mut R,
) -> io::Result<SessionSummary>
where
    A: AnswerSource,
    N: NotificationSink,
    I: BufRead,
    R: ChatRenderer + ?Sized,
{
    let mut chat = ChatSession::start(chrono::Utc::now());
    let mut summary = SessionSummary::default();

    for line in input.lines() {
        let line = line?;
        if QUIT_COMMANDS.contains(&line.trim()) {
            break;
        }

        let report = runtime.handle_message(&mut chat, &line, renderer).await;
        match report.outcome {
            TurnOutcome::Ignored => continue,
            TurnOutcome::Rejected { .. } | TurnOutcome::OffTopic => summary.rejected += 1,
            TurnOutcome::Answered { .. } => {}
        }
        summary.turns += 1;
        if report.lead_delivered {
            summary.leads_delivered += 1;
        }
    }

    Ok(summary)
}
