//! Line-oriented interactive session over one orchestrator.
//!
//! `submit` only starts the analysis. Its outcome comes back over a channel and
//! is settled between input lines, so the session keeps reading commands while
//! the backend call is in flight.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use shared::dto::{AnalysisOutcome, Channel, JourneyStage, Language};
use shared::error::AppError;
use shared::orchestrator::{FieldEdit, Orchestrator, SubmitOutcome};
use shared::panel::{Tab, VoteOutcome};
use shared::survey_client::SurveyGateway;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::render;

pub const HELP: &str = "\
commands:
  set complaint <text>        set <channel|stage|language> <value>
  set order <id>              set contact <email or phone>
  set wpm <n>                 show
  submit                      tab <structured|survey|plan|raw>
  vote <question> <1-5>       answers
  new                         dismiss
  help                        quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(FieldEdit),
    Show,
    Submit,
    Tab(Tab),
    /// Question number as shown (1-based) and score.
    Vote { question: usize, score: u8 },
    Answers,
    New,
    Dismiss,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match word.to_ascii_lowercase().as_str() {
        "set" => parse_set(rest).map(Command::Set),
        "show" => Ok(Command::Show),
        "submit" => Ok(Command::Submit),
        "tab" => rest
            .parse::<Tab>()
            .map(Command::Tab)
            .map_err(|_| anyhow!("unknown tab '{rest}'")),
        "vote" => {
            let mut parts = rest.split_whitespace();
            let question = parts
                .next()
                .and_then(|q| q.parse::<usize>().ok())
                .filter(|q| *q >= 1)
                .ok_or_else(|| anyhow!("usage: vote <question> <1-5>"))?;
            let score = parts
                .next()
                .and_then(|s| s.parse::<u8>().ok())
                .ok_or_else(|| anyhow!("usage: vote <question> <1-5>"))?;
            Ok(Command::Vote { question, score })
        }
        "answers" => Ok(Command::Answers),
        "new" => Ok(Command::New),
        "dismiss" => Ok(Command::Dismiss),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Err(anyhow!("empty command")),
        other => Err(anyhow!("unknown command '{other}', try 'help'")),
    }
}

fn parse_set(rest: &str) -> Result<FieldEdit> {
    let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let value = value.trim();
    let edit = match field.to_ascii_lowercase().as_str() {
        "complaint" => FieldEdit::Complaint(value.to_string()),
        "channel" => FieldEdit::Channel(
            value
                .parse::<Channel>()
                .map_err(|_| anyhow!("channel must be web, mobile, in_store or delivery"))?,
        ),
        "stage" | "journey-stage" => FieldEdit::JourneyStage(value.parse::<JourneyStage>().map_err(
            |_| anyhow!("stage must be browse, product, checkout, support, returns or other"),
        )?),
        "language" => FieldEdit::Language(
            value
                .parse::<Language>()
                .map_err(|_| anyhow!("language must be English, French, Arabic or Other"))?,
        ),
        "order" | "order-id" => FieldEdit::OrderId(value.to_string()),
        "contact" => FieldEdit::EmailOrPhone(value.to_string()),
        "wpm" if value.is_empty() => FieldEdit::Wpm(None),
        "wpm" => FieldEdit::Wpm(Some(
            value.parse().map_err(|_| anyhow!("wpm must be a number"))?,
        )),
        other => return Err(anyhow!("unknown field '{other}'")),
    };
    Ok(edit)
}

/// Analysis outcome tagged with the submission token it belongs to.
type Settlement = (u64, Result<AnalysisOutcome, AppError>);

enum Event {
    Line(Option<String>),
    Settled(Settlement),
}

pub struct Session {
    orchestrator: Orchestrator,
    gateway: Arc<dyn SurveyGateway>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, gateway: Arc<dyn SurveyGateway>) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            gateway,
            settled_tx,
            settled_rx,
        }
    }

    pub fn prompt(&self) -> String {
        let state = if self.orchestrator.loading() {
            "busy"
        } else if self.orchestrator.submit_enabled() {
            "ready"
        } else {
            "draft"
        };
        format!("mirrorloop ({state})> ")
    }

    /// Runs one command and returns the text to show.
    pub async fn execute(&mut self, command: Command) -> String {
        debug!(?command, "session command");
        let orch = &mut self.orchestrator;
        match command {
            Command::Set(edit) => {
                if orch.edit(edit) {
                    "ok".into()
                } else {
                    "busy, edit ignored".into()
                }
            }
            Command::Show => serde_json::to_string_pretty(orch.input()).unwrap_or_default(),
            Command::Submit => match orch.begin_submit() {
                Ok(pending) => {
                    let token = pending.token;
                    let analysis = orch.dispatch(&pending);
                    let tx = self.settled_tx.clone();
                    tokio::spawn(async move {
                        if tx.send((token, analysis.await)).is_err() {
                            debug!(token, "session closed before analysis finished");
                        }
                    });
                    "analyzing...".into()
                }
                Err(SubmitOutcome::Busy) => "busy, a submission is already in flight".into(),
                Err(_) => orch
                    .notification()
                    .map(render::notification)
                    .unwrap_or_default(),
            },
            Command::Tab(tab) => {
                if !orch.select_tab(tab) {
                    return "busy, tab unchanged".into();
                }
                match orch.result() {
                    Some(result) => format!(
                        "{}\n{}",
                        render::tab_bar(tab),
                        render::tab(&result.result, orch.panel(), tab)
                    ),
                    None => "no case yet, submit a complaint first".into(),
                }
            }
            Command::Vote { question, score } => {
                match orch.vote(question - 1, score, self.gateway.as_ref()).await {
                    VoteOutcome::Recorded { delivered: true } => "vote recorded".into(),
                    VoteOutcome::Recorded { delivered: false } => {
                        "vote recorded locally, backend did not confirm".into()
                    }
                    VoteOutcome::AlreadyVoted => "already voted on that question".into(),
                    VoteOutcome::NoSurvey => "this case has no live survey".into(),
                    VoteOutcome::UnknownQuestion => format!("no question {question}"),
                    VoteOutcome::InvalidScore => "score must be between 1 and 5".into(),
                }
            }
            Command::Answers => {
                orch.refresh_answers(self.gateway.as_ref()).await;
                render::answers(orch.panel().answers())
            }
            Command::New => {
                orch.reset();
                "new case started".into()
            }
            Command::Dismiss => {
                orch.dismiss_notification();
                String::new()
            }
            Command::Help => HELP.into(),
            Command::Quit => String::new(),
        }
    }

    /// Applies an arrived analysis outcome and returns the text to show.
    /// Outcomes of abandoned submissions produce no output.
    pub fn settle(&mut self, (token, outcome): Settlement) -> String {
        let orch = &mut self.orchestrator;
        let settled = orch.settle(token, outcome);
        if settled == SubmitOutcome::Discarded {
            return String::new();
        }
        let mut out = orch
            .notification()
            .map(render::notification)
            .unwrap_or_default();
        if let (SubmitOutcome::Captured { .. }, Some(result)) = (&settled, orch.result()) {
            let tab = orch.panel().tab();
            out.push('\n');
            out.push_str(&render::header(result));
            out.push('\n');
            out.push_str(&render::tab_bar(tab));
            out.push('\n');
            out.push_str(&render::tab(&result.result, orch.panel(), tab));
        }
        out
    }

    /// Waits for the next analysis outcome and settles it.
    pub async fn next_settlement(&mut self) -> String {
        match self.settled_rx.recv().await {
            Some(settlement) => self.settle(settlement),
            None => String::new(),
        }
    }

    /// Reads commands from stdin until `quit` or end of input, settling
    /// analysis outcomes as they arrive.
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{HELP}\n").as_bytes()).await?;
        loop {
            stdout.write_all(self.prompt().as_bytes()).await?;
            stdout.flush().await?;
            let event = tokio::select! {
                line = lines.next_line() => Event::Line(line?),
                Some(settlement) = self.settled_rx.recv() => Event::Settled(settlement),
            };
            let line = match event {
                Event::Line(Some(line)) => line,
                Event::Line(None) => break,
                Event::Settled(settlement) => {
                    let out = self.settle(settlement);
                    if !out.is_empty() {
                        stdout.write_all(format!("\n{out}\n").as_bytes()).await?;
                    }
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let command = match parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    stdout.write_all(format!("{e}\n").as_bytes()).await?;
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            let out = self.execute(command).await;
            if !out.is_empty() {
                stdout.write_all(format!("{out}\n").as_bytes()).await?;
            }
        }
        Ok(())
    }
}
