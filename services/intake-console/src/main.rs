//! MirrorLoop intake console
//!
//! Terminal front end for complaint intake.
//!
//! # Usage
//!
//! ```bash
//! intake-console submit --complaint "The checkout froze after I paid" --channel mobile
//! intake-console submit --complaint "..." --all-tabs --format json
//! intake-console vote --survey-id 123 --collector-id 456 --score 4 --question-index 0
//! intake-console answers 123
//! intake-console session
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shared::analysis_client::AnalysisClient;
use shared::config::Settings;
use shared::dto::{Channel, JourneyStage, Language, VoteRequest};
use shared::orchestrator::{FieldEdit, Orchestrator};
use shared::panel::Tab;
use shared::survey_client::{SurveyClient, SurveyGateway};
use strum::IntoEnumIterator;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod render;
mod session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "intake-console")]
#[command(version)]
#[command(about = "MirrorLoop complaint intake console", long_about = None)]
struct Cli {
    /// Feedback backend base URL
    #[arg(long, global = true, env = "MIRRORLOOP_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one complaint and print the case
    Submit {
        #[arg(long)]
        complaint: String,
        #[arg(long, default_value_t = Channel::Web)]
        channel: Channel,
        #[arg(long, default_value_t = JourneyStage::Checkout)]
        journey_stage: JourneyStage,
        #[arg(long, default_value_t = Language::English)]
        language: Language,
        #[arg(long)]
        order_id: Option<String>,
        /// Email or phone for follow-up
        #[arg(long)]
        contact: Option<String>,
        /// Typing speed reported by the form
        #[arg(long)]
        wpm: Option<u32>,
        /// Tab to print (structured, survey, plan, raw)
        #[arg(long, conflicts_with = "all_tabs")]
        tab: Option<Tab>,
        #[arg(long)]
        all_tabs: bool,
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Record one pulse-check vote
    Vote {
        #[arg(long)]
        survey_id: String,
        #[arg(long)]
        collector_id: String,
        #[arg(long)]
        score: u8,
        /// Zero-based question position
        #[arg(long)]
        question_index: usize,
    },
    /// List recorded answers for a survey
    Answers { survey_id: String },
    /// Interactive intake session
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::new()?;
    if let Some(base) = cli.api_base {
        settings.api_base = base;
    }
    info!(api_base = %settings.api_base(), synthesizer = ?settings.synthesizer, "intake console starting");

    match cli.command {
        Commands::Submit {
            complaint,
            channel,
            journey_stage,
            language,
            order_id,
            contact,
            wpm,
            tab,
            all_tabs,
            format,
        } => {
            let analysis = AnalysisClient::from_settings(&settings)?;
            let mut orch = Orchestrator::new(Arc::new(analysis));
            orch.edit(FieldEdit::Complaint(complaint));
            orch.edit(FieldEdit::Channel(channel));
            orch.edit(FieldEdit::JourneyStage(journey_stage));
            orch.edit(FieldEdit::Language(language));
            if let Some(id) = order_id {
                orch.edit(FieldEdit::OrderId(id));
            }
            if let Some(c) = contact {
                orch.edit(FieldEdit::EmailOrPhone(c));
            }
            orch.edit(FieldEdit::Wpm(wpm));

            let outcome = orch.submit().await;
            if let Some(note) = orch.notification() {
                eprintln!("{}", render::notification(note));
            }
            let Some(result) = orch.result() else {
                bail!("no case was captured ({outcome:?})");
            };

            match format {
                OutputFormat::Json => {
                    eprintln!("{}", render::header(result));
                    println!("{}", serde_json::to_string_pretty(&result.result)?);
                }
                OutputFormat::Text => {
                    println!("{}", render::header(result));
                    let tabs: Vec<Tab> = if all_tabs {
                        Tab::iter().collect()
                    } else {
                        vec![tab.unwrap_or_default()]
                    };
                    for t in tabs {
                        println!("\n{}\n", render::tab_bar(t));
                        println!("{}", render::tab(&result.result, orch.panel(), t));
                    }
                }
            }
        }
        Commands::Vote {
            survey_id,
            collector_id,
            score,
            question_index,
        } => {
            if !(1..=5).contains(&score) {
                bail!("score must be between 1 and 5");
            }
            let gateway = SurveyClient::from_settings(&settings)?;
            let request = VoteRequest {
                survey_id,
                collector_id,
                score,
                question_index,
            };
            if gateway.submit_vote(&request).await {
                println!("vote recorded");
            } else {
                bail!("backend did not confirm the vote");
            }
        }
        Commands::Answers { survey_id } => {
            let gateway = SurveyClient::from_settings(&settings)?;
            let answers = gateway.fetch_answers(&survey_id).await;
            println!("{}", render::answers(&answers));
        }
        Commands::Session => {
            let analysis = AnalysisClient::from_settings(&settings)?;
            let gateway = SurveyClient::from_settings(&settings)?;
            let orch = Orchestrator::new(Arc::new(analysis));
            session::Session::new(orch, Arc::new(gateway)).run().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_flags_parse_into_domain_types() {
        let cli = Cli::try_parse_from([
            "intake-console",
            "--api-base",
            "http://backend:8001",
            "submit",
            "--complaint",
            "Driver left the parcel outside in the rain.",
            "--channel",
            "delivery",
            "--journey-stage",
            "returns",
            "--language",
            "French",
            "--tab",
            "plan",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://backend:8001"));
        match cli.command {
            Commands::Submit {
                channel,
                journey_stage,
                language,
                tab,
                all_tabs,
                format,
                ..
            } => {
                assert_eq!(channel, Channel::Delivery);
                assert_eq!(journey_stage, JourneyStage::Returns);
                assert_eq!(language, Language::French);
                assert_eq!(tab, Some(Tab::ActionPlan));
                assert!(!all_tabs);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn tab_and_all_tabs_conflict() {
        let parsed = Cli::try_parse_from([
            "intake-console",
            "submit",
            "--complaint",
            "Something broke at checkout.",
            "--tab",
            "raw",
            "--all-tabs",
        ]);
        assert!(parsed.is_err());
    }
}
