//! Client-side core of the MirrorLoop complaint intake: the case data model,
//! configuration, the local result synthesizer, the backend analysis and survey
//! clients, and the session orchestrator the presentation layer drives.

pub mod analysis_client;
pub mod config;
pub mod dto;
pub mod error;
pub mod orchestrator;
pub mod panel;
pub mod survey_client;
pub mod synthesizer;
pub mod utils;
