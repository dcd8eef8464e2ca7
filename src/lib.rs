//! Incremental harvest of a read-it-later inbox: windowed listing, content
//! export, optional LLM summaries, flat-file artifacts.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod remote;
pub mod run;
pub mod store;
pub mod summarize;
