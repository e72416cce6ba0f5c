//! # converterd
//!
//! Process wiring for the `converterd` daemon: command-line parsing,
//! tracing setup and OS signal forwarding. The polling and conversion
//! machinery lives in `converterd-core`; settings are resolved by
//! `converterd-config`.

pub mod cli;
pub mod signals;
pub mod telemetry;
