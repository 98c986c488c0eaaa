//! DPDP Shield: an incident-response console for data-breach handling
//! under India's DPDP Act.
//!
//! The binary talks to the DPDP Shield backend over its REST API; every
//! decision (breach steps, OTP verification, report generation) is made
//! server-side and this crate renders the results, either as a terminal
//! dashboard or through scripted subcommands.

pub mod api;
pub mod cli;
pub mod config;
pub mod poller;
pub mod session;
pub mod ui;
