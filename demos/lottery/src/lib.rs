//! Double-or-nothing lottery built on oneway
//!
//! - [`reducer::Lottery`]: the store definition
//! - [`agent::DrawAgent`]: the draw service, bounded by a timeout
//! - [`flow::LotteryFlow`]: pushes the screen and shows an alert on a loss
//! - [`ui`]: projection, key mapping and ratatui rendering
//!
//! The binary in `main.rs` hosts all of it in a terminal.

pub mod action;
pub mod agent;
pub mod config;
pub mod events;
pub mod flow;
pub mod navigator;
pub mod reducer;
pub mod state;
pub mod ui;
