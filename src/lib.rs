//! Parity Trace
//!
//! OpenEthereum (Parity) compatible tracers for EVM transaction execution:
//! a flat call-trace list (`callTracerParity`) and a per-account state diff
//! (`stateDiffTracer`), both driven by VM lifecycle hooks.
//!
//! This crate provides the core implementation for the
//! `parity-trace` CLI tool, which replays recorded hook streams.
//!
//! ## Getting Started
//!
//! ```bash
//! parity-trace replay --fixture tx.json --tracer callTracerParity
//! parity-trace --help
//! ```
//!
//! Embedding hosts implement [`state::StateReader`] and push events into a
//! [`hooks::Tracer`] obtained from [`api::new_tracer`].

pub mod api;
pub mod commands;
pub mod hooks;
pub mod output;
pub mod parity;
pub mod state;
pub mod tracers;
pub mod utils;
