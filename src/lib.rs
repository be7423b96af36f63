//! Zero Trust Security Platform - risk engine core
//!
//! Continuous risk scoring and access decisions over behavioral telemetry.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ZERO TRUST RISK ENGINE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────┐  ┌─────────────────────────┐│
//! │  │  Signal   │  │  Risk      │  │  Decision Policy        ││
//! │  │  Extractor│─▶│  Aggregator│─▶│  (level/decision/zone)  ││
//! │  └─────┬─────┘  └────────────┘  └─────────────────────────┘│
//! │        │                                                    │
//! │  ┌─────┴─────┐  ┌────────────┐  ┌─────────────────────────┐│
//! │  │  Event    │  │  Audit     │  │  Decision Service       ││
//! │  │  Store    │  │  Ledger    │◀─│  (orchestration)        ││
//! │  └───────────┘  └────────────┘  └─────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The HTTP transport, session handling and the workstation telemetry
//! collector live outside this crate; they call into [`service::DecisionService`].

pub mod config;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod risk;
pub mod service;
pub mod signals;
pub mod store;

pub use error::{EngineError, EngineResult};
pub use service::DecisionService;
