//! Work-time accounting engine.
//!
//! Turns raw time-clock bookings into auditable daily values (gross, net,
//! target, overtime, undertime and break time with error and warning codes)
//! and rolls them up into monthly values with a configurable flextime credit
//! policy. Calculation stages live in [`calculation`], orchestration and the
//! background recalculation queue in [`service`], and persistence is reached
//! through the collaborator traits in [`store`].

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
