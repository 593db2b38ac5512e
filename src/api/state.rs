//! Application state for the work-time accounting API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::service::{CalculationService, RecalcQueue};

/// Shared application state.
///
/// Holds the calculation service for synchronous requests and the
/// recalculation queue for background triggers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<CalculationService>,
    queue: Arc<RecalcQueue>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(service: Arc<CalculationService>, queue: Arc<RecalcQueue>) -> Self {
        Self { service, queue }
    }

    /// Returns the calculation service.
    pub fn service(&self) -> &CalculationService {
        &self.service
    }

    /// Returns the recalculation queue.
    pub fn queue(&self) -> &RecalcQueue {
        &self.queue
    }
}
