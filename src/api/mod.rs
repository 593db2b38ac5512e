//! HTTP API module for the work-time accounting engine.
//!
//! A thin axum layer over [`CalculationService`](crate::service::CalculationService)
//! and [`RecalcQueue`](crate::service::RecalcQueue): synchronous day and month
//! calculation, month closing and reopening, and queued range recalculation.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ActorRequest, RecalcRequest};
pub use response::{ApiError, ApiErrorResponse, RecalcAccepted};
pub use state::AppState;
