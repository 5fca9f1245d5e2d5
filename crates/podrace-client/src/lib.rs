//! `podrace-client`: async driver for a podrace race.
//!
//! Talks to the race service over HTTP and sequences one race at a time on
//! the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! RaceOrchestrator   ← start_race / cancel_race / accelerate
//!     │                 phase changes via podrace_core::lifecycle::transition
//!     ├──► RaceService (HttpRaceService)   create → start → status …
//!     ├──► Countdown       ← one beat, then one tick per second to the floor
//!     ├──► ProgressPoller  ← fixed interval, one fetch in flight at a time
//!     │
//!     ▼
//! SharedStore + Renderer ← view models, rendered synchronously
//! ```
//!
//! Both timers hand out a [`TimerHandle`]; cancelling it is idempotent and
//! guarantees no callback fires afterwards.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use podrace_client::{HttpRaceService, RaceOrchestrator};
//! use podrace_core::{config::ClientConfig, markup::HtmlRenderer, store::SharedStore};
//! use podrace_core::types::Selection;
//!
//! let config = ClientConfig::default();
//! let service = Arc::new(HttpRaceService::new(&config.server)?);
//! let orchestrator = RaceOrchestrator::new(
//!     service,
//!     SharedStore::default(),
//!     Arc::new(HtmlRenderer::new()),
//!     config.timing,
//! )?;
//! let outcome = orchestrator.start_race(Selection::new(3, 7)).await?;
//! ```

pub mod countdown;
pub mod orchestrator;
pub mod poller;
pub mod service;
pub mod timer;

#[cfg(test)]
mod testing;

pub use countdown::Countdown;
pub use orchestrator::RaceOrchestrator;
pub use poller::ProgressPoller;
pub use service::{HttpRaceService, RaceService, ServiceResult};
pub use timer::TimerHandle;
