//! # QR Login Tickets
//!
//! Short-lived login tickets that let a signed-in phone authorize a desktop
//! session by scanning a QR code.
//!
//! ## Flow
//!
//! ```text
//! Desktop                      Server                       Phone
//!    │── GET /getqrcode ───────►│ issue: PENDING             │
//!    │◄── PNG + uuid header ────│                            │
//!    │                          │◄──── POST /login ──────────│ (scanned QR)
//!    │                          │ claim: CLAIMED by user     │
//!    │── POST /checkuuid ──────►│ poll: consume              │
//!    │◄── user_id ──────────────│                            │
//! ```
//!
//! The desktop polls repeatedly until it gets `success`, or `expired` once
//! the ticket outlives its TTL.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qrlogin_auth::{TicketConfig, TicketService};
//! use qrlogin_auth::stores::{JsonFileBackend, TableTicketStore};
//!
//! let store = TableTicketStore::open(JsonFileBackend::new("tickets.json")).await;
//! let service = TicketService::new(store, ids, SystemClock, TicketConfig::default());
//!
//! let issued = service.issue("10.0.0.7").await?;
//! ```
//!
//! ## Features
//!
//! - `axum`: HTTP handlers and [`router::qr_login_router`]
//! - `test-utils` (default): mock providers in [`mocks`]

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod providers;
pub mod service;
pub mod state;
pub mod stores;
pub mod sweeper;

/// Mock providers for testing.
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

/// HTTP handlers (requires `axum` feature).
#[cfg(feature = "axum")]
pub mod handlers;

/// Router composition (requires `axum` feature).
#[cfg(feature = "axum")]
pub mod router;

// Re-export main types for convenience
pub use config::{ReclaimPolicy, TicketConfig};
pub use error::{Result, TicketError};
pub use outcome::{ClaimOutcome, IssuedTicket, PollOutcome};
pub use service::TicketService;
pub use state::{Ticket, TicketId, TicketStatus, UserId};
pub use sweeper::spawn_sweeper;

#[cfg(feature = "axum")]
pub use handlers::QrLoginState;
#[cfg(feature = "axum")]
pub use router::qr_login_router;
