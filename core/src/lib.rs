//! Async client for the FirstPromoter tracking API.
//!
//! # Overview
//! Turns a [`TrackSignUpInput`] into one `POST /api/v2/track/signup`, sends it
//! over a caller-supplied [`Transport`], and parses the reply into a
//! [`TrackSignUpOutput`].
//!
//! # Design
//! - `Client` holds credentials, a base URL and the injected transport; it
//!   owns no connection pool of its own.
//! - The operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit and testable.
//! - Every call takes a [`Context`] for cancellation and deadlines.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//!
//! ```no_run
//! # async fn run() -> firstpromoter::Result<()> {
//! use std::time::Duration;
//! use firstpromoter::{Client, Context, TrackSignUpInput};
//!
//! let client = Client::new("acc_123", "sk_live_key", reqwest::Client::new());
//! let ctx = Context::background().with_timeout(Duration::from_secs(10));
//! let event = client
//!     .track_sign_up(&ctx, &TrackSignUpInput {
//!         email: Some("lead@example.com".into()),
//!         tid: Some("tid_from_cookie".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("tracked event {} for referral {}", event.id, event.referral.id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::Client;
pub use context::{CancelHandle, Context};
pub use error::{ContextError, Error, Result, TransportError};
pub use crate::http::{HttpRequest, HttpResponse};
pub use transport::Transport;
pub use types::{Referral, TrackSignUpInput, TrackSignUpOutput};
