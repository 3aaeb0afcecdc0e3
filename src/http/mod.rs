//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → proxy.rs (select backend, forward)
//!         → request.rs (target URI, hop-by-hop, X-Forwarded-For, bearer)
//!         → body.rs (signal end of upload, arms the header deadline)
//!         → outbound client (net::connector)
//!     → response.rs (relay backend response, or 502/503)
//!     → upgrade.rs (on 101, splice client and backend connections)
//!     → Send to client
//! ```

pub mod body;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod upgrade;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer, ServerError};
