//! HTTP surface over the scheduler and team services
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   Hiel Server                    │
//! │                                                  │
//! │  ┌────────────────────────────────────────────┐  │
//! │  │                 REST API                   │  │
//! │  │  GET  /api/health                          │  │
//! │  │  GET  /api/weeks/{date}                    │  │
//! │  │  GET  /api/months/{year_month}             │  │
//! │  │  PUT  /api/attendance                      │  │
//! │  │  GET  /api/rosters/{date}                  │  │
//! │  │  PUT  /api/rosters/{date}                  │  │
//! │  │  GET  /api/rosters/{date}/available/..     │  │
//! │  │  GET|POST|DELETE /api/session              │  │
//! │  │  GET  /api/members                         │  │
//! │  │  GET  /api/songs?q=                        │  │
//! │  │  GET  /api/surveys                         │  │
//! │  │  POST /api/surveys/{id}/responses          │  │
//! │  │  GET  /api/surveys/{id}/tally/{question}   │  │
//! │  │  GET  /api/calendar/{date}                 │  │
//! │  │  GET  /api/service-records?q=              │  │
//! │  │  DELETE /api/{collection}/{id}  (leader)   │  │
//! │  └────────────────────────────────────────────┘  │
//! │                        │                         │
//! │   Scheduler ───────────┼────── Team + Session    │
//! │                        │                         │
//! │                 DocumentStore                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hiel::config::Config;
//! use hiel::server::HielServer;
//!
//! let config = Config::load(None)?;
//! let server = HielServer::new(&config)?;
//! server.start().await?;
//! ```

pub mod api;
pub mod server;

pub use api::{create_router, ApiError, ApiResponse, ErrorResponse, SessionResponse};
pub use server::{AppState, HielServer, ServerError, ServerInfo};
