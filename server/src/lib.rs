//! # Bingo Party Server Library
//!
//! Authoritative server for a real-time number-bingo party game. A host
//! client drives draws, any number of player clients join the same
//! session via a shared code or QR link, and everyone sees synchronized
//! state pushed over a WebSocket.
//!
//! ## Core Responsibilities
//!
//! ### Draw Generation
//! Each draw is a small arithmetic puzzle (`x op z = result`) whose
//! result is a previously undrawn number in `[1, 75]`. Operators are
//! weighted toward addition, synthesis is retried a bounded number of
//! times, and direct picks guarantee the game always runs to completion.
//!
//! ### Session Management
//! Sessions are created on first reference and hold draw history, player
//! roster and theme for the lifetime of the process. Mutating actions are
//! host-gated; everything else is a silent no-op when a precondition
//! fails, since stale client messages are expected and harmless.
//!
//! ### Room Broadcasting
//! Every state change is fanned out to all connections bound to the
//! session's room, including the actor; client rendering is idempotent.
//! Join snapshots, registration acks and validation errors are delivered
//! privately to the originating connection only.
//!
//! ## Module Organization
//!
//! - [`draw`]: pure draw-generation logic and the precomputed division
//!   table.
//! - [`session`]: the in-memory session store.
//! - [`protocol`]: per-connection context and event handling, free of
//!   socket I/O.
//! - [`network`]: axum router, WebSocket connection driver, room
//!   registry and the QR join-link endpoint.
//!
//! ## Concurrency Model
//!
//! Session state lives behind one `Arc<RwLock<SessionStore>>`. Each
//! inbound event takes the write lock for the short, synchronous handler
//! call, so per-session mutations never interleave within an event.
//! Delivery happens outside the handler through per-connection channels;
//! a slow or dead peer never blocks anyone else.

pub mod draw;
pub mod network;
pub mod protocol;
pub mod session;
