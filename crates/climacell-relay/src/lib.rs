//! ClimaCell Weather Relay
//!
//! Fetches realtime and hourly forecast payloads from the ClimaCell v3
//! API, converts every embedded timestamp to the configured target zone,
//! republishes the normalized payload on a Zenoh topic with per-kind
//! ordering, and archives raw snapshots as immutable named blobs for
//! range read-back.
//!
//! # Architecture
//!
//! ```text
//! GET /realtime|/hourly ──► WeatherFetcher ──► normalize ──► ZenohPublisher
//!                                 │ (raw JSON back to the caller)
//! POST /store/{kind}/  ──► push envelope ──► Archiver ──► blob files
//! GET  /store/{kind}/  ──► range offsets ──► blobs ──► normalize ──► tagged records
//! ```
//!
//! # Modules
//!
//! - [`config`] — YAML configuration loaded once at startup.
//! - [`secrets`] — API key retrieval (env var or mounted file).
//! - [`error`] — Unified error type for relay operations.
//! - [`tz`] — Recursive timestamp normalization over arbitrary JSON.
//! - [`range`] — Offset selection over ordered blob names.
//! - [`fetch`] — ClimaCell API client.
//! - [`publish`] — Zenoh publisher with bounded acknowledgment wait.
//! - [`archive`] — Blob store seam, snapshot persistence, materialization.
//! - [`http_server`] — axum surface wiring the components together.

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http_server;
pub mod publish;
pub mod range;
pub mod secrets;
pub mod tz;
