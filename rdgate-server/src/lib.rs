//! # rdgate-server — Remote Desktop Gateway daemon
//!
//! Accepts plain TCP connections, wraps each one in the gateway frame
//! codec, and drives the RDG handshake and relay engine from
//! `rdgate-core`. Verification hooks are built from the TOML
//! configuration: target and client allow-lists plus an optional static
//! PAA secret.
//!
//! TLS termination is expected in front of this daemon; it never speaks
//! HTTP or WebSocket itself.

pub mod config;
pub mod service;
