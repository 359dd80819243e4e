//! # TaskHub API Server Library
//!
//! HTTP surface of TaskHub: the router, its state, configuration and the
//! mapping of domain errors to responses. Business rules live in
//! `taskhub_shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
