// ABOUTME: Focused dependency injection contexts shared by route handlers
// ABOUTME: Provides type-safe access to token services and configuration without globals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! Focused dependency injection contexts
//!
//! - `AuthContext`: token manager and issuance service
//! - `ServerContext`: the composed context used as router state

pub mod auth;
pub mod server;

pub use auth::AuthContext;
pub use server::ServerContext;
