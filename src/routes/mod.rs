// ABOUTME: Route module organization for the token server HTTP endpoints
// ABOUTME: Groups route definitions by domain with thin handlers over the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! Route module for the token server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer.

/// Health check and readiness routes
pub mod health;
/// Bearer-protected identity routes
pub mod identity;
/// Token issuance, kubeconfig, and verification routes
pub mod token;

pub use health::HealthRoutes;
pub use identity::IdentityRoutes;
pub use token::TokenRoutes;
