// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Keeps the issuance flow independent of HTTP so it can be driven directly in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

/// Credentials to directory to signed token orchestration
pub mod token_issuance;

pub use token_issuance::TokenIssuanceService;
