// ABOUTME: Utility modules for common functionality across the application
// ABOUTME: Contains shared Authorization header parsing helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

/// Basic and Bearer Authorization header parsing
pub mod auth;
