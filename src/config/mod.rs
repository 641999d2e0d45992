// ABOUTME: Configuration module for centralized server settings
// ABOUTME: Re-exports the environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

/// Environment and server configuration
pub mod environment;

pub use environment::{DirectoryBackend, LdapConfig, ServerConfig};
