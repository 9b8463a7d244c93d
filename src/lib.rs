// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // device and workload backends
pub mod config;     // config + workload registry
pub mod engine;     // worker loop, command queue, events
pub mod errors;     // error handling
pub mod observability;
pub mod preferences; // persisted user choices
pub mod traits;     // unified abstractions
