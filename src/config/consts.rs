// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Target duration of one render tick (about 60 frames per second)
pub const DEFAULT_FRAME_BUDGET_MS: u64 = 16;
/// Upper bound on any single device-synchronization wait
pub const DEFAULT_DEVICE_SYNC_TIMEOUT_MS: u64 = 1_000;
/// Name given to the engine worker thread
pub const DEFAULT_WORKER_THREAD_NAME: &str = "kiln-engine";
