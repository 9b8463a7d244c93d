// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod clear;
pub mod factory;
pub mod null;
pub mod slow_load;

pub use clear::ClearWorkload;
pub use factory::LocalWorkloadFactory;
pub use null::NullWorkload;
pub use slow_load::SlowLoadWorkload;
