// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Reusable simulation components.

pub mod arbiter;
pub mod connect;
pub mod delay;
pub mod limiter;
pub mod router;
pub mod sink;
pub mod source;
pub mod store;
pub mod types;
