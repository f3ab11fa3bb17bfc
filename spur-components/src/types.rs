// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Shared component types.

/// Iterator a [source](crate::source) draws its values from.
pub type DataGenerator<T> = Box<dyn Iterator<Item = T> + 'static>;
