// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Network models built on the SPUR component library.
//!
//! The centre piece is the [leaf-spine fabric](crate::leaf_spine): a two-tier
//! switched network built from [switch nodes](crate::switch) joined by
//! [point-to-point links](crate::link) and exercised by
//! [endpoints](crate::endpoint) that exchange [packets](crate::packet).

pub mod endpoint;
pub mod error;
pub mod leaf_spine;
pub mod link;
pub mod packet;
pub mod switch;
