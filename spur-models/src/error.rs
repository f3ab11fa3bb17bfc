// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Errors raised while building a topology.
//!
//! All of these are fatal: the caller is expected to surface them and abort
//! rather than retry with a partially built fabric.

use std::error::Error;
use std::fmt;

use spur_engine::types::SimError;

#[derive(Debug)]
pub enum BuildError {
    /// A required link parameter was left empty.
    MissingParameter(&'static str),

    /// A link parameter was supplied but could not be parsed.
    Malformed {
        field: &'static str,
        value: String,
    },

    /// The engine rejected the creation of a node or link.
    Construction(SimError),

    /// An endpoint attachment referenced a leaf outside the built fabric.
    LeafIndex { index: usize, num_leaves: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingParameter(name) => {
                write!(f, "missing required link parameter '{name}'")
            }
            Self::Malformed { field, value } => {
                write!(f, "malformed {field} value '{value}'")
            }
            Self::Construction(e) => write!(f, "{e}"),
            Self::LeafIndex { index, num_leaves } => {
                write!(f, "leaf index {index} outside fabric with {num_leaves} leaves")
            }
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Construction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimError> for BuildError {
    fn from(e: SimError) -> Self {
        Self::Construction(e)
    }
}
