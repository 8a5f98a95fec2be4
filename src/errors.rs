//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Prepline Error Module
//!
//! Error types shared by the step chain, the action contract and the
//! pipeline node graph.
//!
//! ## Error Categories
//!
//! - **Chain consistency** (`InsufficientSteps`, `ChainCycle`, `ChainTooDeep`,
//!   `MissingEntity`):
//!   the step chain and the pipeline disagree, or the chain itself is broken.
//!   These abort pipeline construction and are never recovered from.
//! - **Action**: a compile or apply phase failed. Nodes absorb these locally
//!   and keep the stream flowing.
//! - **Validation / Schema / Config**: invalid inputs.
//! - **Io / Serde**: wrappers around library errors.
//!
//! Row-level problems never surface as errors: cancellation is a status on the
//! action context and malformed parameters fall back to defaults.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Prepline.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Canonical error enumeration for Prepline.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PrepError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// The pipeline holds more compile/action pairs than there are steps.
    #[error("not enough steps to transform pipeline ({available} step(s) available)")]
    InsufficientSteps { available: usize },

    /// A step was seen twice while walking parent links.
    #[error("cycle detected in step chain at step '{step}'")]
    ChainCycle { step: String },

    /// A chain walk went past the configured depth limit.
    #[error("step chain exceeds maximum depth of {depth}")]
    ChainTooDeep { depth: usize },

    /// An id-addressed entity could not be found in the repository.
    #[error("{kind} '{id}' not found")]
    MissingEntity { kind: String, id: String },

    /// No action is registered under the requested name.
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// Errors caused by malformed or incompatible row metadata.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Any failure raised by an action implementation.
    #[error("action '{action}' failed: {message}")]
    Action { action: String, message: String },

    /// Failures that occur while assembling or running a pipeline.
    #[error("pipeline error at stage '{stage}': {message}")]
    Pipeline { stage: String, message: String },

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for PrepError {
    fn from(err: io::Error) -> Self {
        PrepError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for PrepError {
    fn from(err: serde_yaml::Error) -> Self {
        PrepError::Serde(err.to_string())
    }
}

impl PrepError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        PrepError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema<T: Into<String>>(message: T) -> Self {
        PrepError::Schema {
            message: message.into(),
        }
    }

    /// Helper to construct action errors.
    pub fn action(name: impl Into<String>, message: impl Into<String>) -> Self {
        PrepError::Action {
            action: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct pipeline errors.
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PrepError::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Helper to construct missing entity errors.
    pub fn missing(kind: impl Into<String>, id: impl Into<String>) -> Self {
        PrepError::MissingEntity {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        PrepError::Config(message.into())
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        PrepError::Internal(message.into())
    }

    /// Returns true for errors meaning the step chain cannot be trusted.
    pub fn is_chain_consistency(&self) -> bool {
        matches!(
            self,
            PrepError::InsufficientSteps { .. }
                | PrepError::ChainCycle { .. }
                | PrepError::ChainTooDeep { .. }
                | PrepError::MissingEntity { .. }
        )
    }
}
