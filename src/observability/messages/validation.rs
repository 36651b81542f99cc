// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Step graph validation
//! * Cyclic hop detection
//! * Unresolved hop and error target detection
//! * Layout compatibility at merge points

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cycle detected among the graph's hops.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use rowflow::observability::messages::validation::CyclicHopDetected;
///
/// let cycle = vec!["a", "b", "c", "a"];
/// let msg = CyclicHopDetected {
///     cycle: &cycle,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicHopDetected<'a> {
    pub cycle: &'a [&'a str],
}

impl Display for CyclicHopDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic hop detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicHopDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// Hop endpoint that names no declared step.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use rowflow::observability::messages::validation::UnresolvedHop;
///
/// let msg = UnresolvedHop {
///     from: "read",
///     to: "missing_step",
///     missing_step: "missing_step",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct UnresolvedHop<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub missing_step: &'a str,
}

impl Display for UnresolvedHop<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Hop '{}' -> '{}' references missing step '{}'",
            self.from, self.to, self.missing_step
        )
    }
}

impl StructuredLog for UnresolvedHop<'_> {
    fn log(&self) {
        tracing::error!(
            from = self.from,
            to = self.to,
            missing_step = self.missing_step,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            from = self.from,
            to = self.to,
            missing_step = self.missing_step,
        )
    }
}

/// Duplicate step ID detected in configuration.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DuplicateStepId<'a> {
    pub step_id: &'a str,
}

impl Display for DuplicateStepId<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Duplicate step ID: '{}'", self.step_id)
    }
}

impl StructuredLog for DuplicateStepId<'_> {
    fn log(&self) {
        tracing::error!(step_id = self.step_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
        )
    }
}

/// Producers feeding one step declare layouts that cannot be mixed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct IncompatibleMergeDetected<'a> {
    pub step_id: &'a str,
    pub reason: &'a str,
}

impl Display for IncompatibleMergeDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Incompatible row layouts merge into step '{}': {}",
            self.step_id, self.reason
        )
    }
}

impl StructuredLog for IncompatibleMergeDetected<'_> {
    fn log(&self) {
        tracing::error!(step_id = self.step_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            step_id = self.step_id,
        )
    }
}

/// Graph validation started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationStarted {
    pub step_count: usize,
    pub hop_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting graph validation for {} steps and {} hops",
            self.step_count, self.hop_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            hop_count = self.hop_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            step_count = self.step_count,
            hop_count = self.hop_count,
        )
    }
}

/// Graph validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted {
    pub step_count: usize,
    pub hop_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph validation completed successfully for {} steps and {} hops",
            self.step_count, self.hop_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            hop_count = self.hop_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            step_count = self.step_count,
            hop_count = self.hop_count,
        )
    }
}

/// Graph validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use rowflow::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph validation failed with {} errors", self.error_count)
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
