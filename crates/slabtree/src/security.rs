//! Nesting limits for the recursive parsers and writers

use crate::{
    config::ParseLimits,
    error::{Error, Result},
};

/// Depth tracker for recursive descent
///
/// Parsers and writers call [`enter`](Self::enter) before descending into a
/// container or element and [`exit`](Self::exit) after leaving it. Entering past the limit
/// fails instead of recursing further.
#[derive(Debug, Clone)]
pub struct DepthTracker {
    current_depth: usize,
    max_depth: usize,
}

impl DepthTracker {
    /// Create depth tracker from parse limits
    pub fn from_limits(limits: &ParseLimits) -> Self {
        Self::with_max_depth(limits.max_depth)
    }

    /// Create a new depth tracker with custom limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            current_depth: 0,
            max_depth,
        }
    }

    /// Enter a new nesting level
    pub fn enter(&mut self) -> Result<()> {
        if self.current_depth >= self.max_depth {
            return Err(Error::TooDeep {
                depth: self.current_depth + 1,
                max: self.max_depth,
            });
        }
        self.current_depth += 1;
        Ok(())
    }

    /// Exit a nesting level
    pub fn exit(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Get current depth
    pub fn current_depth(&self) -> usize {
        self.current_depth
    }

    /// Get the configured limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for DepthTracker {
    fn default() -> Self {
        Self::from_limits(&ParseLimits::default())
    }
}
