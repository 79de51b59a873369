//! Limits and constraints for mapping
//!
//! This module defines limits that bound the work a single call can do:
//! the size of an input document and the nesting depth walked in either
//! direction (deeply nested XML on the way in, deep object graphs on the way out).

use crate::error::{Error, Result};

/// Limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth of elements / nested objects
    pub max_depth: usize,

    /// Maximum XML input size in bytes
    pub max_input_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_input_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 32,
            max_input_size: 1024 * 1024, // 1 MB
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 4096,
            max_input_size: 1024 * 1024 * 1024, // 1 GB
        }
    }

    /// Set the maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum input size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "nesting depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if input size is within limits
    pub fn check_input_size(&self, size: usize) -> Result<()> {
        if size > self.max_input_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_input_size
            )))
        } else {
            Ok(())
        }
    }
}
