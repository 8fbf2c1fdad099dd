//! Type dispatcher: drives values through the strategy chain.
//!
//! A [`Traversal`] is the per-call state of one identity computation: the
//! chain, the sink, the current depth, the addresses of the shared pointers
//! currently being traversed and the types whose zero value is being expanded.
//! It is never shared between calls.

use std::io::Write;

use crate::error::IdentityError;
use crate::strategy::StrategyChain;
use crate::value::{Node, Value};

/// Result of offering a value to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The value was fully written to the sink.
    Encoded,
    /// Nothing was written; the next strategy should be tried.
    Declined,
}

/// State of one traversal.
pub struct Traversal<'t> {
    chain: &'t StrategyChain,
    sink: &'t mut dyn Write,
    max_depth: usize,
    depth: usize,
    path: Vec<usize>,
    zeros: Vec<&'static str>,
}

impl<'t> Traversal<'t> {
    /// Start a traversal writing into `sink`.
    pub fn new(chain: &'t StrategyChain, sink: &'t mut dyn Write, max_depth: usize) -> Self {
        Self {
            chain,
            sink,
            max_depth,
            depth: 0,
            path: Vec::new(),
            zeros: Vec::new(),
        }
    }

    /// Current nesting depth (the root is at depth 1 while it is encoded).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Write canonical bytes to the sink.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), IdentityError> {
        self.sink.write_all(bytes).map_err(IdentityError::SinkWrite)
    }

    /// Encode a value, failing when no strategy accepts it.
    pub fn dispatch(&mut self, value: &Value<'_>) -> Result<(), IdentityError> {
        match self.try_dispatch(value)? {
            Outcome::Encoded => Ok(()),
            Outcome::Declined => {
                let err = IdentityError::UnmatchedStrategy {
                    kind: value.kind(),
                    detail: value.describe(),
                };
                tracing::warn!(
                    kind = %value.kind(),
                    detail = %value.describe(),
                    depth = self.depth,
                    "No strategy matched value"
                );
                Err(err)
            }
        }
    }

    /// Offer a value to each strategy in priority order.
    ///
    /// Returns [`Outcome::Declined`] without writing anything when no strategy
    /// accepts the value.
    pub fn try_dispatch(&mut self, value: &Value<'_>) -> Result<Outcome, IdentityError> {
        if self.depth >= self.max_depth {
            return Err(IdentityError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;

        let chain = self.chain;
        let mut outcome = Outcome::Declined;
        for strategy in chain.iter() {
            if !strategy.applies(value) {
                continue;
            }
            outcome = strategy.encode(self, value)?;
            if outcome == Outcome::Encoded {
                tracing::trace!(strategy = strategy.name(), kind = %value.kind(), depth = self.depth, "encoded");
                break;
            }
        }

        self.depth -= 1;
        Ok(outcome)
    }

    /// Resolve a child and encode it.
    pub fn dispatch_node(&mut self, node: &Node<'_>) -> Result<(), IdentityError> {
        match node {
            Node::Borrowed(inner) => self.dispatch(&inner.identity_value()),
            Node::Owned(inner) => self.dispatch(&inner.identity_value()),
            Node::Value(value) => self.dispatch(value),
            Node::Zero { type_name, zero } => self.dispatch_zero(*type_name, *zero),
        }
    }

    fn dispatch_zero(
        &mut self,
        type_name: &'static str,
        zero: fn() -> Option<Value<'static>>,
    ) -> Result<(), IdentityError> {
        // A recursive type's zero stops at its first repetition
        if self.zeros.contains(&type_name) {
            tracing::trace!(type_name = type_name, "zero value already expanding");
            return Ok(());
        }

        self.zeros.push(type_name);
        let result = match zero() {
            Some(value) => self.dispatch(&value),
            None => self.dispatch(&Value::Opaque(type_name)),
        };
        self.zeros.pop();
        result
    }

    /// Encode a child into a scratch buffer instead of the sink.
    ///
    /// Depth and the shared-pointer path carry over, so guards still apply.
    pub fn capture(&mut self, node: &Node<'_>) -> Result<Vec<u8>, IdentityError> {
        let mut buffer = Vec::new();
        let mut nested = Traversal {
            chain: self.chain,
            sink: &mut buffer,
            max_depth: self.max_depth,
            depth: self.depth,
            path: std::mem::take(&mut self.path),
            zeros: std::mem::take(&mut self.zeros),
        };
        let result = nested.dispatch_node(node);
        self.path = nested.path;
        self.zeros = nested.zeros;
        result?;
        Ok(buffer)
    }

    /// Mark a shared allocation as being traversed.
    pub fn enter_shared(&mut self, address: usize) -> Result<(), IdentityError> {
        if self.path.contains(&address) {
            tracing::warn!(address = address, depth = self.depth, "Cyclic reference detected");
            return Err(IdentityError::Cyclic { address });
        }
        self.path.push(address);
        Ok(())
    }

    /// Leave the most recently entered shared allocation.
    pub fn leave_shared(&mut self) {
        self.path.pop();
    }
}
