//! Per-logical-call-chain ambient stack.
//!
//! [`ContextStack`] is the generic primitive behind "current scope"
//! tracking. Frames are immutable and `Arc`-linked, so cloning a stack
//! handle forks it: both copies see the frames that existed at the fork
//! point, while later pushes and pops on one copy never leak into the
//! other.

use std::sync::Arc;

#[derive(Debug)]
struct Frame<T> {
    value: T,
    parent: Option<Arc<Frame<T>>>,
}

/// A persistent stack of ambient values for one logical call chain.
///
/// `push` creates a new frame whose parent is the previously current
/// frame; `pop` restores the parent. Synchronous continuations share one
/// handle; forking concurrent work clones the handle, giving each branch
/// an independent copy as of the fork point.
#[derive(Debug)]
pub struct ContextStack<T> {
    top: Option<Arc<Frame<T>>>,
    depth: usize,
}

impl<T> ContextStack<T> {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            top: None,
            depth: 0,
        }
    }

    /// Pushes a value, making it current.
    pub fn push(&mut self, value: T) {
        self.top = Some(Arc::new(Frame {
            value,
            parent: self.top.take(),
        }));
        self.depth += 1;
    }

    /// Pops the current frame, restoring its parent.
    ///
    /// Returns the popped value, or `None` on an empty stack.
    pub fn pop(&mut self) -> Option<T>
    where
        T: Clone,
    {
        let top = self.top.take()?;
        self.top = top.parent.clone();
        self.depth -= 1;
        Some(top.value.clone())
    }

    /// Returns the current value, if any.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.top.as_ref().map(|f| &f.value)
    }

    /// Iterates values from the current frame to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &T> {
        let mut next = self.top.as_deref();
        std::iter::from_fn(move || {
            let frame = next?;
            next = frame.parent.as_deref();
            Some(&frame.value)
        })
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true when no frame is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }
}

impl<T> Clone for ContextStack<T> {
    /// Forks the stack. Frames are shared immutably; mutations on either
    /// copy stay invisible to the other.
    fn clone(&self) -> Self {
        Self {
            top: self.top.clone(),
            depth: self.depth,
        }
    }
}

impl<T> Default for ContextStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_round_trip() {
        let mut stack: ContextStack<&str> = ContextStack::new();
        assert!(stack.is_empty());

        stack.push("a");
        assert_eq!(stack.current(), Some(&"a"));
        assert_eq!(stack.depth(), 1);

        assert_eq!(stack.pop(), Some("a"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_lifo_nesting() {
        let mut stack: ContextStack<u32> = ContextStack::new();
        stack.push(1);
        stack.push(2);

        assert_eq!(stack.current(), Some(&2));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.current(), Some(&1));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_ancestors_top_to_root() {
        let mut stack: ContextStack<u32> = ContextStack::new();
        stack.push(1);
        stack.push(2);
        stack.push(3);

        let chain: Vec<_> = stack.ancestors().copied().collect();
        assert_eq!(chain, vec![3, 2, 1]);
    }

    #[test]
    fn test_fork_is_independent() {
        let mut trunk: ContextStack<&str> = ContextStack::new();
        trunk.push("shared");

        let mut branch = trunk.clone();
        branch.push("branch-only");
        trunk.push("trunk-only");

        assert_eq!(branch.current(), Some(&"branch-only"));
        assert_eq!(trunk.current(), Some(&"trunk-only"));

        branch.pop();
        branch.pop();
        assert!(branch.is_empty());
        // Trunk is unaffected by the branch unwinding.
        assert_eq!(trunk.depth(), 2);
        assert_eq!(trunk.current(), Some(&"trunk-only"));
    }

    #[test]
    fn test_fork_sees_state_at_fork_point() {
        let mut trunk: ContextStack<u32> = ContextStack::new();
        trunk.push(1);
        trunk.push(2);

        let branch = trunk.clone();
        assert_eq!(branch.ancestors().copied().collect::<Vec<_>>(), vec![2, 1]);
    }
}
