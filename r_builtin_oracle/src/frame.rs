//! Explicit call-stack records.
//!
//! The evaluator threads an explicit stack of frame records through
//! evaluation instead of relying on the host call stack, so "what was
//! frame N's call" is answerable at any depth. Frames carry the deparsed
//! call text that error messages and warning contexts are built from.

/// One call record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Deparsed call text, e.g. `gsub("a", "b", x)`.
    pub call: String,
    /// 1-based depth of this frame.
    pub depth: usize,
}

/// Ordered stack of call records.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame for an entered call; returns its depth.
    pub fn push(&mut self, call: impl Into<String>) -> usize {
        let depth = self.frames.len() + 1;
        self.frames.push(Frame {
            call: call.into(),
            depth,
        });
        depth
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The frame at 1-based depth `n`.
    pub fn frame(&self, n: usize) -> Option<&Frame> {
        if n == 0 {
            return None;
        }
        self.frames.get(n - 1)
    }

    /// The innermost call, if any.
    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_and_lookup() {
        let mut stack = CallStack::new();
        assert_eq!(stack.push("outer()"), 1);
        assert_eq!(stack.push("inner(x)"), 2);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.frame(1).unwrap().call, "outer()");
        assert_eq!(stack.innermost().unwrap().call, "inner(x)");
        stack.pop();
        assert_eq!(stack.innermost().unwrap().call, "outer()");
        assert!(stack.frame(2).is_none());
    }
}
