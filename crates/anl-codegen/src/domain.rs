//! Domain scope stack.
//!
//! Tracks the C++ expression that denotes "the current evaluation point" while
//! lowering. Domain transforms push a frame around their source operand and
//! pop it afterwards. Each frame also carries a [`FramePath`], the ids of the
//! transform nodes between the base point and the frame, which identifies the
//! point a value is evaluated at independently of its text.

use anl_types::NodeId;
use serde::Serialize;
use std::fmt;

/// Name of the evaluation point parameter in generated code.
pub const BASE_POINT: &str = "EvalPoint";

// ══════════════════════════════════════════════════════════════════════════════
// FramePath
// ══════════════════════════════════════════════════════════════════════════════

/// Absolute identity of a domain frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FramePath(Vec<NodeId>);

impl FramePath {
    /// The path of the outermost frame.
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by the transform node `origin`.
    pub fn child(&self, origin: NodeId) -> Self {
        let mut nodes = self.0.clone();
        nodes.push(origin);
        Self(nodes)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for id in &self.0 {
            write!(f, "/{id}")?;
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// DomainStack
// ══════════════════════════════════════════════════════════════════════════════

/// One entry of the domain stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub path: FramePath,
}

/// LIFO stack of domain frames. Never empty: the base frame is always present.
#[derive(Debug, Clone)]
pub struct DomainStack {
    frames: Vec<Frame>,
}

impl DomainStack {
    /// A stack holding only the base frame.
    pub fn new(base: impl Into<String>, path: FramePath) -> Self {
        Self {
            frames: vec![Frame {
                text: base.into(),
                path,
            }],
        }
    }

    /// Push the frame introduced by transform node `origin`.
    pub fn push(&mut self, origin: NodeId, text: String) {
        let path = self.path().child(origin);
        log::trace!("push frame {path}: {text}");
        self.frames.push(Frame { text, path });
    }

    /// Pop the innermost frame. The base frame is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Text of the current point.
    ///
    /// At the base frame this is a fresh `Point(...)` copy, since transform
    /// methods mutate the point they are called on.
    pub fn current(&self) -> String {
        let top = self.top();
        if self.frames.len() == 1 {
            format!("Point({})", top.text)
        } else {
            top.text.clone()
        }
    }

    /// Path of the current frame.
    pub fn path(&self) -> &FramePath {
        &self.top().path
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn top(&self) -> &Frame {
        // `frames` always holds the base frame.
        &self.frames[self.frames.len() - 1]
    }
}

impl Default for DomainStack {
    fn default() -> Self {
        Self::new(BASE_POINT, FramePath::root())
    }
}
