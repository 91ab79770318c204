//! Matrix stack for composing nested object transforms.
//!
//! Every level holds an accumulated transform. Composition always
//! right-multiplies (`top = top * local`), so a level built as `T * R * S`
//! scales first, then rotates, then translates.
//!
//! The base level is never removed. Scene traversal should enter nodes with
//! [`TransformStack::scope`], whose guard pops exactly once when it goes out
//! of scope, so early returns cannot leave the stack unbalanced.

use std::ops::{Deref, DerefMut};

use cgmath::{Matrix4, SquareMatrix};

#[derive(Debug, Clone)]
pub struct TransformStack {
    base: Matrix4<f32>,
    levels: Vec<Matrix4<f32>>,
}

impl TransformStack {
    /// Creates a stack whose base level is the identity.
    pub fn new() -> Self {
        Self::with_base(Matrix4::identity())
    }

    /// Creates a stack whose base level is `base` (a view matrix, for
    /// example).
    pub fn with_base(base: Matrix4<f32>) -> Self {
        Self {
            base,
            levels: Vec::with_capacity(16),
        }
    }

    /// Number of levels, including the base.
    pub fn depth(&self) -> usize {
        self.levels.len() + 1
    }

    pub fn top(&self) -> &Matrix4<f32> {
        self.levels.last().unwrap_or(&self.base)
    }

    pub fn top_mut(&mut self) -> &mut Matrix4<f32> {
        self.levels.last_mut().unwrap_or(&mut self.base)
    }

    /// Duplicates the current top.
    pub fn push(&mut self) {
        let top = *self.top();
        self.levels.push(top);
    }

    /// Pushes an explicit matrix, ignoring the current top.
    pub fn push_matrix(&mut self, matrix: Matrix4<f32>) {
        self.levels.push(matrix);
    }

    /// Right-multiplies `local` onto the current top in place.
    pub fn compose(&mut self, local: Matrix4<f32>) {
        let top = self.top_mut();
        *top = *top * local;
    }

    /// Removes and returns the top level. Returns `None`, leaving the stack
    /// untouched, when only the base level is left.
    pub fn pop(&mut self) -> Option<Matrix4<f32>> {
        self.levels.pop()
    }

    /// Pushes a duplicate of the top and returns a guard that pops it again
    /// on drop.
    pub fn scope(&mut self) -> StackScope<'_> {
        self.push();
        let depth = self.depth();
        StackScope { stack: self, depth }
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

/// One pushed level of a [`TransformStack`].
///
/// Derefs to the stack, so `compose`, `top` and nested `scope` calls work on
/// the guard directly.
pub struct StackScope<'a> {
    stack: &'a mut TransformStack,
    depth: usize,
}

impl Deref for StackScope<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &TransformStack {
        self.stack
    }
}

impl DerefMut for StackScope<'_> {
    fn deref_mut(&mut self) -> &mut TransformStack {
        self.stack
    }
}

impl Drop for StackScope<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.stack.depth(),
            self.depth,
            "levels pushed inside a scope were not popped"
        );
        // Nested guards borrow this one mutably, so they are always gone by now.
        self.stack.levels.truncate(self.depth - 2);
    }
}
