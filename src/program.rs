// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::GlContext;
use crate::setters::{AttributeSetters, UniformSetters};
use std::cell::Cell;
use std::rc::Rc;

/// A linked program variant with its binding tables. As cheap to clone as
/// an [`Rc`]; every fetch of the same variant shares one underlying bundle.
pub struct Program<G: GlContext>(Rc<ProgramInner<G>>);

struct ProgramInner<G: GlContext> {
    program: G::Program,
    attributes: AttributeSetters,
    uniforms: UniformSetters<G::UniformLocation>,
    initialized: Cell<bool>,
}

impl<G: GlContext> Program<G> {
    pub(crate) fn new(
        program: G::Program,
        attributes: AttributeSetters,
        uniforms: UniformSetters<G::UniformLocation>,
    ) -> Self {
        Self(Rc::new(ProgramInner {
            program,
            attributes,
            uniforms,
            initialized: Cell::new(false),
        }))
    }

    /// Flipped exactly once, at the end of a build. Never cleared.
    pub(crate) fn mark_initialized(&self) {
        self.0.initialized.set(true);
    }

    /// Whether the build ran to completion. A linked-but-broken program
    /// still reports true; link failures are only observable in the log.
    pub fn initialized(&self) -> bool {
        self.0.initialized.get()
    }

    /// The native program handle, for collaborators that bind and draw.
    pub fn native(&self) -> &G::Program {
        &self.0.program
    }

    /// Setters for every active attribute.
    pub fn attributes(&self) -> &AttributeSetters {
        &self.0.attributes
    }

    /// Setters and the validation record for every active uniform.
    pub fn uniforms(&self) -> &UniformSetters<G::UniformLocation> {
        &self.0.uniforms
    }

    /// Whether two handles share one underlying bundle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<G: GlContext> Clone for Program<G> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}
