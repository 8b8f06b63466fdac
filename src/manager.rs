// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::GlContext;
use crate::program::Program;
use crate::program_manager::{ProgramManager, ProgramTemplate, ProgramTemplateSource};
use glam::{vec4, Vec4};
use log::error;
use std::cell::Cell;

/// Owns a GL context and the state built on top of it: the program manager
/// and the cached clear values. One per context, for the context's
/// lifetime; dropping it drops every cached program with it.
pub struct GlManager<G: GlContext> {
    gl: G,
    programs: ProgramManager<G>,
    clear_color: Cell<Vec4>,
    clear_depth: Cell<f32>,
    clear_stencil: Cell<i32>,
}

impl<G: GlContext> GlManager<G> {
    /// Wraps a context, initializing the depth and stencil clear values.
    /// The color clear value already defaults to transparent black in GL,
    /// so no call is issued for it.
    pub fn new(gl: G) -> Self {
        gl.clear_depth(1.0);
        gl.clear_stencil(0);

        Self {
            gl,
            programs: ProgramManager::new(),
            clear_color: Cell::new(vec4(0.0, 0.0, 0.0, 0.0)),
            clear_depth: Cell::new(1.0),
            clear_stencil: Cell::new(0),
        }
    }

    /// The wrapped context.
    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// The program manager.
    pub fn programs(&self) -> &ProgramManager<G> {
        &self.programs
    }

    /// Ingests a program template. See [`ProgramManager::add_template`].
    pub fn add_template(&self, template: &ProgramTemplateSource) {
        self.programs.add_template(template);
    }

    /// Returns true if both stages of `id` have been ingested.
    pub fn has_template(&self, id: &str) -> bool {
        self.programs.has_template(id)
    }

    /// Fetches a program variant. See [`ProgramManager::fetch_program`].
    pub fn fetch_program(&self, template: &ProgramTemplate, num_lights: u32) -> Option<Program<G>> {
        self.programs.fetch_program(&self.gl, template, num_lights)
    }

    /// Clears the selected buffers with their preset values.
    pub fn clear(&self, color: bool, depth: bool, stencil: bool) {
        self.gl.clear(color, depth, stencil);
    }

    /// Sets the color clear value, skipping the GL call if it is unchanged.
    pub fn set_clear_color(&self, color: Vec4) {
        if self.clear_color.get() != color {
            self.gl.clear_color(color.x, color.y, color.z, color.w);
            self.clear_color.set(color);
        }
    }

    /// Sets the depth clear value (0 - 1), skipping the GL call if it is
    /// unchanged.
    pub fn set_clear_depth(&self, depth: f32) {
        if self.clear_depth.get() != depth {
            self.gl.clear_depth(depth);
            self.clear_depth.set(depth);
        }
    }

    /// Sets the stencil clear value, skipping the GL call if it is
    /// unchanged.
    pub fn set_clear_stencil(&self, stencil: i32) {
        if self.clear_stencil.get() != stencil {
            self.gl.clear_stencil(stencil);
            self.clear_stencil.set(stencil);
        }
    }

    /// Checks the bound render target for completeness, logging the
    /// diagnostic category if it isn't complete. Rendering continues either
    /// way; this only makes the failure visible to the operator.
    pub fn check_render_target(&self) {
        if let Some(description) = self.gl.framebuffer_status().error_description() {
            error!("render target framebuffer not complete: {}", description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::trace::{Call, TraceGl};
    use crate::gl::FramebufferStatus;

    #[test]
    fn new_initializes_depth_and_stencil_only() {
        let manager = GlManager::new(TraceGl::default());
        assert_eq!(
            manager.gl().calls(),
            vec![Call::ClearDepth(1.0), Call::ClearStencil(0)]
        );
    }

    #[test]
    fn redundant_clear_values_skip_gl_calls() {
        let manager = GlManager::new(TraceGl::default());

        manager.set_clear_color(vec4(1.0, 0.0, 0.0, 1.0));
        manager.set_clear_color(vec4(1.0, 0.0, 0.0, 1.0));
        assert_eq!(
            manager
                .gl()
                .count(|c| matches!(c, Call::ClearColor(..))),
            1
        );

        // The initial color matches the GL default, so setting it back
        // does issue a call.
        manager.set_clear_color(Vec4::ZERO);
        assert_eq!(
            manager
                .gl()
                .count(|c| matches!(c, Call::ClearColor(..))),
            2
        );

        manager.set_clear_depth(1.0);
        manager.set_clear_stencil(0);
        assert_eq!(
            manager.gl().count(|c| matches!(c, Call::ClearDepth(_))),
            1
        );
        assert_eq!(
            manager.gl().count(|c| matches!(c, Call::ClearStencil(_))),
            1
        );
    }

    #[test]
    fn clear_selects_buffers() {
        let manager = GlManager::new(TraceGl::default());
        manager.clear(true, false, true);
        assert!(manager.gl().calls().contains(&Call::Clear(true, false, true)));
    }

    #[test]
    fn framebuffer_categories() {
        assert_eq!(FramebufferStatus::Complete.error_description(), None);
        assert_eq!(
            FramebufferStatus::IncompleteAttachment.error_description(),
            Some("incomplete attachment")
        );
        assert_eq!(
            FramebufferStatus::MissingAttachment.error_description(),
            Some("missing attachment")
        );
        assert_eq!(
            FramebufferStatus::IncompleteDimensions.error_description(),
            Some("dimension mismatch")
        );
        assert_eq!(
            FramebufferStatus::Unsupported.error_description(),
            Some("unsupported format")
        );
        assert_eq!(
            FramebufferStatus::IncompleteMultisample.error_description(),
            Some("multisample mismatch")
        );
        assert_eq!(FramebufferStatus::Unknown.error_description(), Some("unknown"));
    }

    #[test]
    fn check_render_target_reads_status() {
        let manager = GlManager::new(TraceGl::default());
        manager
            .gl()
            .framebuffer
            .set(FramebufferStatus::MissingAttachment);
        // Logs and returns; incompleteness is never fatal.
        manager.check_render_target();
    }
}
