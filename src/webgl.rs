// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::{ActiveUniform, FramebufferStatus, GlContext, ShaderStage};
use web_sys::WebGl2RenderingContext as Gl;
use web_sys::{WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture, WebGlUniformLocation};

/// The production [`GlContext`] backend. WebGL2 is the baseline: the core's
/// semantics need `vertexAttribDivisor` and `sampler3D`, which WebGL has
/// only behind extensions.
///
/// The `unwrap`s on object creation only trip on context loss, at which
/// point nothing drawn this frame matters anyway.
impl GlContext for Gl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type Texture = WebGlTexture;
    type UniformLocation = WebGlUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> WebGlShader {
        let stage = match stage {
            ShaderStage::Vertex => Gl::VERTEX_SHADER,
            ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
        };
        Gl::create_shader(self, stage).unwrap()
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        Gl::shader_source(self, shader, source);
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        Gl::compile_shader(self, shader);
    }

    fn shader_compile_status(&self, shader: &WebGlShader) -> bool {
        self.get_shader_parameter(shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> String {
        self.get_shader_info_log(shader).unwrap_or_default()
    }

    fn delete_shader(&self, shader: WebGlShader) {
        Gl::delete_shader(self, Some(&shader));
    }

    fn create_program(&self) -> WebGlProgram {
        Gl::create_program(self).unwrap()
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        Gl::attach_shader(self, program, shader);
    }

    fn link_program(&self, program: &WebGlProgram) {
        Gl::link_program(self, program);
    }

    fn program_link_status(&self, program: &WebGlProgram) -> bool {
        self.get_program_parameter(program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> String {
        self.get_program_info_log(program).unwrap_or_default()
    }

    fn active_attribute_count(&self, program: &WebGlProgram) -> u32 {
        self.get_program_parameter(program, Gl::ACTIVE_ATTRIBUTES)
            .as_f64()
            .unwrap_or(0.0) as u32
    }

    fn active_attribute(&self, program: &WebGlProgram, index: u32) -> Option<String> {
        self.get_active_attrib(program, index).map(|info| info.name())
    }

    fn attribute_location(&self, program: &WebGlProgram, name: &str) -> i32 {
        self.get_attrib_location(program, name)
    }

    fn active_uniform_count(&self, program: &WebGlProgram) -> u32 {
        self.get_program_parameter(program, Gl::ACTIVE_UNIFORMS)
            .as_f64()
            .unwrap_or(0.0) as u32
    }

    fn active_uniform(&self, program: &WebGlProgram, index: u32) -> Option<ActiveUniform> {
        self.get_active_uniform(program, index).map(|info| ActiveUniform {
            name: info.name(),
            glsl_type: info.type_(),
            size: info.size() as u32,
        })
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.get_uniform_location(program, name)
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        Gl::enable_vertex_attrib_array(self, location);
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        Gl::disable_vertex_attrib_array(self, location);
    }

    fn bind_array_buffer(&self, buffer: &WebGlBuffer) {
        self.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
    }

    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: i32) {
        self.vertex_attrib_pointer_with_i32(location, components, Gl::FLOAT, false, stride, offset);
    }

    fn vertex_attrib_divisor(&self, location: u32, divisor: u32) {
        Gl::vertex_attrib_divisor(self, location, divisor);
    }

    fn uniform1f(&self, location: &WebGlUniformLocation, v: f32) {
        Gl::uniform1f(self, Some(location), v);
    }

    fn uniform2f(&self, location: &WebGlUniformLocation, x: f32, y: f32) {
        Gl::uniform2f(self, Some(location), x, y);
    }

    fn uniform3f(&self, location: &WebGlUniformLocation, x: f32, y: f32, z: f32) {
        Gl::uniform3f(self, Some(location), x, y, z);
    }

    fn uniform4f(&self, location: &WebGlUniformLocation, x: f32, y: f32, z: f32, w: f32) {
        Gl::uniform4f(self, Some(location), x, y, z, w);
    }

    fn uniform1fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform1fv_with_f32_array(Some(location), v);
    }

    fn uniform2fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform2fv_with_f32_array(Some(location), v);
    }

    fn uniform3fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform3fv_with_f32_array(Some(location), v);
    }

    fn uniform4fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform4fv_with_f32_array(Some(location), v);
    }

    fn uniform_matrix3fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform_matrix3fv_with_f32_array(Some(location), false, v);
    }

    fn uniform_matrix4fv(&self, location: &WebGlUniformLocation, v: &[f32]) {
        self.uniform_matrix4fv_with_f32_array(Some(location), false, v);
    }

    fn uniform1i(&self, location: &WebGlUniformLocation, v: i32) {
        Gl::uniform1i(self, Some(location), v);
    }

    fn uniform2i(&self, location: &WebGlUniformLocation, x: i32, y: i32) {
        Gl::uniform2i(self, Some(location), x, y);
    }

    fn uniform3i(&self, location: &WebGlUniformLocation, x: i32, y: i32, z: i32) {
        Gl::uniform3i(self, Some(location), x, y, z);
    }

    fn uniform4i(&self, location: &WebGlUniformLocation, x: i32, y: i32, z: i32, w: i32) {
        Gl::uniform4i(self, Some(location), x, y, z, w);
    }

    fn uniform1iv(&self, location: &WebGlUniformLocation, v: &[i32]) {
        self.uniform1iv_with_i32_array(Some(location), v);
    }

    fn uniform2iv(&self, location: &WebGlUniformLocation, v: &[i32]) {
        self.uniform2iv_with_i32_array(Some(location), v);
    }

    fn uniform3iv(&self, location: &WebGlUniformLocation, v: &[i32]) {
        self.uniform3iv_with_i32_array(Some(location), v);
    }

    fn uniform4iv(&self, location: &WebGlUniformLocation, v: &[i32]) {
        self.uniform4iv_with_i32_array(Some(location), v);
    }

    fn active_texture(&self, unit: u32) {
        Gl::active_texture(self, Gl::TEXTURE0 + unit);
    }

    fn bind_texture_2d(&self, texture: &WebGlTexture) {
        self.bind_texture(Gl::TEXTURE_2D, Some(texture));
    }

    fn bind_texture_3d(&self, texture: &WebGlTexture) {
        self.bind_texture(Gl::TEXTURE_3D, Some(texture));
    }

    fn framebuffer_status(&self) -> FramebufferStatus {
        match self.check_framebuffer_status(Gl::FRAMEBUFFER) {
            Gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            Gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            Gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
            Gl::FRAMEBUFFER_INCOMPLETE_DIMENSIONS => FramebufferStatus::IncompleteDimensions,
            Gl::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            Gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
            _ => FramebufferStatus::Unknown,
        }
    }

    fn clear(&self, color: bool, depth: bool, stencil: bool) {
        let mut bits = 0;
        if color {
            bits |= Gl::COLOR_BUFFER_BIT;
        }
        if depth {
            bits |= Gl::DEPTH_BUFFER_BIT;
        }
        if stencil {
            bits |= Gl::STENCIL_BUFFER_BIT;
        }
        Gl::clear(self, bits);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        Gl::clear_color(self, r, g, b, a);
    }

    fn clear_depth(&self, depth: f32) {
        Gl::clear_depth(self, depth);
    }

    fn clear_stencil(&self, stencil: i32) {
        Gl::clear_stencil(self, stencil);
    }
}
