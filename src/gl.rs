// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

/// This module collects every GL entry point the program-management core
/// touches behind the [`GlContext`] trait. The production backend implements
/// it for the WebGL2 context (see webgl.rs); tests implement it with a
/// recording context so reflection results and call sequences can be
/// asserted without a browser.

/// One shader pipeline phase, compiled independently before linking.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl ShaderStage {
    /// Suffix appended to a program id to key the stage's template tree.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Vertex => "VERTEX",
            Self::Fragment => "FRAGMENT",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// GLSL data type enumerants as reported by [`GlContext::active_uniform`].
/// Values are the GL specification's, so backends can pass them through.
pub mod glsl_type {
    /// `int`
    pub const INT: u32 = 0x1404;
    /// `float`
    pub const FLOAT: u32 = 0x1406;
    /// `vec2`
    pub const FLOAT_VEC2: u32 = 0x8B50;
    /// `vec3`
    pub const FLOAT_VEC3: u32 = 0x8B51;
    /// `vec4`
    pub const FLOAT_VEC4: u32 = 0x8B52;
    /// `ivec2`
    pub const INT_VEC2: u32 = 0x8B53;
    /// `ivec3`
    pub const INT_VEC3: u32 = 0x8B54;
    /// `ivec4`
    pub const INT_VEC4: u32 = 0x8B55;
    /// `bool`
    pub const BOOL: u32 = 0x8B56;
    /// `mat2` (reflected but carries no setter)
    pub const FLOAT_MAT2: u32 = 0x8B5A;
    /// `mat3`
    pub const FLOAT_MAT3: u32 = 0x8B5B;
    /// `mat4`
    pub const FLOAT_MAT4: u32 = 0x8B5C;
    /// `sampler2D`
    pub const SAMPLER_2D: u32 = 0x8B5E;
    /// `sampler3D`
    pub const SAMPLER_3D: u32 = 0x8B5F;
}

/// One active uniform as reported by the linker.
#[derive(Clone, Debug)]
pub struct ActiveUniform {
    /// Name, with the `[0]` suffix the linker gives array uniforms.
    pub name: String,
    /// One of [`glsl_type`]'s enumerants.
    pub glsl_type: u32,
    /// Array length, 1 for non-arrays.
    pub size: u32,
}

/// Completeness status of the currently bound framebuffer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FramebufferStatus {
    /// Complete, ready to render to.
    Complete,
    /// Attachment types are mismatched or not attachment complete.
    IncompleteAttachment,
    /// There is no attachment.
    MissingAttachment,
    /// Problem with the attachment dimensions.
    IncompleteDimensions,
    /// The format of an attachment is not supported.
    Unsupported,
    /// Sample counts differ among attachments.
    IncompleteMultisample,
    /// Any other status the backend reported.
    Unknown,
}

impl FramebufferStatus {
    /// Diagnostic category for the operator log, or None if complete.
    pub fn error_description(self) -> Option<&'static str> {
        match self {
            Self::Complete => None,
            Self::IncompleteAttachment => Some("incomplete attachment"),
            Self::MissingAttachment => Some("missing attachment"),
            Self::IncompleteDimensions => Some("dimension mismatch"),
            Self::Unsupported => Some("unsupported format"),
            Self::IncompleteMultisample => Some("multisample mismatch"),
            Self::Unknown => Some("unknown"),
        }
    }
}

/// The slice of a GL context the program-management core uses. Implemented
/// for the WebGL2 context and, in tests, for a recording context.
///
/// All operations are synchronous and must be called from the thread that
/// owns the context.
pub trait GlContext {
    /// Native shader-object handle.
    type Shader;
    /// Native program-object handle.
    type Program;
    /// Native vertex-buffer handle.
    type Buffer;
    /// Native texture handle.
    type Texture;
    /// Native uniform location.
    type UniformLocation;

    /// Creates an empty shader object for a stage.
    fn create_shader(&self, stage: ShaderStage) -> Self::Shader;
    /// Replaces the shader's source text.
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    /// Compiles the shader.
    fn compile_shader(&self, shader: &Self::Shader);
    /// Whether the last compile succeeded.
    fn shader_compile_status(&self, shader: &Self::Shader) -> bool;
    /// The shader's info log, empty if there is nothing to report.
    fn shader_info_log(&self, shader: &Self::Shader) -> String;
    /// Deletes the shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Creates an empty program object.
    fn create_program(&self) -> Self::Program;
    /// Attaches a compiled shader to the program.
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    /// Links the program from its attached shaders.
    fn link_program(&self, program: &Self::Program);
    /// Whether the last link succeeded.
    fn program_link_status(&self, program: &Self::Program) -> bool;
    /// The program's info log, empty if there is nothing to report.
    fn program_info_log(&self, program: &Self::Program) -> String;

    /// Number of active attributes the linker kept.
    fn active_attribute_count(&self, program: &Self::Program) -> u32;
    /// Name of the active attribute at `index`, or None past the end.
    fn active_attribute(&self, program: &Self::Program, index: u32) -> Option<String>;
    /// Location of a named attribute, negative if it doesn't exist.
    fn attribute_location(&self, program: &Self::Program, name: &str) -> i32;
    /// Number of active uniforms the linker kept.
    fn active_uniform_count(&self, program: &Self::Program) -> u32;
    /// The active uniform at `index`, or None past the end.
    fn active_uniform(&self, program: &Self::Program, index: u32) -> Option<ActiveUniform>;
    /// Location of a named uniform, or None if it doesn't exist.
    fn uniform_location(&self, program: &Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Enables the vertex attribute slot at `location`.
    fn enable_vertex_attrib_array(&self, location: u32);
    /// Disables the vertex attribute slot at `location`.
    fn disable_vertex_attrib_array(&self, location: u32);
    /// Binds `buffer` as the current vertex buffer.
    fn bind_array_buffer(&self, buffer: &Self::Buffer);
    /// Describes the slot at `location` as `components` tightly packed
    /// floats at `stride`/`offset` bytes into the bound vertex buffer.
    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: i32);
    /// Sets the slot's per-instance advance rate (0 = per vertex).
    fn vertex_attrib_divisor(&self, location: u32, divisor: u32);

    /// Sets a `float` uniform.
    fn uniform1f(&self, location: &Self::UniformLocation, v: f32);
    /// Sets a `vec2` uniform.
    fn uniform2f(&self, location: &Self::UniformLocation, x: f32, y: f32);
    /// Sets a `vec3` uniform.
    fn uniform3f(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32);
    /// Sets a `vec4` uniform.
    fn uniform4f(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32);
    /// Sets a `float` array uniform from a flat sequence.
    fn uniform1fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets a `vec2` array uniform from a flat sequence.
    fn uniform2fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets a `vec3` array uniform from a flat sequence.
    fn uniform3fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets a `vec4` array uniform from a flat sequence.
    fn uniform4fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets a `mat3` uniform from 9 column-major floats.
    fn uniform_matrix3fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets a `mat4` uniform from 16 column-major floats.
    fn uniform_matrix4fv(&self, location: &Self::UniformLocation, v: &[f32]);
    /// Sets an `int` uniform.
    fn uniform1i(&self, location: &Self::UniformLocation, v: i32);
    /// Sets an `ivec2` uniform.
    fn uniform2i(&self, location: &Self::UniformLocation, x: i32, y: i32);
    /// Sets an `ivec3` uniform.
    fn uniform3i(&self, location: &Self::UniformLocation, x: i32, y: i32, z: i32);
    /// Sets an `ivec4` uniform.
    fn uniform4i(&self, location: &Self::UniformLocation, x: i32, y: i32, z: i32, w: i32);
    /// Sets an `int` array uniform from a flat sequence.
    fn uniform1iv(&self, location: &Self::UniformLocation, v: &[i32]);
    /// Sets an `ivec2` array uniform from a flat sequence.
    fn uniform2iv(&self, location: &Self::UniformLocation, v: &[i32]);
    /// Sets an `ivec3` array uniform from a flat sequence.
    fn uniform3iv(&self, location: &Self::UniformLocation, v: &[i32]);
    /// Sets an `ivec4` array uniform from a flat sequence.
    fn uniform4iv(&self, location: &Self::UniformLocation, v: &[i32]);

    /// Selects the active texture unit.
    fn active_texture(&self, unit: u32);
    /// Binds a 2D texture to the active unit.
    fn bind_texture_2d(&self, texture: &Self::Texture);
    /// Binds a 3D texture to the active unit.
    fn bind_texture_3d(&self, texture: &Self::Texture);

    /// Completeness status of the bound framebuffer.
    fn framebuffer_status(&self) -> FramebufferStatus;

    /// Clears the selected buffers to their preset values.
    fn clear(&self, color: bool, depth: bool, stencil: bool);
    /// Sets the color buffer's clear value.
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// Sets the depth buffer's clear value.
    fn clear_depth(&self, depth: f32);
    /// Sets the stencil buffer's clear value.
    fn clear_stencil(&self, stencil: i32);
}
