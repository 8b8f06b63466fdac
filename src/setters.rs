// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::gl::{glsl_type, GlContext};
use glam::*;
use linear_map::LinearMap;
use log::warn;
use std::cell::RefCell;

/// Binds a vertex buffer to one active attribute of a linked program.
pub struct AttributeSetter {
    location: u32,
}

impl AttributeSetter {
    /// The attribute's reflected location.
    pub fn location(&self) -> u32 {
        self.location
    }

    /// Points the attribute at `buffer`, describing tightly packed floats
    /// of `item_size` components. Item sizes over 4 span
    /// `ceil(item_size / 4)` consecutive locations of 4 floats each at a
    /// 64 byte stride, the standard way of feeding a mat4 through four
    /// chained vec4 slots. The advance rate is `divisor` iff `instanced`,
    /// otherwise per-vertex.
    pub fn set<G: GlContext>(
        &self,
        gl: &G,
        buffer: &G::Buffer,
        item_size: u32,
        instanced: bool,
        divisor: u32,
    ) {
        let divisor = if instanced { divisor } else { 0 };

        if item_size <= 4 {
            gl.enable_vertex_attrib_array(self.location);
            gl.bind_array_buffer(buffer);
            gl.vertex_attrib_pointer(self.location, item_size as i32, 0, 0);
            gl.vertex_attrib_divisor(self.location, divisor);
        } else {
            gl.bind_array_buffer(buffer);

            for slot in 0..(item_size + 3) / 4 {
                let location = self.location + slot;
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer(location, 4, 4 * 16, (slot * 16) as i32);
                gl.vertex_attrib_divisor(location, divisor);
            }
        }
    }

    /// Disables the attribute slot.
    pub fn free<G: GlContext>(&self, gl: &G) {
        gl.disable_vertex_attrib_array(self.location);
    }
}

/// One [`AttributeSetter`] per active attribute of a linked program.
/// Attributes the linker optimized away have no entry.
pub struct AttributeSetters {
    entries: LinearMap<String, AttributeSetter>,
}

impl AttributeSetters {
    /// Looks up the setter for a named attribute.
    pub fn get(&self, name: &str) -> Option<&AttributeSetter> {
        self.entries.get(name)
    }

    /// Number of active attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the program has no active attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Introspects a linked program's active attributes.
pub(crate) fn build_attribute_setters<G: GlContext>(
    gl: &G,
    program: &G::Program,
) -> AttributeSetters {
    let mut entries = LinearMap::new();

    for index in 0..gl.active_attribute_count(program) {
        let name = match gl.active_attribute(program, index) {
            Some(name) => name,
            None => continue,
        };
        let location = gl.attribute_location(program, &name);
        if location < 0 {
            continue;
        }
        entries.insert(
            name,
            AttributeSetter {
                location: location as u32,
            },
        );
    }

    AttributeSetters { entries }
}

/// Upload convention for one uniform, selected from its reflected GLSL type
/// and array arity. Scalar and array forms are distinct on purpose; arrays
/// take flat numeric sequences.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UniformKind {
    /// `float`
    Float,
    /// `float[n]`
    FloatArray,
    /// `vec2`
    Vec2,
    /// `vec2[n]`
    Vec2Array,
    /// `vec3`
    Vec3,
    /// `vec3[n]`
    Vec3Array,
    /// `vec4`
    Vec4,
    /// `vec4[n]`
    Vec4Array,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `int`
    Int,
    /// `int[n]`
    IntArray,
    /// `ivec2`
    IVec2,
    /// `ivec2[n]`
    IVec2Array,
    /// `ivec3`
    IVec3,
    /// `ivec3[n]`
    IVec3Array,
    /// `ivec4`
    IVec4,
    /// `ivec4[n]`
    IVec4Array,
    /// `bool`, uploaded as a float
    Bool,
    /// `sampler2D`
    Sampler2d,
    /// `sampler3D`
    Sampler3d,
}

impl UniformKind {
    /// Selects the upload convention for a reflected type tag, or None for
    /// type tags with no convention (those uniforms get no setter).
    fn from_active(type_tag: u32, size: u32) -> Option<Self> {
        let array = size > 1;
        Some(match type_tag {
            glsl_type::FLOAT if array => Self::FloatArray,
            glsl_type::FLOAT => Self::Float,
            glsl_type::FLOAT_VEC2 if array => Self::Vec2Array,
            glsl_type::FLOAT_VEC2 => Self::Vec2,
            glsl_type::FLOAT_VEC3 if array => Self::Vec3Array,
            glsl_type::FLOAT_VEC3 => Self::Vec3,
            glsl_type::FLOAT_VEC4 if array => Self::Vec4Array,
            glsl_type::FLOAT_VEC4 => Self::Vec4,
            glsl_type::FLOAT_MAT3 => Self::Mat3,
            glsl_type::FLOAT_MAT4 => Self::Mat4,
            glsl_type::INT if array => Self::IntArray,
            glsl_type::INT => Self::Int,
            glsl_type::INT_VEC2 if array => Self::IVec2Array,
            glsl_type::INT_VEC2 => Self::IVec2,
            glsl_type::INT_VEC3 if array => Self::IVec3Array,
            glsl_type::INT_VEC3 => Self::IVec3,
            glsl_type::INT_VEC4 if array => Self::IVec4Array,
            glsl_type::INT_VEC4 => Self::IVec4,
            glsl_type::BOOL => Self::Bool,
            glsl_type::SAMPLER_2D => Self::Sampler2d,
            glsl_type::SAMPLER_3D => Self::Sampler3d,
            _ => return None,
        })
    }
}

/// A value for [`UniformSetters::set`]. Array variants are flat slices of
/// glam values uploaded with a single vectorized call. Sampler variants
/// carry the texture to bind and the texture unit to bind it to.
pub enum UniformValue<'a, G: GlContext> {
    /// `float`
    Float(f32),
    /// `float[n]`
    Floats(&'a [f32]),
    /// `vec2`
    Vec2(Vec2),
    /// `vec2[n]`
    Vec2s(&'a [Vec2]),
    /// `vec3`
    Vec3(Vec3),
    /// `vec3[n]`
    Vec3s(&'a [Vec3]),
    /// `vec4`
    Vec4(Vec4),
    /// `vec4[n]`
    Vec4s(&'a [Vec4]),
    /// `mat3`
    Mat3(Mat3),
    /// `mat4`
    Mat4(Mat4),
    /// `int`
    Int(i32),
    /// `int[n]`
    Ints(&'a [i32]),
    /// `ivec2`
    IVec2(IVec2),
    /// `ivec2[n]`
    IVec2s(&'a [IVec2]),
    /// `ivec3`
    IVec3(IVec3),
    /// `ivec3[n]`
    IVec3s(&'a [IVec3]),
    /// `ivec4`
    IVec4(IVec4),
    /// `ivec4[n]`
    IVec4s(&'a [IVec4]),
    /// `bool`
    Bool(bool),
    /// `sampler2D` plus the unit to bind it to
    Texture2d(&'a G::Texture, u32),
    /// `sampler3D` plus the unit to bind it to
    Texture3d(&'a G::Texture, u32),
}

/// Uploads a value to one active uniform of a linked program.
pub struct UniformSetter<L> {
    location: L,
    kind: UniformKind,
}

impl<L> UniformSetter<L> {
    /// The uniform's reflected location.
    pub fn location(&self) -> &L {
        &self.location
    }

    /// The upload convention selected at build time.
    pub fn kind(&self) -> UniformKind {
        self.kind
    }

    fn apply<G: GlContext<UniformLocation = L>>(
        &self,
        gl: &G,
        name: &str,
        value: UniformValue<G>,
    ) {
        let location = &self.location;
        match (self.kind, value) {
            (UniformKind::Float, UniformValue::Float(v)) => gl.uniform1f(location, v),
            (UniformKind::FloatArray, UniformValue::Floats(v)) => gl.uniform1fv(location, v),
            (UniformKind::Vec2, UniformValue::Vec2(v)) => gl.uniform2f(location, v.x, v.y),
            (UniformKind::Vec2Array, UniformValue::Vec2s(v)) => {
                gl.uniform2fv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::Vec3, UniformValue::Vec3(v)) => gl.uniform3f(location, v.x, v.y, v.z),
            (UniformKind::Vec3Array, UniformValue::Vec3s(v)) => {
                gl.uniform3fv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::Vec4, UniformValue::Vec4(v)) => {
                gl.uniform4f(location, v.x, v.y, v.z, v.w)
            }
            (UniformKind::Vec4Array, UniformValue::Vec4s(v)) => {
                gl.uniform4fv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::Mat3, UniformValue::Mat3(m)) => {
                gl.uniform_matrix3fv(location, &m.to_cols_array())
            }
            (UniformKind::Mat4, UniformValue::Mat4(m)) => {
                gl.uniform_matrix4fv(location, &m.to_cols_array())
            }
            (UniformKind::Int, UniformValue::Int(v)) => gl.uniform1i(location, v),
            (UniformKind::IntArray, UniformValue::Ints(v)) => gl.uniform1iv(location, v),
            (UniformKind::IVec2, UniformValue::IVec2(v)) => gl.uniform2i(location, v.x, v.y),
            (UniformKind::IVec2Array, UniformValue::IVec2s(v)) => {
                gl.uniform2iv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::IVec3, UniformValue::IVec3(v)) => gl.uniform3i(location, v.x, v.y, v.z),
            (UniformKind::IVec3Array, UniformValue::IVec3s(v)) => {
                gl.uniform3iv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::IVec4, UniformValue::IVec4(v)) => {
                gl.uniform4i(location, v.x, v.y, v.z, v.w)
            }
            (UniformKind::IVec4Array, UniformValue::IVec4s(v)) => {
                gl.uniform4iv(location, bytemuck::cast_slice(v))
            }
            (UniformKind::Bool, UniformValue::Bool(v)) => gl.uniform1f(location, v as u32 as f32),
            (UniformKind::Sampler2d, UniformValue::Texture2d(texture, unit)) => {
                gl.active_texture(unit);
                gl.bind_texture_2d(texture);
                gl.uniform1i(location, unit as i32);
            }
            (UniformKind::Sampler3d, UniformValue::Texture3d(texture, unit)) => {
                gl.active_texture(unit);
                gl.bind_texture_3d(texture);
                gl.uniform1i(location, unit as i32);
            }
            (kind, _) => {
                if cfg!(debug_assertions) {
                    warn!("uniform {} was set with a value that isn't a {:?}", name, kind);
                }
            }
        }
    }
}

/// One [`UniformSetter`] per active uniform of a linked program, plus the
/// validation record tracking which uniforms have been set since the last
/// [`reset`][`Self::reset`]. The record's key set is fixed at build time
/// and covers every active uniform, including ones whose reflected type
/// has no upload convention.
pub struct UniformSetters<L> {
    entries: LinearMap<String, UniformSetter<L>>,
    set_marks: RefCell<LinearMap<String, bool>>,
}

impl<L> UniformSetters<L> {
    /// Looks up the setter for a named uniform.
    pub fn get(&self, name: &str) -> Option<&UniformSetter<L>> {
        self.entries.get(name)
    }

    /// Number of uniforms with a setter.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no uniform has a setter.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uploads `value` to the uniform called `name` and marks it set. A
    /// name without a setter is ignored (warned about in debug builds).
    pub fn set<G: GlContext<UniformLocation = L>>(
        &self,
        gl: &G,
        name: &str,
        value: UniformValue<G>,
    ) {
        let setter = match self.entries.get(name) {
            Some(setter) => setter,
            None => {
                if cfg!(debug_assertions) {
                    warn!("uniform {} does not exist or is not in use", name);
                }
                return;
            }
        };
        setter.apply(gl, name, value);

        if let Some(mark) = self.set_marks.borrow_mut().get_mut(name) {
            *mark = true;
        }
    }

    /// Marks every uniform as not set.
    pub fn reset(&self) {
        for (_, mark) in self.set_marks.borrow_mut().iter_mut() {
            *mark = false;
        }
    }

    /// Names of the uniforms not set since the last reset, in reflection
    /// order. Intended as a completeness check before a draw call; issuing
    /// it is the caller's responsibility.
    pub fn validate(&self) -> Vec<String> {
        self.set_marks
            .borrow()
            .iter()
            .filter(|(_, set)| !**set)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Introspects a linked program's active uniforms. Uniforms whose reflected
/// type has no upload convention silently get no setter, but still land in
/// the validation record.
pub(crate) fn build_uniform_setters<G: GlContext>(
    gl: &G,
    program: &G::Program,
) -> UniformSetters<G::UniformLocation> {
    let mut entries = LinearMap::new();
    let mut set_marks = LinearMap::new();

    for index in 0..gl.active_uniform_count(program) {
        let info = match gl.active_uniform(program, index) {
            Some(info) => info,
            None => continue,
        };

        set_marks.insert(info.name.clone(), false);

        let kind = match UniformKind::from_active(info.glsl_type, info.size) {
            Some(kind) => kind,
            None => continue,
        };
        let location = match gl.uniform_location(program, &info.name) {
            Some(location) => location,
            None => continue,
        };
        entries.insert(info.name, UniformSetter { location, kind });
    }

    UniformSetters {
        entries,
        set_marks: RefCell::new(set_marks),
    }
}
