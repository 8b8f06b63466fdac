// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::builder::ShaderBuilder;
use crate::gl::{GlContext, ShaderStage};
use crate::program::Program;
use crate::setters::{build_attribute_setters, build_uniform_setters};
use linear_map::LinearMap;
use log::{error, info, warn};
use std::cell::RefCell;

/// Substitution value injected with the light count on every fetch, so
/// templates can size light arrays with `##NUM_LIGHTS`.
pub const NUM_LIGHTS_VALUE: &str = "NUM_LIGHTS";

/// Flag appended when the light count is zero, so templates can gate light
/// arrays behind `#ifndef NO_LIGHTS`.
pub const NO_LIGHTS_FLAG: &str = "NO_LIGHTS";

/// Raw sources for every stage of one logical program template, ingested in
/// one call.
pub struct ProgramTemplateSource {
    /// Program template name.
    pub id: String,
    /// Raw parameterized source per stage.
    pub sources: LinearMap<ShaderStage, String>,
}

/// One requested configuration of a program template: which template, which
/// flags are active and which substitution values apply. Transient;
/// constructed per fetch and never mutated by the fetch.
pub struct ProgramTemplate {
    name: String,
    program_id: String,
    flags: Vec<String>,
    values: LinearMap<String, String>,
}

impl ProgramTemplate {
    /// Creates a request for `name` with the given flags and values. The
    /// composite identity is derived from the name plus sorted flags and
    /// sorted value pairs, so logically identical requests always share a
    /// cache entry no matter the order they were assembled in.
    pub fn new(
        name: impl Into<String>,
        flags: Vec<String>,
        values: LinearMap<String, String>,
    ) -> Self {
        let name = name.into();

        let mut program_id = name.clone();
        let mut sorted_flags: Vec<&String> = flags.iter().collect();
        sorted_flags.sort();
        for flag in sorted_flags {
            program_id.push_str(flag);
        }
        let mut sorted_values: Vec<(&String, &String)> = values.iter().collect();
        sorted_values.sort();
        for (name, value) in sorted_values {
            program_id.push_str(name);
            program_id.push_str(value);
        }

        Self {
            name,
            program_id,
            flags,
            values,
        }
    }

    /// The template name shaders are fetched under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The derived composite identity.
    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    /// Active feature flags.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Substitution values.
    pub fn values(&self) -> &LinearMap<String, String> {
        &self.values
    }
}

/// Builds and caches program variants: template expansion, compilation,
/// linking and binding-table construction, one build per composite key.
/// Owned by the context manager; entries live as long as it does.
pub struct ProgramManager<G: GlContext> {
    builder: RefCell<ShaderBuilder>,
    compiled: RefCell<LinearMap<String, Program<G>>>,
}

impl<G: GlContext> Default for ProgramManager<G> {
    fn default() -> Self {
        Self {
            builder: RefCell::new(ShaderBuilder::new()),
            compiled: RefCell::new(LinearMap::new()),
        }
    }
}

impl<G: GlContext> ProgramManager<G> {
    /// Creates a manager with no templates and an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if template trees for both stages of `id` are stored.
    pub fn has_template(&self, id: &str) -> bool {
        let builder = self.builder.borrow();
        builder.has_template(&format!("{}{}", id, ShaderStage::Vertex.suffix()))
            && builder.has_template(&format!("{}{}", id, ShaderStage::Fragment.suffix()))
    }

    /// Ingests the template trees for every stage of one logical program,
    /// overwriting any prior trees under the same id.
    pub fn add_template(&self, template: &ProgramTemplateSource) {
        let mut builder = self.builder.borrow_mut();
        for (stage, source) in &template.sources {
            builder.build_template_tree(&format!("{}{}", template.id, stage.suffix()), source);
        }
    }

    /// Fetches the program variant for `template` specialized to
    /// `num_lights`, building it on the first request and serving the
    /// cached bundle on every subsequent one. Returns None if expansion
    /// fails (unknown template or missing substitution value); compile and
    /// link failures are logged but still produce a cached program.
    pub fn fetch_program(
        &self,
        gl: &G,
        template: &ProgramTemplate,
        num_lights: u32,
    ) -> Option<Program<G>> {
        let key = format!("{}{}{}", template.program_id(), NUM_LIGHTS_VALUE, num_lights);

        if let Some(program) = self.compiled.borrow().get(&key) {
            return Some(program.clone());
        }

        // Specialize a copy of the request; the caller's stays untouched.
        let mut flags = template.flags().to_vec();
        if num_lights == 0 {
            flags.push(NO_LIGHTS_FLAG.to_owned());
        }
        let mut values = template.values().clone();
        values.insert(NUM_LIGHTS_VALUE.to_owned(), num_lights.to_string());

        let builder = self.builder.borrow();
        let vertex = builder.fetch_shader(
            &format!("{}{}", template.name(), ShaderStage::Vertex.suffix()),
            &flags,
            &values,
        );
        let fragment = builder.fetch_shader(
            &format!("{}{}", template.name(), ShaderStage::Fragment.suffix()),
            &flags,
            &values,
        );
        drop(builder);

        let (vertex, fragment) = match (vertex, fragment) {
            (Some(vertex), Some(fragment)) => (vertex, fragment),
            _ => {
                error!("failed to build shader program {}", template.name());
                return None;
            }
        };

        let vert_shader = compile_shader(gl, ShaderStage::Vertex, &vertex);
        let frag_shader = compile_shader(gl, ShaderStage::Fragment, &fragment);

        let native = gl.create_program();
        gl.attach_shader(&native, &vert_shader);
        gl.attach_shader(&native, &frag_shader);
        gl.link_program(&native);

        if !gl.program_link_status(&native) {
            error!(
                "could not link shader program {}:\n{}",
                template.name(),
                gl.program_info_log(&native)
            );
            info!("vertex shader:\n{}", vertex);
            info!("fragment shader:\n{}", fragment);
        }

        // The stage objects served their purpose once the program is linked.
        gl.delete_shader(vert_shader);
        gl.delete_shader(frag_shader);

        let attributes = build_attribute_setters(gl, &native);
        let uniforms = build_uniform_setters(gl, &native);

        let program = Program::new(native, attributes, uniforms);
        program.mark_initialized();

        // Insert only now, so the cache never holds a partial bundle.
        self.compiled.borrow_mut().insert(key, program.clone());

        Some(program)
    }
}

/// Compiles one stage. Failure is observed, not thrown: diagnostics go to
/// the log and the handle is returned regardless so the fetch path can
/// degrade instead of aborting.
fn compile_shader<G: GlContext>(gl: &G, stage: ShaderStage, source: &str) -> G::Shader {
    let shader = gl.create_shader(stage);
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if !gl.shader_compile_status(&shader) {
        error!("{} shader failed to compile:\n{}", stage, gl.shader_info_log(&shader));
    }

    let log = gl.shader_info_log(&shader);
    if !log.is_empty() {
        warn!("{} shader info log: {}", stage, log);
    }

    shader
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::trace::{Call, TraceGl};

    const VERTEX_TEMPLATE: &str = "attribute vec3 VPos;
uniform mat4 uMVP;
#ifdef LIT
uniform vec3 uAmbient;
#endif
#ifndef NO_LIGHTS
uniform vec3 uLights[##NUM_LIGHTS];
#endif
void main() { gl_Position = uMVP * vec4(VPos, 1.0); }
";

    const FRAGMENT_TEMPLATE: &str = "precision mediump float;
void main() { gl_FragColor = vec4(1.0); }
";

    fn manager_with_template(sources: &[(ShaderStage, &str)]) -> ProgramManager<TraceGl> {
        let manager = ProgramManager::new();
        manager.add_template(&ProgramTemplateSource {
            id: "basic".to_owned(),
            sources: sources
                .iter()
                .map(|(stage, source)| (*stage, source.to_string()))
                .collect(),
        });
        manager
    }

    fn basic_manager() -> ProgramManager<TraceGl> {
        manager_with_template(&[
            (ShaderStage::Vertex, VERTEX_TEMPLATE),
            (ShaderStage::Fragment, FRAGMENT_TEMPLATE),
        ])
    }

    fn request(flags: &[&str]) -> ProgramTemplate {
        ProgramTemplate::new(
            "basic",
            flags.iter().map(|f| f.to_string()).collect(),
            LinearMap::new(),
        )
    }

    fn compiles(gl: &TraceGl) -> usize {
        gl.count(|c| matches!(c, Call::CompileShader(_)))
    }

    fn links(gl: &TraceGl) -> usize {
        gl.count(|c| matches!(c, Call::LinkProgram(_)))
    }

    #[test]
    fn has_template_requires_both_stages() {
        let manager = basic_manager();
        assert!(manager.has_template("basic"));
        assert!(!manager.has_template("other"));

        let vertex_only = manager_with_template(&[(ShaderStage::Vertex, VERTEX_TEMPLATE)]);
        assert!(!vertex_only.has_template("basic"));
    }

    #[test]
    fn fetch_compiles_links_and_sizes_light_array() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let program = manager.fetch_program(&gl, &request(&[]), 3).unwrap();
        assert!(program.initialized());
        assert_eq!(compiles(&gl), 2);
        assert_eq!(links(&gl), 1);

        let sources = gl.shader_sources();
        assert!(sources[0].contains("uniform vec3 uLights[3];"));
        assert!(!sources[0].contains("uAmbient"));
    }

    #[test]
    fn zero_lights_takes_no_lights_path() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        manager.fetch_program(&gl, &request(&["LIT"]), 0).unwrap();

        let sources = gl.shader_sources();
        assert!(!sources[0].contains("uLights"));
        assert!(sources[0].contains("uniform vec3 uAmbient;"));
    }

    #[test]
    fn cache_hit_serves_same_bundle_without_work() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let first = manager.fetch_program(&gl, &request(&[]), 2).unwrap();
        let again = manager.fetch_program(&gl, &request(&[]), 2).unwrap();
        assert!(first.ptr_eq(&again));
        assert_eq!(compiles(&gl), 2);
        assert_eq!(links(&gl), 1);
    }

    #[test]
    fn light_count_distinguishes_variants() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let two = manager.fetch_program(&gl, &request(&[]), 2).unwrap();
        let three = manager.fetch_program(&gl, &request(&[]), 3).unwrap();
        assert!(!two.ptr_eq(&three));
        assert_eq!(compiles(&gl), 4);
        assert_eq!(links(&gl), 2);
    }

    #[test]
    fn flag_order_does_not_distinguish_variants() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let a = manager.fetch_program(&gl, &request(&["LIT", "FOG"]), 1);
        let b = manager.fetch_program(&gl, &request(&["FOG", "LIT"]), 1);
        assert!(a.unwrap().ptr_eq(&b.unwrap()));
        assert_eq!(links(&gl), 1);
    }

    #[test]
    fn fetch_does_not_mutate_the_request() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let template = request(&["LIT"]);
        manager.fetch_program(&gl, &template, 0).unwrap();

        assert_eq!(template.flags(), ["LIT"]);
        assert!(template.values().get(NUM_LIGHTS_VALUE).is_none());

        // A later fetch with lights sees none of the zero-light state.
        manager.fetch_program(&gl, &template, 2).unwrap();
        assert!(gl.shader_sources()[2].contains("uLights[2]"));
    }

    #[test]
    fn expansion_failure_builds_and_caches_nothing() {
        let gl = TraceGl::default();
        let manager = manager_with_template(&[
            (ShaderStage::Vertex, "uniform float uScale[##COUNT];\n"),
            (ShaderStage::Fragment, FRAGMENT_TEMPLATE),
        ]);

        assert!(manager.fetch_program(&gl, &request(&[]), 1).is_none());
        assert_eq!(compiles(&gl), 0);
        assert_eq!(links(&gl), 0);

        // Still absent; the failed fetch left no entry behind.
        assert!(manager.fetch_program(&gl, &request(&[]), 1).is_none());
    }

    #[test]
    fn unknown_template_fails_fetch() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        let other = ProgramTemplate::new("other", Vec::new(), LinearMap::new());
        assert!(manager.fetch_program(&gl, &other, 1).is_none());
        assert_eq!(compiles(&gl), 0);
    }

    #[test]
    fn link_failure_still_caches_an_initialized_program() {
        let gl = TraceGl::default();
        gl.link_status.set(false);
        let manager = basic_manager();

        let program = manager.fetch_program(&gl, &request(&[]), 1).unwrap();
        assert!(program.initialized());

        let again = manager.fetch_program(&gl, &request(&[]), 1).unwrap();
        assert!(program.ptr_eq(&again));
        assert_eq!(links(&gl), 1);
    }

    #[test]
    fn stage_shaders_deleted_after_linking() {
        let gl = TraceGl::default();
        let manager = basic_manager();

        manager.fetch_program(&gl, &request(&[]), 1).unwrap();
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteShader(_))), 2);

        // Deletion happens after linking, not before.
        let calls = gl.calls();
        let link = calls.iter().position(|c| matches!(c, Call::LinkProgram(_)));
        let delete = calls.iter().position(|c| matches!(c, Call::DeleteShader(_)));
        assert!(link.unwrap() < delete.unwrap());
    }

    #[test]
    fn built_program_reflects_setters() {
        let gl = TraceGl {
            attributes: vec!["VPos".to_owned()],
            uniforms: vec![TraceGl::uniform(
                "uMVP",
                crate::gl::glsl_type::FLOAT_MAT4,
                1,
            )],
            ..Default::default()
        };
        let manager = basic_manager();

        let program = manager.fetch_program(&gl, &request(&[]), 1).unwrap();
        assert!(program.attributes().get("VPos").is_some());
        assert!(program.uniforms().get("uMVP").is_some());
        assert_eq!(program.uniforms().validate(), vec!["uMVP"]);
    }
}
