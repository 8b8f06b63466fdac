// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::template::ShaderTemplate;
use linear_map::LinearMap;
use std::collections::HashMap;

/// Stores parsed [`ShaderTemplate`] trees keyed by shader-source id
/// (program id + stage suffix). Storage is separate from expansion so the
/// same tree can be expanded many times with different flags and values
/// without re-parsing.
#[derive(Default)]
pub struct ShaderBuilder {
    templates: HashMap<String, ShaderTemplate>,
}

impl ShaderBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a template tree is stored under `id`.
    pub fn has_template(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Parses `source` and stores the tree under `id`, overwriting any
    /// prior tree. Malformed source leaves the store unchanged; the caller
    /// observes that as the template still being absent.
    pub fn build_template_tree(&mut self, id: &str, source: &str) {
        if let Some(template) = ShaderTemplate::parse(source) {
            self.templates.insert(id.to_owned(), template);
        }
    }

    /// Expands the template stored under `id`. Returns None if the id is
    /// unknown or a referenced substitution value is missing.
    pub fn fetch_shader(
        &self,
        id: &str,
        flags: &[String],
        values: &LinearMap<String, String>,
    ) -> Option<String> {
        self.templates.get(id)?.expand(flags, values)
    }
}
