// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use linear_map::LinearMap;

/// A parsed shader-source template: raw GLSL interspersed with conditional
/// regions gated by named flags and `##NAME` placeholders filled from a
/// value mapping. Immutable after construction; expanded any number of
/// times with different inputs.
pub struct ShaderTemplate {
    nodes: Vec<Node>,
}

enum Node {
    Text(String),
    Conditional {
        flag: String,
        /// Include the body iff the flag is absent instead of present.
        negated: bool,
        body: Vec<Node>,
    },
}

impl ShaderTemplate {
    /// Parses raw source into a template tree. Directives occupy whole
    /// lines: `#ifdef FLAG`, `#ifndef FLAG` and `#endif`, nesting allowed.
    /// Returns None for malformed source (unbalanced or nameless
    /// directives), never a partial tree.
    pub fn parse(source: &str) -> Option<Self> {
        // Stack of open conditionals, innermost last. The bool is negation.
        let mut open: Vec<(String, bool, Vec<Node>)> = Vec::new();
        let mut nodes = Vec::new();

        for line in source.lines() {
            let mut tokens = line.split_ascii_whitespace();
            let first = tokens.next();

            let directive = match first {
                Some("#ifdef") => Some(false),
                Some("#ifndef") => Some(true),
                _ => None,
            };

            if let Some(negated) = directive {
                let flag = match tokens.next() {
                    Some(flag) => flag,
                    None => return None,
                };
                if tokens.next().is_some() {
                    return None;
                }
                open.push((flag.to_owned(), negated, Vec::new()));
            } else if first == Some("#endif") && tokens.next().is_none() {
                let (flag, negated, body) = match open.pop() {
                    Some(top) => top,
                    None => return None,
                };
                let node = Node::Conditional {
                    flag,
                    negated,
                    body,
                };
                match open.last_mut() {
                    Some((_, _, parent)) => parent.push(node),
                    None => nodes.push(node),
                }
            } else {
                let mut text = line.to_owned();
                text.push('\n');
                match open.last_mut() {
                    Some((_, _, parent)) => parent.push(Node::Text(text)),
                    None => nodes.push(Node::Text(text)),
                }
            }
        }

        if !open.is_empty() {
            return None;
        }
        Some(Self { nodes })
    }

    /// Expands the template with a set of active flags and a value mapping.
    /// Output depends only on flag membership and value lookups, never on
    /// insertion order. Returns None if an included region references a
    /// value absent from `values`; excluded regions are skipped entirely.
    pub fn expand(&self, flags: &[String], values: &LinearMap<String, String>) -> Option<String> {
        let mut out = String::new();
        if expand_nodes(&self.nodes, flags, values, &mut out) {
            Some(out)
        } else {
            None
        }
    }
}

fn expand_nodes(
    nodes: &[Node],
    flags: &[String],
    values: &LinearMap<String, String>,
    out: &mut String,
) -> bool {
    for node in nodes {
        match node {
            Node::Text(text) => {
                if !substitute(text, values, out) {
                    return false;
                }
            }
            Node::Conditional {
                flag,
                negated,
                body,
            } => {
                if flags.iter().any(|f| f == flag) != *negated
                    && !expand_nodes(body, flags, values, out)
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Appends `text` to `out`, replacing each `##NAME` placeholder from
/// `values`. A `##` not followed by an identifier is kept literally.
fn substitute(text: &str, values: &LinearMap<String, String>, out: &mut String) -> bool {
    let mut rest = text;
    while let Some(start) = rest.find("##") {
        out.push_str(&rest[..start]);
        rest = &rest[start + 2..];

        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            out.push_str("##");
            continue;
        }

        let name = &rest[..len];
        match values.get(name) {
            Some(value) => out.push_str(value),
            None => return false,
        }
        rest = &rest[len..];
    }
    out.push_str(rest);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> LinearMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn flags(names: &[&str]) -> Vec<String> {
        names.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn conditional_included_iff_flag_present() {
        let template = ShaderTemplate::parse("a\n#ifdef LIT\nb\n#endif\nc\n").unwrap();
        assert_eq!(
            template.expand(&flags(&["LIT"]), &values(&[])).unwrap(),
            "a\nb\nc\n"
        );
        assert_eq!(template.expand(&flags(&[]), &values(&[])).unwrap(), "a\nc\n");
    }

    #[test]
    fn negated_conditional_included_iff_flag_absent() {
        let template = ShaderTemplate::parse("#ifndef NO_LIGHTS\nlights\n#endif\n").unwrap();
        assert_eq!(
            template.expand(&flags(&[]), &values(&[])).unwrap(),
            "lights\n"
        );
        assert_eq!(
            template
                .expand(&flags(&["NO_LIGHTS"]), &values(&[]))
                .unwrap(),
            ""
        );
    }

    #[test]
    fn nested_conditionals() {
        let source = "#ifdef A\na\n#ifdef B\nb\n#endif\n#endif\n";
        let template = ShaderTemplate::parse(source).unwrap();
        assert_eq!(
            template.expand(&flags(&["A", "B"]), &values(&[])).unwrap(),
            "a\nb\n"
        );
        assert_eq!(template.expand(&flags(&["A"]), &values(&[])).unwrap(), "a\n");
        assert_eq!(template.expand(&flags(&["B"]), &values(&[])).unwrap(), "");
    }

    #[test]
    fn substitutes_values() {
        let template = ShaderTemplate::parse("uniform vec3 lights[##NUM_LIGHTS];\n").unwrap();
        assert_eq!(
            template
                .expand(&flags(&[]), &values(&[("NUM_LIGHTS", "3")]))
                .unwrap(),
            "uniform vec3 lights[3];\n"
        );
    }

    #[test]
    fn missing_value_fails_whole_expansion() {
        let template = ShaderTemplate::parse("a\nx ##MISSING y\n").unwrap();
        assert!(template.expand(&flags(&[]), &values(&[])).is_none());
    }

    #[test]
    fn missing_value_in_excluded_region_is_ignored() {
        let template =
            ShaderTemplate::parse("#ifdef LIT\n##MISSING\n#endif\nok\n").unwrap();
        assert_eq!(template.expand(&flags(&[]), &values(&[])).unwrap(), "ok\n");
    }

    #[test]
    fn expansion_is_order_independent() {
        let source = "#ifdef A\na ##X\n#endif\n#ifdef B\nb ##Y\n#endif\n";
        let template = ShaderTemplate::parse(source).unwrap();

        let a = template
            .expand(&flags(&["A", "B"]), &values(&[("X", "1"), ("Y", "2")]))
            .unwrap();
        let b = template
            .expand(&flags(&["B", "A"]), &values(&[("Y", "2"), ("X", "1")]))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn double_hash_without_identifier_kept_literally() {
        let template = ShaderTemplate::parse("a ## b\n").unwrap();
        assert_eq!(
            template.expand(&flags(&[]), &values(&[])).unwrap(),
            "a ## b\n"
        );
    }

    #[test]
    fn unbalanced_source_fails_to_parse() {
        assert!(ShaderTemplate::parse("#ifdef A\nno end\n").is_none());
        assert!(ShaderTemplate::parse("#endif\n").is_none());
        assert!(ShaderTemplate::parse("#ifdef\nbody\n#endif\n").is_none());
    }
}
