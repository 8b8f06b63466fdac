// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(missing_docs)]
#![crate_name = "rendercore"]

//! # RenderCore
//!
//! [`rendercore`][`crate`] is the program-management core of a
//! [WebGL2](https://rustwasm.github.io/wasm-bindgen/api/web_sys/struct.WebGl2RenderingContext.html)
//! rendering abstraction: declarative shader templates, a variant cache
//! keyed by template identity and light count, and typed setter tables
//! built by reflecting linked programs.
//!
//! GL access goes through the [`GlContext`] trait so the whole pipeline
//! runs against the real context in production and a recording context in
//! tests.

mod builder;
mod gl;
mod manager;
mod program;
mod program_manager;
mod setters;
mod template;
mod webgl;

// Re-export to provide a simpler api.
pub use builder::*;
pub use gl::*;
pub use manager::*;
pub use program::*;
pub use program_manager::*;
pub use setters::*;
pub use template::*;
