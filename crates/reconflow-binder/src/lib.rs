//! Argument binding and command rendering.
//!
//! Turns a tool's declared arguments plus the values a user has entered on a
//! node into a complete, normalized parameter set, and renders that set
//! through the tool's command template into the argument vector handed to the
//! execution backend.
//!
//! # Flow
//! 1. Coercion on write: raw JSON from the editor → typed [`ParamValue`]
//! 2. Binding: node params + catalog defaults → [`BoundParams`] (every argument covered)
//! 3. Rendering: [`BoundParams`] + command template → `Vec<String>`
//!
//! All three steps are pure functions of their inputs.
//!
//! [`ParamValue`]: reconflow_catalog::ParamValue

mod bind;
mod coerce;
mod error;
mod render;

pub use bind::{BindingIssue, BoundParams, bind, set_param};
pub use coerce::{coerce, coerce_param, empty_value};
pub use error::BindError;
pub use render::{bind_and_render, render_command};
