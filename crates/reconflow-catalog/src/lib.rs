//! Reconflow Catalog
//!
//! This crate contains the declarative tool catalog for reconflow: the
//! definitions of the external security tools a workflow node can invoke.
//!
//! A [`ToolDef`] describes a tool's command template and its arguments. The
//! catalog is loaded once (from a file or from the backend) and shared
//! read-only for the lifetime of the process.
//!
//! Catalogs can be loaded from:
//! - YAML or JSON files (via [`FsCatalog`])
//! - The backend's `/api/tools` endpoint (see `reconflow-client`)

mod catalog;
mod command;
mod error;
mod fs_catalog;
mod tool;
mod value;

pub use catalog::{CatalogSource, ToolCatalog, load_catalog};
pub use command::{ArgSlot, CmdPart, RenderMode, Slot};
pub use error::CatalogError;
pub use fs_catalog::FsCatalog;
pub use tool::{ArgSpec, ArgType, OutputSpec, ToolDef};
pub use value::{ParamValue, Scalar};
