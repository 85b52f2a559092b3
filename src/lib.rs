//! # bpmn-narrator
//!
//! Turns a BPMN 2.0 XML diagram into a hierarchically-numbered narrative of the
//! process, written in Portuguese, suitable for handing to someone who has never
//! seen the diagram.
//!
//! - Every task, gateway and event along a process's reachable paths gets a
//!   dotted-decimal line (`1.2.1.`), indented by nesting depth.
//! - Lanes, attached documents/systems, and text annotations are reported inline.
//! - Message flows between pools and orphaned annotations get their own sections.
//!
//! ## Example
//!
//! ### Cargo.toml
//! ```toml
//! [dependencies]
//! bpmn-narrator = "0.1"
//! log = "0.4"
//! pretty_env_logger = "0.5"
//! ```
//! ### main.rs
//!
//! ```no_run
//! use bpmn_narrator::render_from_path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pretty_env_logger::init();
//!     let narrative = render_from_path(std::path::Path::new("processo.bpmn"))?;
//!     println!("{narrative}");
//!     Ok(())
//! }
//! ```

mod artifacts;
mod collect;
mod dom;
mod error;
mod lanes;
mod links;
mod model;
mod render;
mod walk;

pub use error::{Error, Result};
pub use model::{
    Artifact, ArtifactKind, CatchThrow, EventData, EventPosition, GatewayKind, Node, NodeId,
    NodeKind, SequenceFlow, SubprocessKind, TaskKind,
};
pub use render::{render, render_from_path};
