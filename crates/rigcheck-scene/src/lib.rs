//! rigcheck Scene - Access to the live scene being validated
//!
//! The reconciliation engine only talks to a scene through [`SceneAccessor`].
//! [`MemoryScene`] is a complete in-memory implementation, loadable from
//! TOML snapshots, used by the CLI and by tests.

mod accessor;
mod memory;
mod snapshot;

pub use accessor::{Edit, EditBatch, SceneAccessor};
pub use memory::{Attribute, MemoryScene, SceneObject};
pub use snapshot::{
    load_scene, load_scene_string, save_scene, save_scene_string, scene_to_file, ConnectionDef,
    SceneFile, SceneMetadata,
};
