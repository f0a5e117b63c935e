//! On-disk formats: the script container, the translator sidecar, and the
//! engine archive.

mod archive;
mod container;
mod sidecar;

pub use archive::{Archive, ArchiveEntry, ArchiveError, ARCHIVE_MAGIC};
pub use container::{ContainerError, ScriptContainer, ScriptHeader, HEADER_SIZE};
pub use sidecar::{parse_sidecar, write_sidecar, SidecarError, Translation};
