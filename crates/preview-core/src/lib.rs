pub mod math;
pub mod components;
pub mod source;
pub mod mesh;
pub mod bounds;
pub mod decode;
pub mod lifecycle;

// Re-exports
pub use bounds::BoundingVolume;
pub use components::Transform;
pub use decode::{decode, DecodeError};
pub use lifecycle::{
    LifecycleManager, PreviewBackend, PreviewSource, SessionId, SessionResources, SurfaceError,
    SurfaceSize,
};
pub use mesh::{DecodedMesh, Triangle};
pub use source::{FileFormat, SourceFile, UnknownFormat};

// Re-export glam types for consistent version usage
pub use glam;
