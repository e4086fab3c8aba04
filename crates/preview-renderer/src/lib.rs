pub mod mesh;
pub mod camera;
pub mod controls;
pub mod gestures;
pub mod options;
pub mod uniforms;
pub mod scene;
pub mod framing;
pub mod preview;

pub use mesh::{Mesh, Vertex};
pub use camera::{Camera, CameraError};
pub use controls::OrbitControls;
pub use gestures::{Gesture, GestureMap, InputBinding, Interaction, PointerButton};
pub use options::{FramingAxis, FramingOptions, OptionsError, PreviewConfig, SceneOptions, ToneMapping};
pub use uniforms::{FrameUniform, ModelUniform};
pub use scene::{AmbientLight, Backdrop, DirectionalLight, Fog, MeshRole, Scene, SceneMesh};
pub use framing::{frame, framing_distance};
pub use preview::{PreviewError, PreviewState};

// Re-export glam types for consistent version usage
pub use glam;
