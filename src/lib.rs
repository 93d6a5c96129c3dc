//! 层级场景图：局部变换沿树递归合成，附带相机交互、重心坐标拾色，
//! 以及一个把场景画成 PNG 的无头软件光栅化器。

pub mod core;
pub mod demos;
pub mod geometry;
pub mod io;
pub mod scene;
pub mod utils;

pub use crate::core::error::{Result, SceneError};
pub use crate::core::frame_loop::{Animation, AxisSpace, FrameLoop, FrameOutcome, InputHandler};
pub use crate::geometry::camera::Camera;
pub use crate::geometry::transform::Transform;
pub use crate::scene::scene_graph::{DrawTarget, SceneGraph};
pub use crate::scene::scene_node::{Drawable, NodeId, Primitive, SceneNode, Shading};
