// core/mod.rs
// 场景图核心：错误类型、帧循环与软件渲染协作方
pub mod error;
pub mod frame_buffer;
pub mod frame_loop;
pub mod rasterizer;
