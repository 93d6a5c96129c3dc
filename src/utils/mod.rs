// utils/mod.rs
// 渲染流程与图像保存
pub mod render_process;
pub mod save_utils;
