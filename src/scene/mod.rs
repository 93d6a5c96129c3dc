// scene/mod.rs
// 场景节点与场景图
pub mod scene_graph;
pub mod scene_node;
