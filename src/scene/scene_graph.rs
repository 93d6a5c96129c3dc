use crate::core::error::{Result, SceneError};
use crate::geometry::transform::Transform;
use crate::scene::scene_node::{Drawable, NodeId, SceneNode};
use log::debug;
use nalgebra::Matrix4;
use std::collections::HashMap;

/// 外部渲染协作方：接收每个可绘制节点合成后的世界矩阵
///
/// 场景图自身不做任何渲染 I/O，所有副作用都经由该接口发生。
pub trait DrawTarget {
    /// 每帧开始时调用一次，传入相机的视图与投影矩阵
    fn begin_frame(&mut self, _view: &Matrix4<f32>, _projection: &Matrix4<f32>) -> Result<()> {
        Ok(())
    }

    /// 绘制一个节点；`world` 是该节点在根空间中的世界矩阵
    fn draw(&mut self, node: &SceneNode, drawable: &Drawable, world: &Matrix4<f32>) -> Result<()>;

    /// 每帧遍历结束后调用一次
    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 层级场景图：拥有全部节点，维护父子关系并做深度优先渲染
///
/// 每个节点至多一个父节点，不允许成环；子节点按插入顺序遍历。
/// 删除节点时连同其整棵子树一起删除。
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    /// 命名节点的映射，允许通过名称查找节点
    node_names: HashMap<String, NodeId>,
    next_node_id: NodeId,
}

impl SceneGraph {
    /// 创建一个空场景图
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一个游离节点（尚无父节点），返回其ID
    ///
    /// 传入节点上残留的父子关系会被清除，层级只能通过 [`Self::add_child`] 建立。
    /// 重名时名称指向最近插入的节点。
    pub fn insert(&mut self, mut node: SceneNode) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;

        node.parent = None;
        node.children.clear();
        if let Some(name) = &node.name {
            self.node_names.insert(name.clone(), id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// 插入节点并立即挂到 `parent` 下
    pub fn attach(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.insert(node);
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// 把 `child` 追加为 `parent` 的最后一个子节点
    ///
    /// 以下情况返回 [`SceneError::Structural`]：节点挂到自己下面、
    /// `child` 是 `parent` 的祖先（会成环）、`child` 已有父节点。
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        let child_node = self.node(child)?;

        if parent == child {
            return Err(SceneError::Structural(format!(
                "节点 {} 不能成为自己的子节点",
                child
            )));
        }
        if let Some(existing) = child_node.parent {
            return Err(SceneError::Structural(format!(
                "节点 {} 已经挂在节点 {} 下",
                child, existing
            )));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Structural(format!(
                "节点 {} 是节点 {} 的祖先，挂载会成环",
                child, parent
            )));
        }

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// `ancestor` 是否为 `node` 的严格祖先；节点永远不是自己的祖先
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// 删除节点及其整棵子树，返回被删除的节点数量
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        let parent = self.node(id)?.parent;
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                parent_node.children.retain(|&c| c != id);
            }
        }

        let mut removed = 0;
        let mut released_names = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                if let Some(name) = node.name {
                    // 只删除指向本节点的名称索引
                    if self.node_names.get(&name) == Some(&current) {
                        self.node_names.remove(&name);
                        released_names.push(name);
                    }
                }
                stack.extend(node.children);
                removed += 1;
            }
        }

        // 仍有同名节点存活时，名称改指向其中最近插入的一个
        for name in released_names {
            let survivor = self
                .nodes
                .iter()
                .filter(|(_, node)| node.name.as_deref() == Some(name.as_str()))
                .map(|(&id, _)| id)
                .max();
            if let Some(survivor) = survivor {
                self.node_names.insert(name, survivor);
            }
        }
        debug!("删除节点 {} 及其子树，共 {} 个节点", id, removed);
        Ok(removed)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))
    }

    /// 节点局部变换的可变引用，供动画与按键控制修改
    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform> {
        self.nodes
            .get_mut(&id)
            .map(|node| &mut node.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// 通过名称查找节点
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    /// 没有父节点的节点，按ID排序
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(&id, _)| id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// 获取场景中的节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 沿根到节点的路径合成局部矩阵，得到节点的世界矩阵
    ///
    /// 与 [`Self::render`] 交给绘制接口的矩阵一致，仅用于查询，不会缓存。
    pub fn world_matrix(&self, id: NodeId) -> Result<Matrix4<f32>> {
        let mut world = self.node(id)?.transform.to_matrix();
        let mut current = self.node(id)?.parent;
        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            world = parent.transform.to_matrix() * world;
            current = parent.parent;
        }
        Ok(world)
    }

    /// 深度优先前序渲染以 `id` 为根的子树
    ///
    /// `world = parent_world * local`；有绘制能力的节点先交给 `target`，
    /// 再依次递归子节点。世界矩阵只沿递归传值，节点不保存它，
    /// 同一棵树可以从多个视点重复渲染。第一个绘制错误会中止本次遍历并返回。
    pub fn render(
        &self,
        id: NodeId,
        parent_world: &Matrix4<f32>,
        target: &mut dyn DrawTarget,
    ) -> Result<()> {
        let node = self.node(id)?;
        let world = parent_world * node.transform.to_matrix();

        if let Some(drawable) = &node.drawable {
            target.draw(node, drawable, &world)?;
        }

        for &child in &node.children {
            self.render(child, &world, target)?;
        }
        Ok(())
    }

    /// 以单位矩阵渲染所有根节点
    pub fn render_all(&self, target: &mut dyn DrawTarget) -> Result<()> {
        let identity = Matrix4::identity();
        for root in self.roots() {
            self.render(root, &identity, target)?;
        }
        Ok(())
    }
}
