use crate::core::error::Result;
use crate::geometry::camera::Camera;
use crate::scene::scene_graph::{DrawTarget, SceneGraph};
use crate::scene::scene_node::NodeId;
use log::{debug, info, warn};
use nalgebra::{Matrix4, Vector3};
use std::collections::VecDeque;

/// 旋转轴所在的坐标空间
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisSpace {
    /// 节点当前的局部轴（右乘）
    #[default]
    Local,
    /// 父空间的固定轴（左乘），对根下节点即世界轴
    World,
}

/// 每帧对某个节点施加的增量旋转
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// 被驱动的节点
    pub node: NodeId,
    /// 旋转轴
    pub axis: Vector3<f32>,
    pub space: AxisSpace,
    /// 角速度（度/秒）
    pub degrees_per_second: f32,
}

impl Animation {
    pub fn new(node: NodeId, axis: Vector3<f32>, degrees_per_second: f32) -> Self {
        Self {
            node,
            axis,
            space: AxisSpace::Local,
            degrees_per_second,
        }
    }

    /// 绕父空间固定轴旋转的动画
    pub fn world(node: NodeId, axis: Vector3<f32>, degrees_per_second: f32) -> Self {
        Self {
            space: AxisSpace::World,
            ..Self::new(node, axis, degrees_per_second)
        }
    }

    pub fn spin_x(node: NodeId, degrees_per_second: f32) -> Self {
        Self::new(node, Vector3::x(), degrees_per_second)
    }

    pub fn spin_y(node: NodeId, degrees_per_second: f32) -> Self {
        Self::new(node, Vector3::y(), degrees_per_second)
    }

    pub fn spin_z(node: NodeId, degrees_per_second: f32) -> Self {
        Self::new(node, Vector3::z(), degrees_per_second)
    }
}

/// 演示场景的按键控制
///
/// `animations` 允许控制器改写动画表（例如切换旋转轴）。
/// 返回 true 表示该按键已被消费。
pub trait InputHandler {
    fn handle_key(
        &mut self,
        key: char,
        scene: &mut SceneGraph,
        animations: &mut Vec<Animation>,
    ) -> bool;
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// 正常渲染
    Rendered,
    /// 本帧出错被跳过，循环继续
    Skipped,
    /// 循环已停止，未做任何事
    Stopped,
}

/// 帧统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_rendered: usize,
    pub frames_skipped: usize,
    pub inputs_handled: usize,
}

/// 帧循环上下文：场景、相机、动画表、输入队列与暂停/停止标志
///
/// 宿主每次刷新调用一次 [`FrameLoop::tick`]，节奏完全由宿主决定。
/// 单帧失败只记录日志并计为跳过，不会终止循环。
pub struct FrameLoop {
    pub scene: SceneGraph,
    pub camera: Camera,
    root: NodeId,
    animations: Vec<Animation>,
    controls: Option<Box<dyn InputHandler>>,
    camera_controls: bool,
    input_queue: VecDeque<char>,
    paused: bool,
    running: bool,
    stats: FrameStats,
}

impl FrameLoop {
    pub fn new(scene: SceneGraph, root: NodeId, camera: Camera) -> Self {
        Self {
            scene,
            camera,
            root,
            animations: Vec::new(),
            controls: None,
            camera_controls: true,
            input_queue: VecDeque::new(),
            paused: false,
            running: true,
            stats: FrameStats::default(),
        }
    }

    /// 设置演示场景的按键控制
    pub fn with_controls(mut self, controls: Box<dyn InputHandler>) -> Self {
        self.controls = Some(controls);
        self
    }

    /// 是否先把按键交给相机（默认开启）
    pub fn with_camera_controls(mut self, enabled: bool) -> Self {
        self.camera_controls = enabled;
        self
    }

    pub fn add_animation(&mut self, animation: Animation) {
        self.animations.push(animation);
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 排队一个按键，下一次 tick 时处理
    pub fn queue_input(&mut self, key: char) {
        self.input_queue.push_back(key);
    }

    pub fn queue_inputs(&mut self, keys: &str) {
        self.input_queue.extend(keys.chars());
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 请求停止；此后的 tick 不再做任何事
    pub fn stop(&mut self) {
        if self.running {
            info!("帧循环停止，共渲染 {} 帧", self.stats.frames_rendered);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// 执行一帧：处理输入、推进动画、渲染整棵树
    ///
    /// `dt` 是距上一帧的秒数，由宿主提供；非有限或负值按 0 处理。
    pub fn tick(&mut self, dt: f32, target: &mut dyn DrawTarget) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }

        self.drain_input();

        if !self.paused {
            let dt = if dt.is_finite() && dt >= 0.0 {
                dt
            } else {
                warn!("无效的帧间隔 {}，按 0 处理", dt);
                0.0
            };
            self.advance(dt);
        }

        match self.render_frame(target) {
            Ok(()) => {
                self.stats.frames_rendered += 1;
                FrameOutcome::Rendered
            }
            Err(e) => {
                warn!("第 {} 帧渲染失败，跳过: {}", self.frame_index(), e);
                self.stats.frames_skipped += 1;
                FrameOutcome::Skipped
            }
        }
    }

    fn frame_index(&self) -> usize {
        self.stats.frames_rendered + self.stats.frames_skipped
    }

    fn drain_input(&mut self) {
        while let Some(key) = self.input_queue.pop_front() {
            if self.dispatch_key(key) {
                self.stats.inputs_handled += 1;
            } else {
                debug!("未处理的按键 {:?}", key);
            }
        }
    }

    /// 按键分发顺序：相机 → 演示控制 → 内置暂停
    fn dispatch_key(&mut self, key: char) -> bool {
        if self.camera_controls && self.camera.key_control(key) {
            return true;
        }
        if let Some(controls) = self.controls.as_mut() {
            if controls.handle_key(key, &mut self.scene, &mut self.animations) {
                return true;
            }
        }
        if key == ' ' {
            self.paused = !self.paused;
            debug!("暂停: {}", self.paused);
            return true;
        }
        false
    }

    fn advance(&mut self, dt: f32) {
        for animation in &self.animations {
            match self.scene.transform_mut(animation.node) {
                Ok(transform) => {
                    let degrees = animation.degrees_per_second * dt;
                    match animation.space {
                        AxisSpace::Local => transform.rotate_on_axis(&animation.axis, degrees),
                        AxisSpace::World => transform.rotate_on_world_axis(&animation.axis, degrees),
                    }
                }
                Err(e) => warn!("动画目标无效: {}", e),
            }
        }
    }

    fn render_frame(&self, target: &mut dyn DrawTarget) -> Result<()> {
        let view = self.camera.get_view()?;
        let projection = self.camera.get_projection()?;
        target.begin_frame(&view, &projection)?;
        self.scene.render(self.root, &Matrix4::identity(), target)?;
        target.end_frame()
    }
}
