// crates/mf_control/src/observer.rs

//! 步观测者接口与注册中心
//!
//! 原型系统把控制器和日志器作为无类型的"插件"挂进引擎回调表；
//! 这里重构为显式的类型化接口：实现 [`StepObserver`] 的组件在每个
//! 模拟步的固定流水线相位（积分与力更新之后）被 [`ObserverRegistry`]
//! 依注册顺序同步调用。
//!
//! 观测者在单个分片内严格串行执行，子系统内部不需要任何锁；
//! 跨分片一致性由采样归约这一个集合操作保证。

use std::collections::HashMap;

use mf_foundation::error::MfResult;
use mf_particles::population::ParticleVector;

/// 步上下文
///
/// 引擎在每步调用观测者时传入的只读快照。
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// 当前步号（从 1 开始）
    pub step: u64,
    /// 引擎时间步长
    pub dt: f64,
    /// 本分片上全部粒子群的只读视图
    pub populations: &'a [&'a ParticleVector],
}

impl<'a> StepContext<'a> {
    /// 创建步上下文
    pub fn new(step: u64, dt: f64, populations: &'a [&'a ParticleVector]) -> Self {
        Self {
            step,
            dt,
            populations,
        }
    }

    /// 当前模拟时间
    #[inline]
    pub fn time(&self) -> f64 {
        self.step as f64 * self.dt
    }

    /// 按名称查找粒子群
    pub fn population(&self, name: &str) -> Option<&'a ParticleVector> {
        self.populations.iter().copied().find(|pv| pv.name() == name)
    }
}

/// 步观测者接口
///
/// 采样控制器与状态日志器都实现此接口。
pub trait StepObserver: Send {
    /// 观测者名称
    fn name(&self) -> &'static str;

    /// 每步回调，在引擎的积分与力更新之后调用
    fn after_step(&mut self, ctx: &StepContext) -> MfResult<()>;
}

/// 观测者注册中心
///
/// 按注册顺序持有并调用观测者。
#[derive(Default)]
pub struct ObserverRegistry {
    /// 已注册的观测者
    observers: Vec<Box<dyn StepObserver>>,
    /// 名称到索引的映射
    name_index: HashMap<String, usize>,
    /// 启用状态
    enabled: Vec<bool>,
}

impl ObserverRegistry {
    /// 创建空的注册中心
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册观测者，返回其索引
    pub fn register<O: StepObserver + 'static>(&mut self, observer: O) -> usize {
        let name = observer.name().to_string();
        let idx = self.observers.len();
        self.observers.push(Box::new(observer));
        self.name_index.insert(name, idx);
        self.enabled.push(true);
        idx
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// 所有观测者名称（注册顺序）
    pub fn list_observers(&self) -> Vec<&str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    /// 启用/禁用观测者
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if let Some(&idx) = self.name_index.get(name) {
            if let Some(flag) = self.enabled.get_mut(idx) {
                *flag = enabled;
                return true;
            }
        }
        false
    }

    /// 依注册顺序调用所有启用的观测者
    ///
    /// 任何观测者返回错误都立即向上传播——只有致命错误
    /// （集合通信失败）才会走到这条路径。
    pub fn after_step(&mut self, ctx: &StepContext) -> MfResult<()> {
        for (observer, enabled) in self.observers.iter_mut().zip(&self.enabled) {
            if *enabled {
                observer.after_step(ctx)?;
            }
        }
        Ok(())
    }
}
