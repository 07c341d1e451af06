// crates/mf_control/src/controller.rs

//! 速度控制器
//!
//! 把采样累加器、PID 控制器与共享控制状态装配成一个步观测者：
//! - 每步观测受控粒子群的速度
//! - 每 `sample_every` 步排空采样窗口（含跨分片归约）
//! - 每 `tune_every` 步消费最近的均值样本，计算新的体力并
//!   通过 [`BodyForceHandle`] 原子地发布给引擎
//!
//! 空窗口的调谐周期不更新力（保持上次的值），这是合法情形而非错误。
//!
//! 引擎在每步的力施加阶段通过句柄读取当前体力，并把它作为均匀的
//! 每粒子附加力施加到受控粒子群上，直到下一次调谐——力在时间上是
//! 阶梯函数，不做插值。

use std::sync::Arc;

use glam::DVec3;
use parking_lot::RwLock;

use mf_foundation::error::MfResult;
use mf_foundation::reduce::VelocityReduction;
use mf_particles::population::ParticleVector;

use crate::config::VelocityControlConfig;
use crate::error::ControlError;
use crate::logger::ControlLogWriter;
use crate::observer::{StepContext, StepObserver};
use crate::pid::{ControlState, PidController};
use crate::sampler::VelocitySampler;

/// 引擎侧体力句柄
///
/// 控制器与引擎共享的单元格：控制器在调谐时刻整体写入一次，
/// 引擎在力施加阶段读取。写入是单次原子存储，引擎绝不会看到
/// 半更新的力向量。
#[derive(Debug, Clone, Default)]
pub struct BodyForceHandle {
    inner: Arc<RwLock<DVec3>>,
}

impl BodyForceHandle {
    /// 创建零力句柄
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取当前体力
    #[inline]
    pub fn get(&self) -> DVec3 {
        *self.inner.read()
    }

    /// 整体写入新的体力
    #[inline]
    pub fn store(&self, force: DVec3) {
        *self.inner.write() = force;
    }
}

/// 控制状态的共享只读视图（状态日志器使用）
pub type SharedControlState = Arc<RwLock<ControlState>>;

/// 速度控制器
///
/// 每个分片持有一个实例；跨分片一致性由采样归约保证。
pub struct VelocityController {
    /// 受控粒子群名称
    populations: Vec<String>,
    /// 采样节奏
    sample_every: u64,
    /// 调谐节奏
    tune_every: u64,
    /// 采样累加器
    sampler: VelocitySampler,
    /// PID 递推
    pid: PidController,
    /// 控制状态（与日志器共享）
    state: SharedControlState,
    /// 引擎侧体力句柄
    force: BodyForceHandle,
    /// 最近一次非空的均值样本
    latest_mean: Option<DVec3>,
    /// 跨分片归约实现
    reduction: Box<dyn VelocityReduction>,
}

impl std::fmt::Debug for VelocityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VelocityController")
            .field("populations", &self.populations)
            .field("sample_every", &self.sample_every)
            .field("tune_every", &self.tune_every)
            .finish_non_exhaustive()
    }
}

impl VelocityController {
    /// 从配置构造控制器
    ///
    /// 所有节奏与增益约束在此处校验；模拟循环开始后不再有配置失败。
    ///
    /// # 参数
    /// - `config`: 控制配置（已含增益、节奏、目标速度）
    /// - `dt`: 引擎时间步长，调谐间隔 Δt = tune_every × dt
    /// - `reduction`: 跨分片归约实现
    pub fn new(
        config: &VelocityControlConfig,
        dt: f64,
        reduction: Box<dyn VelocityReduction>,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        if dt <= 0.0 || !dt.is_finite() {
            return Err(ControlError::InvalidTimeStep { dt });
        }

        let tune_interval = config.tune_every as f64 * dt;
        let pid = PidController::new(config.gains, tune_interval)?;
        let state = Arc::new(RwLock::new(ControlState::new(config.target_velocity)));

        Ok(Self {
            populations: config.populations.clone(),
            sample_every: config.sample_every,
            tune_every: config.tune_every,
            sampler: VelocitySampler::new(config.region),
            pid,
            state,
            force: BodyForceHandle::new(),
            latest_mean: None,
            reduction,
        })
    }

    /// 引擎侧体力句柄（克隆共享）
    pub fn force_handle(&self) -> BodyForceHandle {
        self.force.clone()
    }

    /// 控制状态的共享视图（状态日志器用）
    pub fn shared_state(&self) -> SharedControlState {
        Arc::clone(&self.state)
    }

    /// 当前施加的体力
    pub fn current_force(&self) -> DVec3 {
        self.force.get()
    }

    /// PID 调谐间隔 Δt
    pub fn tune_interval(&self) -> f64 {
        self.pid.tune_interval()
    }

    /// 从上下文中挑出受控粒子群
    fn select<'a>(&self, ctx: &StepContext<'a>) -> Vec<&'a ParticleVector> {
        ctx.populations
            .iter()
            .copied()
            .filter(|pv| self.populations.iter().any(|n| n == pv.name()))
            .collect()
    }
}

impl StepObserver for VelocityController {
    fn name(&self) -> &'static str {
        "velocity_control"
    }

    fn after_step(&mut self, ctx: &StepContext) -> MfResult<()> {
        let selected = self.select(ctx);
        self.sampler.observe(&selected);

        if ctx.step % self.sample_every == 0 {
            if let Some(mean) = self.sampler.drain(self.reduction.as_ref(), ctx.step)? {
                self.latest_mean = Some(mean);
            }
        }

        if ctx.step % self.tune_every == 0 {
            match self.latest_mean.take() {
                Some(mean) => {
                    let force = {
                        let mut state = self.state.write();
                        self.pid.tune(&mut state, mean)
                    };
                    self.force.store(force);
                    log::trace!(
                        "velocity_control: 第 {} 步调谐, mean={:?}, force={:?}",
                        ctx.step,
                        mean,
                        force
                    );
                }
                None => {
                    // 空窗口：保持当前力，留待下个调谐周期
                    log::debug!(
                        "velocity_control: 第 {} 步采样窗口为空，保持当前力不变",
                        ctx.step
                    );
                }
            }
        }

        Ok(())
    }
}

/// 控制状态日志器
///
/// 独立于采样/调谐节奏的第二个步观测者：每 `dump_every` 步读取
/// 共享控制状态并追加一条记录。
pub struct ControlStateLogger {
    /// 输出节奏
    dump_every: u64,
    /// 控制状态的共享只读视图
    state: SharedControlState,
    /// 追加式写出器
    writer: ControlLogWriter,
}

impl std::fmt::Debug for ControlStateLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlStateLogger")
            .field("dump_every", &self.dump_every)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

impl ControlStateLogger {
    /// 创建日志器
    ///
    /// # 错误
    /// `dump_every` 为零返回 [`ControlError::InvalidDumpCadence`]。
    pub fn new(
        dump_every: u64,
        state: SharedControlState,
        writer: ControlLogWriter,
    ) -> Result<Self, ControlError> {
        if dump_every == 0 {
            return Err(ControlError::InvalidDumpCadence { dump_every });
        }
        Ok(Self {
            dump_every,
            state,
            writer,
        })
    }
}

impl StepObserver for ControlStateLogger {
    fn name(&self) -> &'static str {
        "control_state_logger"
    }

    fn after_step(&mut self, ctx: &StepContext) -> MfResult<()> {
        if ctx.step % self.dump_every == 0 {
            let snapshot = *self.state.read();
            self.writer.record(
                ctx.step,
                snapshot.current_force,
                snapshot.previous_error,
                snapshot.integral_error,
            );
        }
        Ok(())
    }
}

/// 按配置同时装配控制器与状态日志器
///
/// 两者共享同一份控制状态；返回的组件应按此顺序注册进
/// [`crate::observer::ObserverRegistry`]，保证日志器看到的是
/// 本步调谐后的状态。
pub fn build_velocity_control(
    config: &VelocityControlConfig,
    dt: f64,
    reduction: Box<dyn VelocityReduction>,
) -> Result<(VelocityController, ControlStateLogger), ControlError> {
    let controller = VelocityController::new(config, dt, reduction)?;
    let writer = ControlLogWriter::create(&config.log_path);
    let logger = ControlStateLogger::new(config.dump_every, controller.shared_state(), writer)?;
    Ok((controller, logger))
}
