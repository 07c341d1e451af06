// crates/mf_control/src/pid.rs

//! PID 控制器
//!
//! 把采样到的平均速度与目标速度之差转化为施加在受控粒子群上的
//! 均匀体力。采用标准的离散 PID 递推，调谐间隔 Δt = tune_every × dt：
//!
//! ```text
//! error         = target - mean
//! integral     += error * Δt
//! derivative    = (error - previous_error) / Δt
//! force         = Kp*error + Ki*integral + Kd*derivative
//! previous_error = error
//! ```
//!
//! 首次调谐时 `previous_error` 为零，微分项等于 error/Δt——不做任何
//! 启动特判，以保证物理结果可复现。积分项与上次误差在整个运行期间
//! 持续累积，除构造时刻外永不重置。
//!
//! 无论粒子引擎的工作精度如何，控制量一律以 f64 计算，避免积分项
//! 在长时间运行中漂移。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// PID 增益三元组
///
/// 各分量非负且构造后不可变；负增益在构造时即被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// 比例增益
    pub kp: f64,
    /// 积分增益
    pub ki: f64,
    /// 微分增益
    pub kd: f64,
}

impl PidGains {
    /// 创建增益组，负值返回 [`ControlError::InvalidGain`]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Result<Self, ControlError> {
        let gains = Self { kp, ki, kd };
        gains.validate()?;
        Ok(gains)
    }

    /// 按公共因子创建 (Kp, Ki, Kd) = (2, 1, 8) × factor
    ///
    /// 泊肃叶流驱动配置使用的增益参数化。
    pub fn from_factor(factor: f64) -> Result<Self, ControlError> {
        Self::new(2.0 * factor, 1.0 * factor, 8.0 * factor)
    }

    /// 纯比例控制
    pub fn proportional(kp: f64) -> Result<Self, ControlError> {
        Self::new(kp, 0.0, 0.0)
    }

    /// 校验非负约束
    pub fn validate(&self) -> Result<(), ControlError> {
        for (name, value) in [("Kp", self.kp), ("Ki", self.ki), ("Kd", self.kd)] {
            if value < 0.0 || !value.is_finite() {
                return Err(ControlError::InvalidGain { gain: name, value });
            }
        }
        Ok(())
    }
}

/// 控制器内部状态
///
/// 由 PID 控制器独占持有，只在调谐时刻被修改。支持 serde，
/// 以便检查点记录后重启时精确复现控制轨迹。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// 目标平均速度（整个运行期间不变）
    pub target_velocity: DVec3,
    /// 当前施加的体力（初值为零）
    pub current_force: DVec3,
    /// 积分误差 ∑ error·Δt
    pub integral_error: DVec3,
    /// 上次调谐的误差（微分项用）
    pub previous_error: DVec3,
}

impl ControlState {
    /// 创建初始状态：除目标速度外全部为零
    pub fn new(target_velocity: DVec3) -> Self {
        Self {
            target_velocity,
            current_force: DVec3::ZERO,
            integral_error: DVec3::ZERO,
            previous_error: DVec3::ZERO,
        }
    }
}

/// PID 控制器
///
/// 持有不可变的增益与调谐间隔；状态由调用方传入，便于通过共享
/// 句柄同时供状态日志读取。
#[derive(Debug, Clone, Copy)]
pub struct PidController {
    /// 增益三元组
    gains: PidGains,
    /// 调谐间隔 Δt = tune_every × dt
    tune_interval: f64,
}

impl PidController {
    /// 创建控制器
    ///
    /// # 错误
    /// 增益为负返回 [`ControlError::InvalidGain`]；
    /// 调谐间隔非正返回 [`ControlError::InvalidTimeStep`]。
    pub fn new(gains: PidGains, tune_interval: f64) -> Result<Self, ControlError> {
        gains.validate()?;
        if tune_interval <= 0.0 || !tune_interval.is_finite() {
            return Err(ControlError::InvalidTimeStep { dt: tune_interval });
        }
        Ok(Self {
            gains,
            tune_interval,
        })
    }

    /// 增益三元组
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// 调谐间隔 Δt
    pub fn tune_interval(&self) -> f64 {
        self.tune_interval
    }

    /// 执行一次调谐：消费平均速度，更新状态并返回新的体力
    pub fn tune(&self, state: &mut ControlState, mean_velocity: DVec3) -> DVec3 {
        let dt = self.tune_interval;

        let error = state.target_velocity - mean_velocity;
        state.integral_error += error * dt;
        let derivative = (error - state.previous_error) / dt;

        let force = self.gains.kp * error
            + self.gains.ki * state.integral_error
            + self.gains.kd * derivative;

        state.previous_error = error;
        state.current_force = force;
        force
    }
}
