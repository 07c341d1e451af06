// crates/mf_control/src/config.rs

//! 速度控制配置
//!
//! 序列化友好的配置结构：一个控制回路的全部参数（受控粒子群、
//! 节奏、目标速度、PID 增益、日志路径）集中在这里，构造控制器
//! 之前统一校验。所有节奏错误在模拟循环开始前就会被拒绝。

use std::path::PathBuf;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use mf_particles::region::AxisAlignedBox;

use crate::error::ControlError;
use crate::pid::PidGains;

/// 一个速度控制回路的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityControlConfig {
    /// 回路名称（日志标识用）
    pub name: String,
    /// 受控粒子群名称，至少一个
    pub populations: Vec<String>,
    /// 采样区域，`None` 表示整个计算域 [m]
    #[serde(default)]
    pub region: Option<AxisAlignedBox>,
    /// 每多少步累加一次采样窗口并归约
    pub sample_every: u64,
    /// 每多少步执行一次 PID 调谐，须为 `sample_every` 的非零整数倍
    pub tune_every: u64,
    /// 每多少步写出一条控制状态记录
    pub dump_every: u64,
    /// 目标平均速度 [m/s]
    pub target_velocity: DVec3,
    /// PID 增益
    pub gains: PidGains,
    /// 控制日志文件路径
    pub log_path: PathBuf,
}

impl VelocityControlConfig {
    /// 常用默认节奏（采样/调谐 5 步，写出 500 步）的便捷构造
    pub fn new(
        name: impl Into<String>,
        populations: Vec<String>,
        target_velocity: DVec3,
        gains: PidGains,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            populations,
            region: None,
            sample_every: 5,
            tune_every: 5,
            dump_every: 500,
            target_velocity,
            gains,
            log_path: log_path.into(),
        }
    }

    /// 校验全部约束
    ///
    /// # 错误
    /// - 受控粒子群列表为空返回 [`ControlError::EmptyPopulations`]
    /// - `tune_every` 不是 `sample_every` 的非零整数倍返回
    ///   [`ControlError::InvalidCadence`]
    /// - `dump_every` 为零返回 [`ControlError::InvalidDumpCadence`]
    /// - 增益非法（负或非有限）返回 [`ControlError::InvalidGain`]
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.populations.is_empty() {
            return Err(ControlError::EmptyPopulations {
                controller: self.name.clone(),
            });
        }
        if self.sample_every == 0
            || self.tune_every == 0
            || self.tune_every % self.sample_every != 0
        {
            return Err(ControlError::InvalidCadence {
                sample_every: self.sample_every,
                tune_every: self.tune_every,
            });
        }
        if self.dump_every == 0 {
            return Err(ControlError::InvalidDumpCadence {
                dump_every: self.dump_every,
            });
        }
        self.gains.validate()?;
        if !self.target_velocity.is_finite() {
            return Err(ControlError::InvalidGain {
                gain: "target_velocity",
                value: f64::NAN,
            });
        }
        Ok(())
    }
}
