// crates/mf_control/src/lib.rs

//! MesoFlow 闭环速度控制
//!
//! 通过 PID 反馈把受控粒子群的平均速度驱动到目标值：
//! - 控制配置与校验 (config)
//! - 错误类型 (error)
//! - PID 增益与递推 (pid)
//! - 速度采样累加器 (sampler)
//! - 步观测者接口与注册表 (observer)
//! - 速度控制器与状态日志器 (controller)
//! - 控制日志写出器 (logger)
//!
//! # 典型装配
//!
//! ```no_run
//! use glam::DVec3;
//! use mf_control::{build_velocity_control, ObserverRegistry, VelocityControlConfig};
//! use mf_control::pid::PidGains;
//! use mf_foundation::reduce::LocalReduction;
//!
//! # fn main() -> Result<(), mf_control::ControlError> {
//! let config = VelocityControlConfig::new(
//!     "poiseuille",
//!     vec!["pv".into()],
//!     DVec3::new(1.0, 0.0, 0.0),
//!     PidGains::from_factor(0.08)?,
//!     "vcont.txt",
//! );
//! let (controller, logger) = build_velocity_control(&config, 0.001, Box::new(LocalReduction))?;
//! let force = controller.force_handle(); // 引擎在力施加阶段读取
//!
//! let mut registry = ObserverRegistry::new();
//! registry.register(controller);
//! registry.register(logger); // 在控制器之后，看到的是本步调谐后的状态
//! # let _ = force;
//! # Ok(())
//! # }
//! ```
//!
//! 每一步结束后引擎调用 [`ObserverRegistry::after_step`]，控制器按
//! 采样/调谐节奏推进窗口与 PID 递推，日志器按输出节奏落盘。

#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod error;
pub mod logger;
pub mod observer;
pub mod pid;
pub mod sampler;

// 重导出常用类型
pub use config::VelocityControlConfig;
pub use controller::{
    build_velocity_control, BodyForceHandle, ControlStateLogger, SharedControlState,
    VelocityController,
};
pub use error::ControlError;
pub use logger::ControlLogWriter;
pub use observer::{ObserverRegistry, StepContext, StepObserver};
pub use pid::{ControlState, PidController, PidGains};
pub use sampler::VelocitySampler;
