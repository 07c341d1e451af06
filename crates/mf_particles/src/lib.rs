// crates/mf_particles/src/lib.rs

//! MesoFlow 粒子层
//!
//! 提供控制子系统依赖的粒子侧抽象：
//! - 错误类型 (error)
//! - 粒子群存储 (population)
//! - 采样区域与周期域 (region)
//! - 半平面壁面几何 (wall)
//! - 成对相互作用接口与 DPD 参考核 (interaction)
//! - 松弛积分器 (integrator)
//! - 冻结壁面生成器 (frozen)
//!
//! 主模拟引擎的邻居表、空间分解与跨进程通信不在本 crate 范围内；
//! 这里的 DPD 核与速度 Verlet 只服务于壁面松弛子模拟。

#![warn(clippy::all)]

pub mod error;
pub mod frozen;
pub mod integrator;
pub mod interaction;
pub mod population;
pub mod region;
pub mod wall;

// 重导出常用类型
pub use error::WallError;
pub use frozen::{generate_frozen_wall, FrozenWallConfig};
pub use integrator::{RelaxationIntegrator, VelocityVerlet};
pub use interaction::{DpdInteraction, DpdParams, PairwiseInteraction};
pub use population::ParticleVector;
pub use region::AxisAlignedBox;
pub use wall::PlaneWall;
