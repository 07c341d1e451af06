// crates/mf_foundation/src/lib.rs

//! MesoFlow Foundation Layer
//!
//! 基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`reduce`]: 跨分片速度归约原语
//!
//! # 设计原则
//!
//! 1. **依赖最小化**: 仅依赖 glam、serde 和 thiserror
//! 2. **设置期失败**: 配置类错误在模拟循环开始前暴露
//! 3. **双精度**: 所有控制量以 f64 表示，避免积分项漂移

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod reduce;

// 重导出常用类型
pub use error::{MfError, MfResult};
pub use reduce::{LocalReduction, VelocityReduction, VelocitySum};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{MfError, MfResult};
    pub use crate::reduce::{LocalReduction, VelocityReduction, VelocitySum};
    pub use crate::{ensure, require};
}
