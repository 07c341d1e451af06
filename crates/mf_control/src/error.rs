// crates/mf_control/src/error.rs

//! 控制子系统错误类型
//!
//! 配置类错误必须在模拟循环开始前返回；一旦控制器构造成功，
//! 子系统内不存在运行期失败模式——空采样窗口不是错误（力保持不变），
//! 日志写入失败只警告不致命。

use thiserror::Error;

use mf_foundation::error::MfError;

/// 控制子系统错误
#[derive(Error, Debug)]
pub enum ControlError {
    /// 采样/调谐节奏不对齐
    ///
    /// `tune_every` 必须是 `sample_every` 的非零整数倍，否则控制器
    /// 在调谐时刻拿不到刚排空的均值样本。
    #[error("节奏配置无效: sample_every={sample_every}, tune_every={tune_every} (tune_every 必须是 sample_every 的非零整数倍)")]
    InvalidCadence {
        /// 采样节奏
        sample_every: u64,
        /// 调谐节奏
        tune_every: u64,
    },

    /// 输出节奏无效
    #[error("输出节奏无效: dump_every={dump_every}, 必须为正")]
    InvalidDumpCadence {
        /// 输出节奏
        dump_every: u64,
    },

    /// 增益为负
    #[error("增益无效: {gain}={value}, 必须非负")]
    InvalidGain {
        /// 增益名称 (Kp/Ki/Kd)
        gain: &'static str,
        /// 配置值
        value: f64,
    },

    /// 未指定受控粒子群
    #[error("控制器 '{controller}' 未指定任何受控粒子群")]
    EmptyPopulations {
        /// 控制器名称
        controller: String,
    },

    /// 时间步长无效
    #[error("时间步长无效: dt={dt}, 必须为正")]
    InvalidTimeStep {
        /// 配置的步长
        dt: f64,
    },

    /// 基础层错误（集合通信失败等）
    #[error(transparent)]
    Foundation(#[from] MfError),
}
