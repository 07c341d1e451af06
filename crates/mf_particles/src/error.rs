// crates/mf_particles/src/error.rs

//! 粒子层错误类型
//!
//! 壁面几何与冻结壁面生成共用的设置期错误。所有变体都在模拟主循环
//! 开始前返回；松弛子模拟内部的数值失败通过 `Relaxation` 变体
//! 携带基础层错误向上传播。

use thiserror::Error;

use mf_foundation::error::MfError;

/// 壁面与壁面生成错误
#[derive(Error, Debug)]
pub enum WallError {
    /// 播种板坯厚度小于相互作用截断半径
    #[error("播种板坯厚度无效: thickness={thickness} < cutoff={cutoff}, 壁面力场将出现间断")]
    InvalidBoundaryThickness {
        /// 配置的板坯厚度
        thickness: f64,
        /// 相互作用截断半径
        cutoff: f64,
    },

    /// 壁面法向退化（长度为零）
    #[error("壁面 '{wall}' 的法向退化，无法归一化")]
    DegenerateNormal {
        /// 壁面名称
        wall: String,
    },

    /// 未提供任何边界面
    #[error("冻结壁面生成需要至少一个边界面")]
    NoBoundaries,

    /// 目标数密度无效
    #[error("目标数密度无效: {density}, 必须为正")]
    InvalidDensity {
        /// 配置的数密度
        density: f64,
    },

    /// 松弛子模拟失败
    #[error("松弛子模拟失败")]
    Relaxation(#[from] MfError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thickness_display_names_both_values() {
        let err = WallError::InvalidBoundaryThickness {
            thickness: 0.5,
            cutoff: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.5"));
        assert!(msg.contains('1'));
    }

    #[test]
    fn test_relaxation_wraps_foundation_error() {
        let err: WallError = MfError::invalid_input("测试").into();
        assert!(matches!(err, WallError::Relaxation(..)));
    }
}
