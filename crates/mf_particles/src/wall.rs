// crates/mf_particles/src/wall.rs

//! 半平面壁面几何
//!
//! 定义 [`PlaneWall`]：由平面上一点和指向流体侧的内法向描述的半空间边界。
//! 同一几何对象同时用于：
//! - 冻结壁面生成时的粒子播种与成员判定
//! - 粒子-壁面相互作用的距离查询
//!
//! 符号约定：内法向指向流体侧，`signed_distance >= 0` 表示点在流体侧，
//! `< 0` 表示点在固体（壁内）侧。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::WallError;

/// 半平面壁面
///
/// 平面由 `point` 和单位内法向 `normal` 定义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneWall {
    /// 壁面名称（用于日志与配置引用）
    pub name: String,
    /// 平面上一点
    pub point: DVec3,
    /// 指向流体侧的单位内法向
    pub normal: DVec3,
}

impl PlaneWall {
    /// 创建壁面，法向在构造时归一化
    ///
    /// # 错误
    /// 法向长度接近零时返回 [`WallError::DegenerateNormal`]。
    pub fn new(
        name: impl Into<String>,
        point: DVec3,
        normal: DVec3,
    ) -> Result<Self, WallError> {
        let name = name.into();
        let len = normal.length();
        if len < 1e-12 {
            return Err(WallError::DegenerateNormal { wall: name });
        }
        Ok(Self {
            name,
            point,
            normal: normal / len,
        })
    }

    /// 有符号距离：>=0 在流体侧，<0 在壁内
    #[inline]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p - self.point)
    }

    /// 点是否在固体（壁内）侧
    #[inline]
    pub fn is_inside_solid(&self, p: DVec3) -> bool {
        self.signed_distance(p) < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_wall_signed_distance() {
        // poiseuille 构型的下板：法向 +z，位于 z=1
        let wall = PlaneWall::new("plate_lo", DVec3::new(0.0, 0.0, 1.0), DVec3::Z).unwrap();

        assert!((wall.signed_distance(DVec3::new(4.0, 8.0, 3.0)) - 2.0).abs() < 1e-12);
        assert!((wall.signed_distance(DVec3::new(0.0, 0.0, 0.0)) - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_normal_is_normalized() {
        let wall = PlaneWall::new("w", DVec3::ZERO, DVec3::new(0.0, 0.0, 3.0)).unwrap();
        assert!((wall.normal.length() - 1.0).abs() < 1e-12);
        assert!((wall.signed_distance(DVec3::new(0.0, 0.0, 2.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_normal_rejected() {
        let err = PlaneWall::new("bad", DVec3::ZERO, DVec3::ZERO).unwrap_err();
        assert!(matches!(err, WallError::DegenerateNormal { .. }));
    }

    #[test]
    fn test_inside_solid() {
        let wall = PlaneWall::new("plate_hi", DVec3::new(0.0, 0.0, 7.0), -DVec3::Z).unwrap();
        assert!(wall.is_inside_solid(DVec3::new(0.0, 0.0, 7.5)));
        assert!(!wall.is_inside_solid(DVec3::new(0.0, 0.0, 4.0)));
    }
}
