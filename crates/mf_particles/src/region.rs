// crates/mf_particles/src/region.rs

//! 采样区域类型
//!
//! 定义轴对齐包围盒 [`AxisAlignedBox`]，用于：
//! - 限制采样累加器统计的空间范围
//! - 描述周期性模拟域
//! - 冻结壁面生成时的播种范围

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// 轴对齐包围盒
///
/// 半开区间 `[lo, hi)`，与周期回卷约定一致。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAlignedBox {
    /// 低角点
    pub lo: DVec3,
    /// 高角点
    pub hi: DVec3,
}

impl AxisAlignedBox {
    /// 从两个角点创建（自动取分量最小/最大）
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    /// 从原点和尺寸创建
    pub fn from_size(size: DVec3) -> Self {
        Self::new(DVec3::ZERO, size)
    }

    /// 盒子尺寸
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.hi - self.lo
    }

    /// 体积
    #[inline]
    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// 点是否在盒内（半开区间）
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        p.x >= self.lo.x
            && p.x < self.hi.x
            && p.y >= self.lo.y
            && p.y < self.hi.y
            && p.z >= self.lo.z
            && p.z < self.hi.z
    }

    /// 将点周期回卷到盒内
    #[inline]
    pub fn wrap(&self, p: DVec3) -> DVec3 {
        let s = self.size();
        let rel = p - self.lo;
        let wrapped = DVec3::new(
            rel.x.rem_euclid(s.x),
            rel.y.rem_euclid(s.y),
            rel.z.rem_euclid(s.z),
        );
        self.lo + wrapped
    }

    /// 周期最小镜像位移 `a - b`
    #[inline]
    pub fn minimum_image(&self, a: DVec3, b: DVec3) -> DVec3 {
        let s = self.size();
        let mut d = a - b;
        d.x -= s.x * (d.x / s.x).round();
        d.y -= s.y * (d.y / s.y).round();
        d.z -= s.z * (d.z / s.z).round();
        d
    }
}
