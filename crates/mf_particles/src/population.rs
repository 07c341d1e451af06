// crates/mf_particles/src/population.rs

//! 粒子群存储
//!
//! [`ParticleVector`] 是模拟中一个命名粒子群的 SoA 存储：位置、速度，
//! 以及按名称索引的每粒子标量/向量附加通道。
//!
//! 控制子系统只通过两类入口访问它：
//! - 逐步只读快照（位置/速度切片与迭代器），供采样累加器使用
//! - 聚合归约（区域内速度和 + 计数）
//!
//! 冻结粒子群（`frozen = true`）参与力计算但不被积分器推进，
//! 用于表示固体边界。

use std::collections::HashMap;

use glam::DVec3;
use mf_foundation::ensure;
use mf_foundation::error::{MfError, MfResult};
use mf_foundation::reduce::VelocitySum;

use crate::region::AxisAlignedBox;

/// 命名粒子群（SoA 布局）
#[derive(Debug, Clone)]
pub struct ParticleVector {
    /// 粒子群名称
    name: String,
    /// 单粒子质量
    mass: f64,
    /// 周期性模拟域
    domain: AxisAlignedBox,
    /// 位置
    positions: Vec<DVec3>,
    /// 速度
    velocities: Vec<DVec3>,
    /// 冻结标志：冻结粒子不被积分器推进
    frozen: bool,
    /// 每粒子标量通道
    scalar_channels: HashMap<String, Vec<f64>>,
    /// 每粒子向量通道
    vector_channels: HashMap<String, Vec<DVec3>>,
}

impl ParticleVector {
    /// 创建空粒子群
    ///
    /// # 错误
    /// 质量非正或非有限返回 [`MfError::OutOfRange`]：积分器按 1/m
    /// 缩放力，零或负质量会在运行期产生非有限的位置。
    pub fn new(name: impl Into<String>, mass: f64, domain: AxisAlignedBox) -> MfResult<Self> {
        ensure!(
            mass > 0.0 && mass.is_finite(),
            MfError::out_of_range("mass", mass, f64::MIN_POSITIVE, f64::MAX)
        );
        Ok(Self {
            name: name.into(),
            mass,
            domain,
            positions: Vec::new(),
            velocities: Vec::new(),
            frozen: false,
            scalar_channels: HashMap::new(),
            vector_channels: HashMap::new(),
        })
    }

    /// 粒子群名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 单粒子质量
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// 周期性模拟域
    #[inline]
    pub fn domain(&self) -> &AxisAlignedBox {
        &self.domain
    }

    /// 粒子数
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 是否为冻结粒子群
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// 标记为冻结：位置与速度此后不再被积分器推进
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// 添加一个粒子
    pub fn push(&mut self, position: DVec3, velocity: DVec3) {
        self.positions.push(position);
        self.velocities.push(velocity);
        for chan in self.scalar_channels.values_mut() {
            chan.push(0.0);
        }
        for chan in self.vector_channels.values_mut() {
            chan.push(DVec3::ZERO);
        }
    }

    /// 位置切片（只读快照）
    #[inline]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    /// 速度切片（只读快照）
    #[inline]
    pub fn velocities(&self) -> &[DVec3] {
        &self.velocities
    }

    /// 可变位置/速度切片，供积分器使用
    ///
    /// # 错误
    /// 冻结粒子群返回 [`MfError::InvalidInput`]：冻结成员不得被推进。
    pub fn state_mut(&mut self) -> MfResult<(&mut [DVec3], &mut [DVec3])> {
        if self.frozen {
            return Err(MfError::invalid_input(format!(
                "粒子群 '{}' 已冻结，不能被积分器推进",
                self.name
            )));
        }
        Ok((&mut self.positions, &mut self.velocities))
    }

    /// 迭代 (位置, 速度) 对
    pub fn iter(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        self.positions
            .iter()
            .copied()
            .zip(self.velocities.iter().copied())
    }

    /// 将所有粒子周期回卷到模拟域内
    pub fn wrap_periodic(&mut self) {
        for p in &mut self.positions {
            *p = self.domain.wrap(*p);
        }
    }

    /// 聚合归约：累加区域内的速度和与粒子计数
    ///
    /// `region` 为 None 时统计整个粒子群。
    pub fn accumulate_velocities(&self, region: Option<&AxisAlignedBox>, acc: &mut VelocitySum) {
        match region {
            None => {
                for v in &self.velocities {
                    acc.accumulate(*v);
                }
            }
            Some(r) => {
                for (p, v) in self.iter() {
                    if r.contains(p) {
                        acc.accumulate(v);
                    }
                }
            }
        }
    }

    // ========================================================================
    // 每粒子附加通道
    // ========================================================================

    /// 注册标量通道（初值 0）
    pub fn add_scalar_channel(&mut self, name: impl Into<String>) {
        let n = self.len();
        self.scalar_channels.entry(name.into()).or_insert_with(|| vec![0.0; n]);
    }

    /// 注册向量通道（初值零向量）
    pub fn add_vector_channel(&mut self, name: impl Into<String>) {
        let n = self.len();
        self.vector_channels
            .entry(name.into())
            .or_insert_with(|| vec![DVec3::ZERO; n]);
    }

    /// 读取标量通道
    pub fn scalar_channel(&self, name: &str) -> MfResult<&[f64]> {
        self.scalar_channels
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| MfError::not_found(format!("标量通道 '{}'", name)))
    }

    /// 可变标量通道
    pub fn scalar_channel_mut(&mut self, name: &str) -> MfResult<&mut [f64]> {
        self.scalar_channels
            .get_mut(name)
            .map(|v| v.as_mut_slice())
            .ok_or_else(|| MfError::not_found(format!("标量通道 '{}'", name)))
    }

    /// 读取向量通道
    pub fn vector_channel(&self, name: &str) -> MfResult<&[DVec3]> {
        self.vector_channels
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| MfError::not_found(format!("向量通道 '{}'", name)))
    }

    /// 可变向量通道
    pub fn vector_channel_mut(&mut self, name: &str) -> MfResult<&mut [DVec3]> {
        self.vector_channels
            .get_mut(name)
            .map(|v| v.as_mut_slice())
            .ok_or_else(|| MfError::not_found(format!("向量通道 '{}'", name)))
    }
}
