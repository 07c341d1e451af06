// crates/mf_foundation/src/reduce.rs

//! 跨分片归约原语
//!
//! 分布式引擎中，受控粒子群被切分到多个分片（rank）上。采样累加器在
//! `drain()` 计算均值之前，必须先对所有分片的速度和与粒子计数做一次
//! 全局求和归约，保证每个分片上的控制器拿到完全相同的均值，
//! 从而独立推进出完全相同的力。
//!
//! 本模块只定义归约接口和单分片参考实现。真实的 MPI/多进程实现由
//! 外部引擎提供：对步进流水线而言这是一次阻塞的集合操作，
//! 归约卡死或分片步数不一致属于引擎级致命故障
//! （见 [`crate::error::MfError::Collective`]）。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::MfResult;

/// 速度归约的输入/输出：分片内速度和与粒子计数
///
/// 支持 serde，以便在检查点中记录采样窗口、重启后精确复现控制轨迹。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocitySum {
    /// 速度分量之和
    pub sum: DVec3,
    /// 参与累加的粒子数
    pub count: u64,
}

impl VelocitySum {
    /// 零值
    pub const ZERO: Self = Self {
        sum: DVec3::ZERO,
        count: 0,
    };

    /// 创建新的归约量
    pub fn new(sum: DVec3, count: u64) -> Self {
        Self { sum, count }
    }

    /// 累加一个速度样本
    #[inline]
    pub fn accumulate(&mut self, velocity: DVec3) {
        self.sum += velocity;
        self.count += 1;
    }

    /// 合并另一个分片的部分和
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// 计算均值；窗口为空时返回 None
    #[inline]
    pub fn mean(&self) -> Option<DVec3> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// 跨分片速度归约接口
///
/// `all_reduce` 对所有分片的部分和做全局求和，每个分片都得到相同的结果。
/// 实现必须保证：
/// 1. 相对步进流水线是阻塞的——所有分片到齐前不得返回；
/// 2. 各分片步数一致，否则返回 [`crate::error::MfError::Collective`]（致命）。
pub trait VelocityReduction: Send + Sync {
    /// 归约实现名称
    fn name(&self) -> &'static str;

    /// 全局求和归约
    ///
    /// # 参数
    /// - `local`: 本分片的速度和与计数
    /// - `step`: 当前步号，用于一致性校验
    ///
    /// # 返回
    /// 所有分片合并后的全局和。
    fn all_reduce(&self, local: VelocitySum, step: u64) -> MfResult<VelocitySum>;
}

/// 单分片归约实现
///
/// 单进程运行时的恒等归约，本分片的部分和就是全局和。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalReduction;

impl VelocityReduction for LocalReduction {
    fn name(&self) -> &'static str {
        "LocalReduction"
    }

    fn all_reduce(&self, local: VelocitySum, _step: u64) -> MfResult<VelocitySum> {
        Ok(local)
    }
}
