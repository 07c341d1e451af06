// crates/mf_control/src/sampler.rs

//! 采样累加器
//!
//! 每个模拟步调用一次 [`VelocitySampler::observe`]，把受控粒子群
//! （可选限制在采样区域内）的速度累加进当前窗口；每 `sample_every`
//! 步调用一次 [`VelocitySampler::drain`]，先做跨分片全局归约，
//! 再计算窗口均值并重置窗口。
//!
//! 空窗口（零粒子）返回 `None` 而不是除零——稀疏构型下空窗口是
//! 合法情形，控制器对此保持当前力不变。

use glam::DVec3;
use mf_foundation::error::MfResult;
use mf_foundation::reduce::{VelocityReduction, VelocitySum};
use mf_particles::population::ParticleVector;
use mf_particles::region::AxisAlignedBox;

/// 窗口化速度采样累加器
#[derive(Debug, Clone)]
pub struct VelocitySampler {
    /// 可选的采样区域；None 表示统计整个粒子群
    region: Option<AxisAlignedBox>,
    /// 当前采样窗口（上次 drain 以来的速度和与计数）
    window: VelocitySum,
}

impl VelocitySampler {
    /// 创建采样器
    pub fn new(region: Option<AxisAlignedBox>) -> Self {
        Self {
            region,
            window: VelocitySum::ZERO,
        }
    }

    /// 采样区域
    pub fn region(&self) -> Option<&AxisAlignedBox> {
        self.region.as_ref()
    }

    /// 当前窗口（检查点用）
    pub fn window(&self) -> &VelocitySum {
        &self.window
    }

    /// 恢复窗口（从检查点重启）
    pub fn restore_window(&mut self, window: VelocitySum) {
        self.window = window;
    }

    /// 观测一步：累加各粒子群的速度与计数
    pub fn observe(&mut self, populations: &[&ParticleVector]) {
        for pv in populations {
            pv.accumulate_velocities(self.region.as_ref(), &mut self.window);
        }
    }

    /// 排空窗口：全局归约后计算均值并重置
    ///
    /// # 返回
    /// - `Ok(Some(mean))`: 窗口非空，返回算术平均速度
    /// - `Ok(None)`: 全局窗口为空（本调谐周期无更新）
    /// - `Err(..)`: 集合通信失败，致命
    pub fn drain(&mut self, reduction: &dyn VelocityReduction, step: u64) -> MfResult<Option<DVec3>> {
        let global = reduction.all_reduce(self.window, step)?;
        self.window = VelocitySum::ZERO;
        Ok(global.mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_foundation::error::MfError;
    use mf_foundation::reduce::LocalReduction;

    fn population(name: &str, entries: &[(DVec3, DVec3)]) -> ParticleVector {
        let domain = AxisAlignedBox::from_size(DVec3::new(8.0, 16.0, 8.0));
        let mut pv = ParticleVector::new(name, 1.0, domain).unwrap();
        for (p, v) in entries {
            pv.push(*p, *v);
        }
        pv
    }

    #[test]
    fn test_observe_then_drain_mean() {
        let pv = population(
            "pv",
            &[
                (DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0)),
                (DVec3::ONE, DVec3::new(3.0, 2.0, 0.0)),
            ],
        );
        let mut sampler = VelocitySampler::new(None);

        sampler.observe(&[&pv]);
        let mean = sampler.drain(&LocalReduction, 1).unwrap().unwrap();

        assert!((mean.x - 2.0).abs() < 1e-12);
        assert!((mean.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drain_resets_window() {
        let pv = population("pv", &[(DVec3::ZERO, DVec3::X)]);
        let mut sampler = VelocitySampler::new(None);

        sampler.observe(&[&pv]);
        sampler.drain(&LocalReduction, 1).unwrap();

        // 第二次排空没有新观测，窗口为空
        assert!(sampler.drain(&LocalReduction, 2).unwrap().is_none());
    }

    #[test]
    fn test_empty_window_returns_none() {
        let mut sampler = VelocitySampler::new(None);
        assert!(sampler.drain(&LocalReduction, 1).unwrap().is_none());
    }

    #[test]
    fn test_region_restriction() {
        let pv = population(
            "pv",
            &[
                (DVec3::new(1.0, 1.0, 1.0), DVec3::new(1.0, 0.0, 0.0)),
                (DVec3::new(7.5, 15.0, 7.5), DVec3::new(99.0, 0.0, 0.0)),
            ],
        );
        let region = AxisAlignedBox::new(DVec3::ZERO, DVec3::new(4.0, 4.0, 4.0));
        let mut sampler = VelocitySampler::new(Some(region));

        sampler.observe(&[&pv]);
        let mean = sampler.drain(&LocalReduction, 1).unwrap().unwrap();

        assert!((mean.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_populations_accumulate() {
        let a = population("a", &[(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0))]);
        let b = population("b", &[(DVec3::ONE, DVec3::new(3.0, 0.0, 0.0))]);
        let mut sampler = VelocitySampler::new(None);

        sampler.observe(&[&a, &b]);
        let mean = sampler.drain(&LocalReduction, 1).unwrap().unwrap();

        assert!((mean.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collective_failure_is_fatal() {
        /// 模拟分片步数不一致的归约实现
        struct DesyncReduction;
        impl VelocityReduction for DesyncReduction {
            fn name(&self) -> &'static str {
                "desync"
            }
            fn all_reduce(&self, _local: VelocitySum, step: u64) -> MfResult<VelocitySum> {
                Err(MfError::collective(format!("分片在第 {} 步失去同步", step)))
            }
        }

        let mut sampler = VelocitySampler::new(None);
        let err = sampler.drain(&DesyncReduction, 7).unwrap_err();
        assert!(matches!(err, MfError::Collective { .. }));
    }
}
