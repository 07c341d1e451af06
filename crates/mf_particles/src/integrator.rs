// crates/mf_particles/src/integrator.rs

//! 松弛积分器
//!
//! 定义冻结壁面生成器消费的时间推进接口 [`RelaxationIntegrator`]，
//! 以及速度 Verlet 参考实现。
//!
//! 主模拟的时间积分（含多粒子群、全局体力）由外部引擎负责；
//! 这里的积分器只服务于壁面松弛子模拟：单一粒子群、周期域、成对力。
//!
//! 冻结粒子群不会被任何积分器推进——[`ParticleVector::state_mut`]
//! 在冻结标志置位后拒绝给出可变状态。

use glam::DVec3;
use mf_foundation::error::MfResult;

use crate::interaction::PairwiseInteraction;
use crate::population::ParticleVector;

/// 松弛积分器接口
pub trait RelaxationIntegrator: Send {
    /// 积分器名称
    fn name(&self) -> &'static str;

    /// 推进一个时间步（原地修改粒子群）
    ///
    /// # 参数
    /// - `population`: 要推进的粒子群
    /// - `interaction`: 成对相互作用
    /// - `dt`: 时间步长
    fn advance<I: PairwiseInteraction>(
        &mut self,
        population: &mut ParticleVector,
        interaction: &mut I,
        dt: f64,
    ) -> MfResult<()>;
}

/// 速度 Verlet 积分器（kick-drift-kick 形式）
///
/// ```text
/// v^{n+1/2} = v^n + (dt/2) f^n / m
/// x^{n+1}   = x^n + dt v^{n+1/2}
/// v^{n+1}   = v^{n+1/2} + (dt/2) f^{n+1} / m
/// ```
#[derive(Debug, Default)]
pub struct VelocityVerlet {
    /// 当前步起点的力缓冲
    forces: Vec<DVec3>,
    /// 力缓冲是否与粒子状态一致
    primed: bool,
}

impl VelocityVerlet {
    /// 创建积分器
    pub fn new() -> Self {
        Self::default()
    }

    /// 确保内部缓冲区大小正确
    fn ensure_size(&mut self, n: usize) {
        if self.forces.len() != n {
            self.forces.clear();
            self.forces.resize(n, DVec3::ZERO);
            self.primed = false;
        }
    }
}

impl RelaxationIntegrator for VelocityVerlet {
    fn name(&self) -> &'static str {
        "velocity_verlet"
    }

    fn advance<I: PairwiseInteraction>(
        &mut self,
        population: &mut ParticleVector,
        interaction: &mut I,
        dt: f64,
    ) -> MfResult<()> {
        let n = population.len();
        let mass = population.mass();
        let domain = *population.domain();
        self.ensure_size(n);

        // 首步需要初始力
        if !self.primed {
            for f in &mut self.forces {
                *f = DVec3::ZERO;
            }
            interaction.accumulate_forces(
                &domain,
                population.positions(),
                population.velocities(),
                dt,
                &mut self.forces,
            )?;
            self.primed = true;
        }

        let half_dt_over_m = 0.5 * dt / mass;

        {
            let (positions, velocities) = population.state_mut()?;
            for i in 0..n {
                velocities[i] += self.forces[i] * half_dt_over_m;
                positions[i] += velocities[i] * dt;
            }
        }
        population.wrap_periodic();

        // 新位置处的力
        for f in &mut self.forces {
            *f = DVec3::ZERO;
        }
        interaction.accumulate_forces(
            &domain,
            population.positions(),
            population.velocities(),
            dt,
            &mut self.forces,
        )?;

        let (_, velocities) = population.state_mut()?;
        for i in 0..n {
            velocities[i] += self.forces[i] * half_dt_over_m;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{DpdInteraction, DpdParams};
    use crate::region::AxisAlignedBox;
    use mf_foundation::error::MfError;

    /// 无相互作用的空核，用于检验自由漂移
    struct FreeStreaming;

    impl PairwiseInteraction for FreeStreaming {
        fn name(&self) -> &'static str {
            "free"
        }

        fn cutoff(&self) -> f64 {
            0.0
        }

        fn accumulate_forces(
            &mut self,
            _domain: &AxisAlignedBox,
            _positions: &[glam::DVec3],
            _velocities: &[glam::DVec3],
            _dt: f64,
            _forces: &mut [glam::DVec3],
        ) -> Result<(), MfError> {
            Ok(())
        }
    }

    fn test_domain() -> AxisAlignedBox {
        AxisAlignedBox::from_size(DVec3::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn test_free_streaming_drift() {
        let mut pv = ParticleVector::new("pv", 1.0, test_domain()).unwrap();
        pv.push(DVec3::new(1.0, 1.0, 1.0), DVec3::new(1.0, 0.0, 0.0));

        let mut vv = VelocityVerlet::new();
        let mut free = FreeStreaming;
        for _ in 0..10 {
            vv.advance(&mut pv, &mut free, 0.1).unwrap();
        }

        // 无力时匀速直线运动：x = 1 + 1.0 * 1.0 = 2
        let p = pv.positions()[0];
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((pv.velocities()[0].x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_wrap_during_advance() {
        let mut pv = ParticleVector::new("pv", 1.0, test_domain()).unwrap();
        pv.push(DVec3::new(9.95, 5.0, 5.0), DVec3::new(1.0, 0.0, 0.0));

        let mut vv = VelocityVerlet::new();
        let mut free = FreeStreaming;
        vv.advance(&mut pv, &mut free, 0.1).unwrap();

        let p = pv.positions()[0];
        assert!(test_domain().contains(p));
        assert!((p.x - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_frozen_population_not_advanced() {
        let mut pv = ParticleVector::new("frozen", 1.0, test_domain()).unwrap();
        pv.push(DVec3::new(1.0, 1.0, 1.0), DVec3::new(1.0, 0.0, 0.0));
        pv.freeze();

        let mut vv = VelocityVerlet::new();
        let mut free = FreeStreaming;
        assert!(vv.advance(&mut pv, &mut free, 0.1).is_err());

        // 位置保持不变
        assert_eq!(pv.positions()[0], DVec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_dpd_pair_stays_finite() {
        // 两个粒子在排斥力下松弛，不应发散
        let mut pv = ParticleVector::new("pv", 1.0, test_domain()).unwrap();
        pv.push(DVec3::new(5.0, 5.0, 5.0), DVec3::ZERO);
        pv.push(DVec3::new(5.3, 5.0, 5.0), DVec3::ZERO);

        let mut vv = VelocityVerlet::new();
        let mut dpd = DpdInteraction::new(DpdParams::default(), 11);
        for _ in 0..100 {
            vv.advance(&mut pv, &mut dpd, 0.001).unwrap();
        }

        for (p, v) in pv.iter() {
            assert!(p.is_finite());
            assert!(v.is_finite());
        }
    }
}
