// crates/mf_particles/src/interaction.rs

//! 成对相互作用接口与 DPD 参考核
//!
//! 控制子系统不关心成对力的数值细节，只把相互作用当作不透明的核：
//! [`PairwiseInteraction`] 定义冻结壁面松弛子模拟所消费的最小接口
//! （截断半径 + 整群力累加）。
//!
//! [`DpdInteraction`] 是耗散粒子动力学的参考实现，存在的意义是让
//! 松弛子模拟可以独立运行和测试。它用朴素的 O(N²) 双循环配合周期
//! 最小镜像求力——邻居表构建属于外部引擎的职责，这里不做。
//!
//! # DPD 力模型
//!
//! 对距离 r < rc 的粒子对 (i, j)：
//!
//! ```text
//! F_C = a (1 - r/rc) e                   保守力
//! F_D = -γ w(r)² (e·v_ij) e              耗散力
//! F_R = σ w(r) θ_ij e / √dt              随机力, σ = √(2 γ kB T)
//! w(r) = (1 - r/rc)^power
//! ```
//!
//! 随机数 θ_ij 必须对 (i, j) 与 (j, i) 对称，否则破坏动量守恒。
//! 这里用 (步号, min(i,j), max(i,j)) 的哈希生成均匀分布
//! [-√3, √3]（单位方差），保证并行遍历下的确定性。

use glam::DVec3;
use mf_foundation::ensure;
use mf_foundation::error::{MfError, MfResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::region::AxisAlignedBox;

/// 成对相互作用接口
///
/// 外部引擎与冻结壁面生成器共同消费的不透明核。
pub trait PairwiseInteraction: Send {
    /// 相互作用名称
    fn name(&self) -> &'static str;

    /// 截断半径 rc：超过该间距的粒子对不产生力
    fn cutoff(&self) -> f64;

    /// 累加整群粒子间作用力
    ///
    /// # 参数
    /// - `domain`: 周期域（最小镜像）
    /// - `positions` / `velocities`: 当前粒子状态
    /// - `dt`: 当前时间步长（随机力缩放需要）
    /// - `forces`: 输出缓冲区，力被累加（不清零）
    fn accumulate_forces(
        &mut self,
        domain: &AxisAlignedBox,
        positions: &[DVec3],
        velocities: &[DVec3],
        dt: f64,
        forces: &mut [DVec3],
    ) -> MfResult<()>;
}

/// DPD 相互作用参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DpdParams {
    /// 保守力强度 a
    pub a: f64,
    /// 耗散系数 γ
    pub gamma: f64,
    /// 温度 kB·T
    pub kb_t: f64,
    /// 权重函数指数 power
    pub power: f64,
    /// 截断半径 rc
    pub cutoff: f64,
}

impl Default for DpdParams {
    fn default() -> Self {
        // 典型的水相 DPD 参数组
        Self {
            a: 10.0,
            gamma: 50.0,
            kb_t: 0.1,
            power: 0.25,
            cutoff: 1.0,
        }
    }
}

/// DPD 参考核
#[derive(Debug, Clone)]
pub struct DpdInteraction {
    /// 参数组
    params: DpdParams,
    /// 随机力种子
    seed: u64,
    /// 调用计数，保证每步的随机力不同
    step_counter: u64,
}

impl DpdInteraction {
    /// 创建 DPD 核
    pub fn new(params: DpdParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            step_counter: 0,
        }
    }

    /// 参数组
    pub fn params(&self) -> &DpdParams {
        &self.params
    }

    /// 计算单对粒子的 DPD 力（作用在 i 上）
    #[inline]
    fn pair_force(&self, dr: DVec3, dv: DVec3, theta: f64, inv_sqrt_dt: f64) -> DVec3 {
        let r = dr.length();
        let rc = self.params.cutoff;
        if r >= rc || r < 1e-12 {
            return DVec3::ZERO;
        }

        let e = dr / r;
        let arg = 1.0 - r / rc;
        let w = arg.powf(self.params.power);
        let sigma = (2.0 * self.params.gamma * self.params.kb_t).sqrt();

        let f_c = self.params.a * arg;
        let f_d = -self.params.gamma * w * w * e.dot(dv);
        let f_r = sigma * w * theta * inv_sqrt_dt;

        (f_c + f_d + f_r) * e
    }
}

impl PairwiseInteraction for DpdInteraction {
    fn name(&self) -> &'static str {
        "dpd"
    }

    fn cutoff(&self) -> f64 {
        self.params.cutoff
    }

    fn accumulate_forces(
        &mut self,
        domain: &AxisAlignedBox,
        positions: &[DVec3],
        velocities: &[DVec3],
        dt: f64,
        forces: &mut [DVec3],
    ) -> MfResult<()> {
        MfError::check_size("velocities", positions.len(), velocities.len())?;
        MfError::check_size("forces", positions.len(), forces.len())?;
        ensure!(
            dt > 0.0,
            MfError::out_of_range("dt", dt, f64::MIN_POSITIVE, f64::MAX)
        );

        self.step_counter += 1;
        let step = self.step_counter;
        let seed = self.seed;
        let inv_sqrt_dt = 1.0 / dt.sqrt();

        // 每个粒子独立遍历全部配对；θ_ij 由有序对哈希得到，
        // 因此 (i,j) 与 (j,i) 看到同一随机数，动量严格守恒。
        forces
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, f_i)| {
                let mut acc = DVec3::ZERO;
                for j in 0..positions.len() {
                    if j == i {
                        continue;
                    }
                    let dr = domain.minimum_image(positions[i], positions[j]);
                    let dv = velocities[i] - velocities[j];
                    let theta = pair_uniform(seed, step, i.min(j) as u64, i.max(j) as u64);
                    acc += self.pair_force(dr, dv, theta, inv_sqrt_dt);
                }
                *f_i += acc;
            });

        Ok(())
    }
}

/// 有序粒子对的对称随机数，均匀分布 [-√3, √3]（单位方差）
#[inline]
fn pair_uniform(seed: u64, step: u64, lo: u64, hi: u64) -> f64 {
    let h = splitmix64(
        seed ^ step.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ lo.wrapping_mul(0xbf58_476d_1ce4_e5b9)
            ^ hi.wrapping_mul(0x94d0_49bb_1331_11eb),
    );
    let u = (h >> 11) as f64 / (1u64 << 53) as f64; // [0, 1)
    (2.0 * u - 1.0) * 3.0_f64.sqrt()
}

/// SplitMix64 位混合
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
