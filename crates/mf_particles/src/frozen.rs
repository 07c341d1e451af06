// crates/mf_particles/src/frozen.rs

//! 冻结壁面生成器
//!
//! 在主模拟开始前运行一次的设置期组件：在每个壁面附近按目标数密度
//! 播种粒子，用给定的成对相互作用和松弛积分器跑一段松弛子模拟，
//! 使壁面附近的局部密度/压力达到体相平衡，然后把落在固体侧的粒子
//! 连同其末时刻速度一起冻结，丢弃流体侧的 halo 粒子。
//!
//! 冻结后的粒子群参与一切成对力计算，但不再被积分器推进，
//! 从而构成控制器目标速度所参照的物理边界。
//!
//! # 播种厚度约束
//!
//! 固体侧板坯厚度必须不小于相互作用截断半径，否则壁面对截断半径内
//! 的流体粒子出力不完整，产生力场间断。这是配置错误，在生成开始前
//! 即被拒绝（[`WallError::InvalidBoundaryThickness`]）。

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::WallError;
use crate::integrator::RelaxationIntegrator;
use crate::interaction::PairwiseInteraction;
use crate::population::ParticleVector;
use crate::wall::PlaneWall;

/// 冻结壁面生成配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrozenWallConfig {
    /// 目标体相数密度 [1/长度³]
    pub number_density: f64,
    /// 固体侧播种板坯厚度，必须 >= 相互作用截断半径
    pub slab_thickness: f64,
    /// 松弛步数（固定步数策略，无收敛判据）
    pub relax_steps: usize,
    /// 松弛时间步长
    pub relax_dt: f64,
    /// 初始 Maxwell 速度分布的温度 kB·T
    pub temperature: f64,
    /// 播种随机数种子
    pub seed: u64,
}

impl Default for FrozenWallConfig {
    fn default() -> Self {
        Self {
            number_density: 10.0,
            slab_thickness: 1.0,
            relax_steps: 1000,
            relax_dt: 0.001,
            temperature: 0.1,
            seed: 0x6d65_736f,
        }
    }
}

impl FrozenWallConfig {
    /// 设置期校验
    ///
    /// 生成开始前检查厚度与密度约束；`cutoff` 为相互作用截断半径。
    pub fn validate(&self, cutoff: f64) -> Result<(), WallError> {
        if self.number_density <= 0.0 {
            return Err(WallError::InvalidDensity {
                density: self.number_density,
            });
        }
        if self.slab_thickness < cutoff {
            return Err(WallError::InvalidBoundaryThickness {
                thickness: self.slab_thickness,
                cutoff,
            });
        }
        Ok(())
    }
}

/// 生成冻结壁面粒子群
///
/// # 参数
/// - `template`: 体相粒子群模板，提供质量与周期域
/// - `walls`: 半平面边界集合
/// - `interaction`: 成对相互作用（松弛期间使用，与主模拟相同）
/// - `integrator`: 松弛积分器
/// - `config`: 播种与松弛参数
///
/// # 算法
/// 1. 在整个周期域内按目标密度均匀播种，仅保留落在任一壁面
///    `[-thickness, +cutoff)` 距离带内的粒子（固体侧板坯 + 流体侧 halo）；
/// 2. 以 Maxwell 分布初始化速度，跑固定步数的松弛子模拟；
/// 3. 终止时位于固体侧的粒子冻结（位置与末速度保留），halo 丢弃。
///
/// # 错误
/// 设置期约束违反时返回 [`WallError`]，不进入松弛循环。
pub fn generate_frozen_wall<I, G>(
    name: impl Into<String>,
    template: &ParticleVector,
    walls: &[PlaneWall],
    interaction: &mut I,
    integrator: &mut G,
    config: &FrozenWallConfig,
) -> Result<ParticleVector, WallError>
where
    I: PairwiseInteraction,
    G: RelaxationIntegrator,
{
    if walls.is_empty() {
        return Err(WallError::NoBoundaries);
    }
    let cutoff = interaction.cutoff();
    config.validate(cutoff)?;

    let name = name.into();
    let domain = *template.domain();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    // 均匀播种后按壁面距离带筛选
    let n_seed = (config.number_density * domain.volume()).round() as usize;
    let sigma_v = (config.temperature / template.mass()).sqrt();

    let mut relax = ParticleVector::new(format!("{}_relax", name), template.mass(), domain)?;
    for _ in 0..n_seed {
        let size = domain.size();
        let p = domain.lo
            + DVec3::new(
                rng.gen::<f64>() * size.x,
                rng.gen::<f64>() * size.y,
                rng.gen::<f64>() * size.z,
            );

        let d = nearest_wall_distance(walls, p);
        if d < -config.slab_thickness || d >= cutoff {
            continue;
        }

        let v = sigma_v * DVec3::new(gaussian(&mut rng), gaussian(&mut rng), gaussian(&mut rng));
        relax.push(p, v);
    }

    log::debug!(
        "冻结壁面 '{}': 播种 {} 粒子 (板坯+halo), 松弛 {} 步",
        name,
        relax.len(),
        config.relax_steps
    );

    // 固定步数松弛：密度剖面在足够长的预热后达到稳态
    for _ in 0..config.relax_steps {
        integrator.advance(&mut relax, interaction, config.relax_dt)?;
    }

    // 固体侧成员冻结，halo 丢弃
    let mut frozen = ParticleVector::new(name.clone(), template.mass(), domain)?;
    for (p, v) in relax.iter() {
        if walls.iter().any(|w| w.is_inside_solid(p)) {
            frozen.push(p, v);
        }
    }
    frozen.freeze();

    log::debug!(
        "冻结壁面 '{}': 保留 {} / {} 粒子",
        name,
        frozen.len(),
        relax.len()
    );

    Ok(frozen)
}

/// 点到最近壁面的有符号距离（负值在固体侧）
#[inline]
fn nearest_wall_distance(walls: &[PlaneWall], p: DVec3) -> f64 {
    walls
        .iter()
        .map(|w| w.signed_distance(p))
        .fold(f64::INFINITY, f64::min)
}

/// Box-Muller 标准正态抽样
#[inline]
fn gaussian<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
