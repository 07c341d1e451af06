//! 闭环控制集成测试
//!
//! 不依赖完整的 DPD 引擎：用一个简化的"施力-推进"循环模拟引擎侧行为
//! （每步把当前体力按 a = F/m 加到所有粒子速度上），验证控制回路
//! 端到端的节奏、收敛趋势与日志落盘。

use glam::DVec3;

use mf_control::pid::PidGains;
use mf_control::{
    build_velocity_control, ObserverRegistry, StepContext, StepObserver, VelocityControlConfig,
    VelocityController,
};
use mf_foundation::reduce::LocalReduction;
use mf_particles::population::ParticleVector;
use mf_particles::region::AxisAlignedBox;

const DT: f64 = 0.001;

fn make_population(n: usize) -> ParticleVector {
    let domain = AxisAlignedBox::from_size(DVec3::new(8.0, 16.0, 8.0));
    let mut pv = ParticleVector::new("pv", 1.0, domain).unwrap();
    for i in 0..n {
        let x = (i % 8) as f64;
        let y = ((i / 8) % 16) as f64;
        let z = (i / 128) as f64;
        pv.push(DVec3::new(x, y, z), DVec3::ZERO);
    }
    pv
}

fn make_config(gains: PidGains, log_path: &std::path::Path) -> VelocityControlConfig {
    VelocityControlConfig::new(
        "loop",
        vec!["pv".into()],
        DVec3::new(1.0, 0.0, 0.0),
        gains,
        log_path,
    )
}

/// 引擎侧一步：施加当前体力并推进速度（质量 1，无其他相互作用）
fn apply_body_force(pv: &mut ParticleVector, force: DVec3, dt: f64) {
    let (_, velocities) = pv.state_mut().unwrap();
    for v in velocities.iter_mut() {
        *v += force * dt;
    }
}

fn mean_velocity(pv: &ParticleVector) -> DVec3 {
    let mut sum = DVec3::ZERO;
    for (_, v) in pv.iter() {
        sum += v;
    }
    sum / pv.len() as f64
}

#[test]
fn test_proportional_loop_drives_velocity_toward_target() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("vcont.txt");
    // 纯比例控制：一阶系统单调逼近目标，不会过冲
    let config = make_config(PidGains::proportional(0.5).unwrap(), &log_path);
    let (controller, logger) =
        build_velocity_control(&config, DT, Box::new(LocalReduction)).unwrap();
    let force = controller.force_handle();

    let mut registry = ObserverRegistry::new();
    registry.register(controller);
    registry.register(logger);

    let mut pv = make_population(64);
    let mut means = Vec::new();
    for step in 1..=2000u64 {
        apply_body_force(&mut pv, force.get(), DT);
        {
            let pops = [&pv];
            let ctx = StepContext::new(step, DT, &pops);
            registry.after_step(&ctx).unwrap();
        }
        if step % 500 == 0 {
            means.push(mean_velocity(&pv).x);
        }
    }

    // x 方向平均速度单调增长、逼近目标
    for pair in means.windows(2) {
        assert!(pair[1] > pair[0], "均速应随调谐单调增长: {:?}", means);
    }
    assert!(means[means.len() - 1] > 0.0);
    assert!(means[means.len() - 1] < 1.0, "纯比例不应过冲");

    // 横向不受控分量保持为零
    let m = mean_velocity(&pv);
    assert_eq!(m.y, 0.0);
    assert_eq!(m.z, 0.0);
}

#[test]
fn test_force_steps_only_on_tune_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let config = make_config(
        PidGains::from_factor(0.08).unwrap(),
        &dir.path().join("vcont.txt"),
    );
    let (controller, logger) =
        build_velocity_control(&config, DT, Box::new(LocalReduction)).unwrap();
    let force = controller.force_handle();

    let mut registry = ObserverRegistry::new();
    registry.register(controller);
    registry.register(logger);

    let pv = make_population(16);
    let mut previous = force.get();
    for step in 1..=20u64 {
        let pops = [&pv];
        let ctx = StepContext::new(step, DT, &pops);
        registry.after_step(&ctx).unwrap();

        let current = force.get();
        if step % 5 == 0 {
            // 粒子静止、误差恒定、积分项增长，每次调谐力都应变化
            assert_ne!(current, previous, "第 {} 步应调谐", step);
        } else {
            assert_eq!(current, previous, "第 {} 步不应调谐", step);
        }
        previous = current;
    }
}

#[test]
fn test_log_file_line_count_follows_dump_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("vcont.txt");
    let mut config = make_config(PidGains::from_factor(0.08).unwrap(), &log_path);
    config.dump_every = 10;
    let (controller, logger) =
        build_velocity_control(&config, DT, Box::new(LocalReduction)).unwrap();

    let mut registry = ObserverRegistry::new();
    registry.register(controller);
    registry.register(logger);

    let pv = make_population(16);
    for step in 1..=55u64 {
        let pops = [&pv];
        let ctx = StepContext::new(step, DT, &pops);
        registry.after_step(&ctx).unwrap();
    }

    let content = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    // 表头 + 第 10/20/30/40/50 步的 5 条记录
    assert!(lines[0].starts_with('#'));
    assert_eq!(lines.len(), 6);

    // 每条记录 10 列且可解析
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields.len(), 10);
        fields[0].parse::<u64>().unwrap();
        for field in &fields[1..] {
            field.parse::<f64>().unwrap();
        }
    }
}

#[test]
fn test_two_controllers_on_disjoint_populations() {
    let dir = tempfile::tempdir().unwrap();

    let config_a = make_config(
        PidGains::proportional(0.5).unwrap(),
        &dir.path().join("a.txt"),
    );
    let mut config_b = VelocityControlConfig {
        populations: vec!["other".into()],
        ..make_config(
            PidGains::proportional(0.5).unwrap(),
            &dir.path().join("b.txt"),
        )
    };
    config_b.target_velocity = DVec3::new(0.0, 2.0, 0.0);

    let (ctrl_a, _) = build_velocity_control(&config_a, DT, Box::new(LocalReduction)).unwrap();
    let (ctrl_b, _) = build_velocity_control(&config_b, DT, Box::new(LocalReduction)).unwrap();
    let force_a = ctrl_a.force_handle();
    let force_b = ctrl_b.force_handle();

    let mut registry = ObserverRegistry::new();
    registry.register(ctrl_a);
    registry.register(ctrl_b);

    let pv = make_population(16);
    let domain = AxisAlignedBox::from_size(DVec3::new(8.0, 16.0, 8.0));
    let mut other = ParticleVector::new("other", 1.0, domain).unwrap();
    for i in 0..16 {
        other.push(DVec3::new(i as f64 * 0.25, 2.0, 2.0), DVec3::ZERO);
    }

    for step in 1..=5u64 {
        let pops = [&pv, &other];
        let ctx = StepContext::new(step, DT, &pops);
        registry.after_step(&ctx).unwrap();
    }

    // 每个控制器只看到自己的粒子群：误差方向互不串扰
    assert!(force_a.get().x > 0.0);
    assert_eq!(force_a.get().y, 0.0);
    assert!(force_b.get().y > 0.0);
    assert_eq!(force_b.get().x, 0.0);
}

#[test]
fn test_replay_from_restored_state_is_deterministic() {
    // 同一配置跑两遍，逐个调谐周期比较施加的力
    let run = |steps: u64| -> Vec<DVec3> {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(
            PidGains::from_factor(0.08).unwrap(),
            &dir.path().join("vcont.txt"),
        );
        let mut controller =
            VelocityController::new(&config, DT, Box::new(LocalReduction)).unwrap();
        let force = controller.force_handle();

        let mut pv = make_population(32);
        let mut history = Vec::new();
        for step in 1..=steps {
            apply_body_force(&mut pv, force.get(), DT);
            {
                let pops = [&pv];
                let ctx = StepContext::new(step, DT, &pops);
                controller.after_step(&ctx).unwrap();
            }
            if step % 5 == 0 {
                history.push(force.get());
            }
        }
        history
    };

    let a = run(100);
    let b = run(100);
    assert_eq!(a, b);
}
