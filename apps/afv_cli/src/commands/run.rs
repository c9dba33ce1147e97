// apps/afv_cli/src/commands/run.rs

//! run 子命令：读控制文件、建网格、求解并写出结果
//!
//! 退出码约定：成功（收敛或到步数上限且无 NaN）为 0；
//! 控制文件/网格/数值/线性求解错误为非零。
//! 非关键输出失败只警告，不改变退出码。

use anyhow::{bail, Context};
use afv_config::{
    FlowParserOptions, GradientName, LimiterName, MESH_FROM_CMD,
};
use afv_io::{HistoryWriter, SurfaceWriter, VtuWriter};
use afv_mesh::{FvMesh, GmshLoader, PeriodicAxis};
use afv_physics::{
    BoundarySet, FlowSpatial, GhostCenterPolicy, StepRecord, SteadyFlowDriver,
};
use clap::Args;
use std::path::PathBuf;

/// run 参数
#[derive(Args)]
pub struct RunArgs {
    /// 控制文件路径
    pub control: PathBuf,

    /// 网格路径（控制文件 mesh_file 为 "from-cmd" 时必需）
    pub mesh: Option<PathBuf>,

    /// 以超声速涡解析速度场初始化
    #[arg(long)]
    pub vortex_init: bool,
}

/// 执行
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let opts = FlowParserOptions::from_file(&args.control)
        .with_context(|| format!("cannot parse control file {}", args.control.display()))?;

    // 网格路径：控制文件给出或取自命令行
    let mesh_path = if opts.io.mesh_file == MESH_FROM_CMD {
        match &args.mesh {
            Some(p) => p.clone(),
            None => bail!("control file requests mesh from command line but none was given"),
        }
    } else {
        PathBuf::from(&opts.io.mesh_file)
    };

    tracing::info!(mesh = %mesh_path.display(), "loading mesh");
    let data = GmshLoader::load(&mesh_path)?;
    let mut mesh = FvMesh::build(&data)?;
    if !opts.physics.periodic_markers.is_empty() {
        let axis = PeriodicAxis::from_label(&opts.physics.periodic_axis)
            .with_context(|| format!("bad periodic axis '{}'", opts.physics.periodic_axis))?;
        mesh.link_periodic(&opts.physics.periodic_markers, axis)?;
    }
    tracing::info!(
        cells = mesh.n_cells(),
        faces = mesh.n_faces(),
        boundary_faces = mesh.n_bfaces(),
        "mesh ready"
    );

    // 配置引用的标记必须在网格中出现
    for marker in BoundarySet::from_config(&opts.physics).markers() {
        mesh.require_marker(marker)?;
    }

    // 主空间离散 + 一阶 starter
    let main_spatial = FlowSpatial::new(
        &mesh,
        &opts.physics,
        &opts.numerics,
        GhostCenterPolicy::MidpointReflection,
    )?;
    let mut starter_numerics = opts.numerics.clone();
    starter_numerics.gradient = GradientName::None;
    starter_numerics.limiter = LimiterName::None;
    starter_numerics.second_order = false;
    let starter_spatial = FlowSpatial::new(
        &mesh,
        &opts.physics,
        &starter_numerics,
        GhostCenterPolicy::MidpointReflection,
    )?;

    let driver = SteadyFlowDriver::new(&main_spatial, Some(&starter_spatial), &opts.pseudotime);
    let mut u = starter_spatial.initialize_unknowns(args.vortex_init);

    let report = driver
        .solve(&mut u)
        .context("steady solve failed")?;

    tracing::info!(
        converged = report.main.converged,
        steps = report.main.steps,
        rel_res = report.main.final_rel_residual,
        lin_iters = report.main.timing.total_lin_iters,
        wall = ?report.main.timing.ode_wall,
        "solve finished"
    );

    let (log10_h, log10_err) = main_spatial.entropy_error(&u);
    tracing::info!(log10_h, log10_err, "entropy error vs freestream");

    // 体输出
    let nodal = main_spatial.postprocess_point(&u);
    if let Err(e) = VtuWriter.write(&opts.io.solution_output_file, &mesh, &nodal) {
        tracing::warn!(error = %e, "volume output failed");
    } else {
        tracing::info!(file = %opts.io.solution_output_file, "volume solution written");
    }

    // 表面系数
    let markers: Vec<i32> = opts
        .surface_output
        .wall_markers
        .iter()
        .chain(opts.surface_output.other_markers.iter())
        .copied()
        .collect();
    for marker in markers {
        let rep = main_spatial.surface_report(&u, marker);
        tracing::info!(marker, cl = rep.cl, cd = rep.cd, "surface coefficients");
        let path = SurfaceWriter::path_for(&opts.surface_output.file_prefix, marker);
        if let Err(e) = SurfaceWriter.write(&path, &rep) {
            tracing::warn!(error = %e, marker, "surface output failed");
        }
    }

    // 收敛历史
    if opts.io.convergence_history_required {
        let mut history: Vec<StepRecord> = Vec::new();
        if let Some(starter) = &report.starter {
            history.extend_from_slice(&starter.history);
        }
        let offset = history.len();
        history.extend(report.main.history.iter().map(|r| StepRecord {
            step: r.step + offset,
            ..*r
        }));
        let path = HistoryWriter::path_for(&opts.io.log_file_prefix);
        if let Err(e) = HistoryWriter.write(&path, &history) {
            tracing::warn!(error = %e, "history output failed");
        }
    }

    Ok(())
}
