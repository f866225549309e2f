//! # Breadcrumbs Executable
//!
//! Routes a trail across an elevation raster through the waypoints given in a parameter file.
//!
//! In the default mode a single route is computed and written as a raster marking every cell on
//! the trail. With `--testsuite` the route is computed once for every combination of the sweep
//! candidate weights, writing one raster per combination, a summary table and optionally a
//! heatmap of how often each cell was chosen.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{error, info, warn};
use serde::Serialize;
use structopt::StructOpt;

use breadcrumbs_lib::{
    map::{CostMap, GridPoint, TerrainMap},
    nav::{count_marked, sweep, validate_waypoints, Router, SweepOptions, Weights},
    params::RouteParams,
    raster::{self, RasterError},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Terrain aware trail router.
#[derive(Debug, StructOpt)]
#[structopt(name = "breadcrumbs")]
struct Opts {
    /// The elevation raster (single band TIFF).
    #[structopt(parse(from_os_str))]
    elevation: PathBuf,

    /// The route parameter file (JSON or TOML).
    #[structopt(short, long, default_value = "params.json", parse(from_os_str))]
    params: PathBuf,

    /// Where to write the path raster when routing a single time.
    #[structopt(short, long, default_value = "path.tif", parse(from_os_str))]
    output: PathBuf,

    /// Route once for every combination of the sweep candidate weights.
    #[structopt(long)]
    testsuite: bool,

    /// Sum every sweep run into a heatmap.
    #[structopt(long, requires = "testsuite")]
    heatmap: bool,

    /// Don't write a raster for each sweep run.
    #[structopt(long, requires = "testsuite")]
    no_artifacts: bool,

    /// Directory in which the sweep directory is created, defaults to the working directory.
    #[structopt(long, requires = "testsuite", parse(from_os_str))]
    sweep_root: Option<PathBuf>,

    /// Route sweep combinations in parallel.
    #[structopt(long, requires = "testsuite")]
    parallel: bool,

    /// Also write a PNG preview alongside every raster.
    #[structopt(long)]
    preview: bool,

    /// Write the accumulated extra cost grid to this file.
    #[structopt(long, parse(from_os_str))]
    cost_output: Option<PathBuf>,

    /// Directory in which session directories are created.
    #[structopt(long, default_value = "sessions", parse(from_os_str))]
    sessions_dir: PathBuf,

    /// Minimum level of log messages.
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Summary of an execution, saved in the session directory.
#[derive(Debug, Serialize)]
struct RunReport {
    elevation: PathBuf,

    /// Shape of the grid as (rows, columns).
    grid_shape: (usize, usize),

    waypoints: Vec<GridPoint>,

    /// Weights of a single routing pass, `None` for a sweep.
    weights: Option<Weights>,

    /// Cells on the path of a single routing pass.
    marked_cells: Option<usize>,

    /// The path raster, or the sweep directory.
    output: PathBuf,

    num_runs: usize,

    num_failures: usize,
}

// -----------------------------------------------------------------------------------------------
// MAIN
// -----------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("breadcrumbs", &opts.sessions_dir).wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Breadcrumbs Terrain Router\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD INPUTS ----

    let elevation = raster::read_grid(&opts.elevation)
        .wrap_err_with(|| format!("Failed to read the elevation raster {:?}", opts.elevation))?;

    let params: RouteParams = util::params::load(&opts.params)
        .wrap_err_with(|| format!("Failed to load the parameter file {:?}", opts.params))?;
    params.validate()?;

    info!(
        "Loaded {}x{} elevation raster and {} waypoints",
        elevation.ncols(),
        elevation.nrows(),
        params.points.len()
    );

    // ---- BUILD THE MAP ----

    let base_dir = opts.params.parent().unwrap_or_else(|| Path::new("."));
    let layers = params
        .layers
        .iter()
        .map(|l| raster::read_cost_layer(l, base_dir, elevation.dim()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .wrap_err("Failed to load the cost layers")?;

    let cost_map = CostMap::accumulate(elevation.dim(), &layers)
        .wrap_err("Failed to accumulate the cost layers")?;

    if let Some(ref path) = opts.cost_output {
        raster::write_float_grid(&cost_map, path).wrap_err("Failed to write the cost grid")?;
        info!("Cost grid written to {:?}", path);
    }

    let map = TerrainMap::new(elevation, cost_map.into_inner())
        .wrap_err("Failed to build the terrain map")?;

    // Informational only, nodata (NaN) cells have no order but can still be routed around
    match map.range() {
        Ok(range) => info!("Elevation range: {} to {}", range.start, range.end),
        Err(e) => warn!("Cannot compute the elevation range: {}", e),
    }

    validate_waypoints(&map, &params.points)?;

    // ---- ROUTE ----

    let report = if opts.testsuite {
        run_sweep(&opts, &params, &map)?
    } else {
        run_single(&opts, &params, &map)?
    };

    let report_path = session
        .save_json("route_report.json", &report)
        .wrap_err("Failed to save the run report")?;
    info!("Run report saved to {:?}", report_path);

    if report.num_failures > 0 {
        error!(
            "{} of {} runs failed, see the summary in {:?}",
            report.num_failures, report.num_runs, report.output
        );
        return Err(eyre!(
            "{} of {} runs failed",
            report.num_failures,
            report.num_runs
        ));
    }

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Route once with the weights in the parameter file.
fn run_single(opts: &Opts, params: &RouteParams, map: &TerrainMap) -> Result<RunReport> {
    let weights = params.weights();
    let router = Router::new(map, weights)?;

    info!("Routing with weights {}", weights.artifact_name());

    let output = router.route(&params.points).wrap_err("Failed to route")?;
    let marked_cells = count_marked(&output);

    raster::write_int_grid(&output, &opts.output).wrap_err("Failed to write the path raster")?;
    if opts.preview {
        raster::write_preview(&output, opts.output.with_extension("png"))
            .wrap_err("Failed to write the path preview")?;
    }

    info!("Path of {} cells written to {:?}", marked_cells, opts.output);

    Ok(RunReport {
        elevation: opts.elevation.clone(),
        grid_shape: map.dim(),
        waypoints: params.points.clone(),
        weights: Some(weights),
        marked_cells: Some(marked_cells),
        output: opts.output.clone(),
        num_runs: 1,
        num_failures: 0,
    })
}

/// Route once for every combination of the sweep candidates.
fn run_sweep(opts: &Opts, params: &RouteParams, map: &TerrainMap) -> Result<RunReport> {
    let combinations = params
        .sweep
        .combinations(params.weights.units_per_pixel)
        .wrap_err("Invalid sweep candidates")?;

    let sweep_dir = opts
        .sweep_root
        .as_deref()
        .unwrap_or_else(|| Path::new("."))
        .join(sweep::dir_name(&opts.elevation, &params.points));
    fs::create_dir_all(&sweep_dir)
        .wrap_err_with(|| format!("Failed to create the sweep directory {:?}", sweep_dir))?;

    info!("Sweep directory: {:?}", sweep_dir);

    let options = SweepOptions {
        heatmap: opts.heatmap,
        artifacts: !opts.no_artifacts,
        parallel: opts.parallel,
    };
    let preview = opts.preview;

    let report = sweep::run(
        map,
        &params.points,
        &combinations,
        options,
        |weights, path| -> std::result::Result<(), RasterError> {
            let name = weights.artifact_name();
            raster::write_int_grid(path, sweep_dir.join(format!("{}.tif", name)))?;
            if preview {
                raster::write_preview(path, sweep_dir.join(format!("{}.png", name)))?;
            }
            Ok(())
        },
    )?;

    let summary_path = sweep_dir.join("summary.csv");
    report
        .write_csv(&summary_path)
        .wrap_err("Failed to write the sweep summary")?;
    info!("Sweep summary written to {:?}", summary_path);

    if let Some(ref heatmap) = report.heatmap {
        raster::write_int_grid(heatmap, sweep_dir.join("heatmap.tif"))
            .wrap_err("Failed to write the heatmap")?;
        if preview {
            raster::write_preview(&**heatmap, sweep_dir.join("heatmap.png"))
                .wrap_err("Failed to write the heatmap preview")?;
        }
        info!("Heatmap written to {:?}", sweep_dir);
    }

    Ok(RunReport {
        elevation: opts.elevation.clone(),
        grid_shape: map.dim(),
        waypoints: params.points.clone(),
        weights: None,
        marked_cells: None,
        output: sweep_dir,
        num_runs: report.records.len(),
        num_failures: report.num_failures(),
    })
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Opts, structopt::clap::Error> {
        Opts::from_iter_safe(std::iter::once("breadcrumbs").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["dem.tif"]).unwrap();

        assert_eq!(opts.elevation, PathBuf::from("dem.tif"));
        assert_eq!(opts.params, PathBuf::from("params.json"));
        assert_eq!(opts.output, PathBuf::from("path.tif"));
        assert!(!opts.testsuite);
        assert_eq!(opts.sweep_root, None);
        assert_eq!(opts.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_sweep_flags() {
        let opts = parse(&[
            "dem.tif",
            "--testsuite",
            "--heatmap",
            "--no-artifacts",
            "--parallel",
            "--sweep-root",
            "out",
        ])
        .unwrap();

        assert!(opts.testsuite && opts.heatmap && opts.no_artifacts && opts.parallel);
        assert_eq!(opts.sweep_root, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_sweep_flags_require_testsuite() {
        for flags in &[
            vec!["--heatmap"],
            vec!["--no-artifacts"],
            vec!["--parallel"],
            vec!["--sweep-root", "out"],
        ] {
            let mut args = vec!["dem.tif"];
            args.extend(flags.iter().copied());

            assert!(parse(&args).is_err(), "{:?} accepted without --testsuite", flags);
        }

        // Previews and cost output apply to both modes
        assert!(parse(&["dem.tif", "--preview", "--cost-output", "cost.tif"]).is_ok());
    }
}
