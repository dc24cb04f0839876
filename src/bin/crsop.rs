//! crsop: transform named points between CRS identified by EPSG, compound,
//! or ENU identifiers
use clap::Parser;
use crstools::grid::BaseGrid;
use crstools::precision::format_point;
use crstools::prelude::*;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "crsop")]
#[clap(author, version, about = "Transform named points between CRS", long_about = None)]
struct Cli {
    /// Source CRS, e.g. EPSG:4937, EPSG:25830+5782, or ENU:4937;-4.5;36.7;142.2
    #[clap(short, long)]
    source: Option<String>,

    /// Target CRS
    #[clap(short, long)]
    target: Option<String>,

    /// Swap source and target
    #[clap(long)]
    inverse: bool,

    /// Accept deprecated CRS
    #[clap(long)]
    allow_deprecated: bool,

    /// Read the CRS catalog and grids from ./crstools and the user data
    /// directory, rather than using the builtin catalog
    #[clap(long)]
    plain: bool,

    /// Gravsoft geoid grids to register with the builtin catalog provider
    #[clap(long)]
    grid: Vec<PathBuf>,

    /// List all CRS of the catalog
    #[clap(long)]
    list: bool,

    /// List the CRS suitable for 2D applications
    #[clap(long = "list-2d")]
    list_2d: bool,

    /// List the vertical CRS compatible with the given horizontal CRS
    #[clap(long)]
    vertical: Option<String>,

    /// Write the catalog, as ;-separated text, to this file
    #[clap(long)]
    dump: Option<PathBuf>,

    /// Print the ENU identifier centered at each input point, rather than transforming it
    #[clap(long)]
    enu: bool,

    /// Tabular report with input and output coordinates, at the precision of each CRS
    #[clap(short, long)]
    report: bool,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// The files to operate on, stdin if none. One point per line: `id x y [z]`
    args: Vec<String>,
}

fn main() -> Result<(), anyhow::Error> {
    let options = Cli::parse();
    env_logger::Builder::new()
        .filter_level(options.verbose.log_level_filter())
        .init();
    debug!("{options:#?}");

    if options.plain {
        return run(CrsTools::new(Plain::new()), &options);
    }

    // We use ::new() instead of ::default() in order to gain access to the
    // BUILTIN_ADAPTORS and the builtin catalog
    let mut ctx = Minimal::new();
    for path in &options.grid {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Bad grid file name: {}", path.display()))?;
        let grid = BaseGrid::gravsoft(name, &std::fs::read(path)?)?;
        info!("Registered grid {name}");
        ctx.register_grid(name, grid);
    }
    run(CrsTools::new(ctx), &options)
}

fn run<C: Context>(tools: CrsTools<C>, options: &Cli) -> Result<(), anyhow::Error> {
    tools.initialize(!options.allow_deprecated)?;

    if options.list || options.list_2d {
        let list = if options.list {
            tools.crs_info()?
        } else {
            tools.crs_for_2d_applications()?
        };
        for info in list {
            let deprecated = if info.deprecated { " (deprecated)" } else { "" };
            println!("{:12} {}{deprecated}", info.code, info.name);
        }
    }

    if let Some(horizontal) = &options.vertical {
        for info in tools.crs_vertical(horizontal)? {
            println!("{:12} {}", info.code, info.name);
        }
    }

    if let Some(path) = &options.dump {
        tools.dump_crs_info_to_file(path)?;
        info!("Catalog written to {}", path.display());
    }

    let Some(mut source) = options.source.clone() else {
        return Ok(());
    };

    let points = read_points(&options.args)?;
    if options.enu {
        for (id, point) in &points {
            let Some((x, y, z)) = enu_origin(point) else {
                warn!("{id}: an ENU origin needs a height, skipping 2D point");
                continue;
            };
            match tools.crs_enu(&source, x, y, z) {
                Ok(enu) => println!("{id} {enu}"),
                Err(e) => error!("{id}: {e}"),
            }
        }
        return Ok(());
    }

    let Some(mut target) = options.target.clone() else {
        return Err(anyhow::anyhow!("A target CRS is needed"));
    };
    if options.inverse {
        (source, target) = (target, source);
    }

    // Malformed identifiers and unknown CRS abort here
    tools.pipeline(&source, &target)?;
    let source_digits = tools.crs_precision(&source)?;
    let target_digits = tools.crs_precision(&target)?;

    let mut transformed = points.clone();
    let outcome = tools.crs_operation_batch(&source, &target, &mut transformed, true)?;
    let failed: BTreeMap<&String, &String> =
        outcome.errors.iter().map(|(id, e)| (id, e)).collect();

    if options.report {
        println!("# {source} -> {target}");
        println!(
            "# Precision: {} / {} digits -> {} / {} digits",
            source_digits.0, source_digits.1, target_digits.0, target_digits.1
        );
    }
    for (id, point) in &transformed {
        if failed.contains_key(id) {
            continue;
        }
        let output = format_point(point.x, point.y, point.z, target_digits);
        if options.report {
            let input = &points[id];
            let input = format_point(input.x, input.y, input.z, source_digits);
            println!("{id:8} {input}   {output}");
        } else {
            println!("{id} {output}");
        }
    }
    if options.report {
        println!(
            "# {} transformed, {} failed",
            outcome.succeeded,
            outcome.failed()
        );
    }
    Ok(())
}

// Points in the `id x y [z]` format, from files or stdin
fn read_points(args: &[String]) -> Result<BTreeMap<String, PointRecord>, anyhow::Error> {
    let mut lines = Vec::new();
    if args.is_empty() {
        for line in std::io::stdin().lock().lines() {
            lines.push(line?);
        }
    }
    for path in args {
        let file = std::fs::File::open(path)?;
        for line in std::io::BufReader::new(file).lines() {
            lines.push(line?);
        }
    }

    let mut points = BTreeMap::new();
    for line in lines {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields.len() > 4 {
            error!("Skipping malformed line: '{line}'");
            continue;
        }
        let numbers: Result<Vec<f64>, _> = fields[1..].iter().map(|f| f.parse::<f64>()).collect();
        let Ok(numbers) = numbers else {
            error!("Skipping malformed line: '{line}'");
            continue;
        };
        let point = match numbers[..] {
            [x, y] => PointRecord::new_2d(x, y),
            [x, y, z] => PointRecord::new_3d(x, y, z),
            _ => continue,
        };
        points.insert(fields[0].to_string(), point);
    }
    Ok(points)
}

// The origin of a topocentric frame is a 3D position
fn enu_origin(point: &PointRecord) -> Option<(f64, f64, f64)> {
    point.z.map(|z| (point.x, point.y, z))
}
