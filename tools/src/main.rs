//! bag-runner: headless runner for the optimal bagging analysis.
//!
//! Usage:
//!   bag-runner analyze --data-dir ./data --type Volume --region BLR
//!   bag-runner query --data-dir ./data --schema seven_level --org-region BLR --type volume
//!   bag-runner query --data-dir ./data --org-region BLR --options-for org_branch
//!   bag-runner synthetic --seed 12345 --json

use anyhow::{Context, Result};
use bagging_core::{
    config::AnalysisConfig,
    directory::BranchDirectory,
    ingest,
    pipeline::{run_analysis, AnalysisParams, AnalysisReport},
    query::{branch_options, filter_and_sum, level_values, Level, MatrixFilter},
    schema::{ColLevel, RowLevel, SchemaVariant},
    synthetic::{generate_dataset, SyntheticSpec},
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bag-runner")]
#[command(about = "Optimal bagging analysis over branch flow tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config/analysis.json and the input files
    #[arg(long, global = true, default_value = "./data")]
    data_dir: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Threshold bagging, optimal branches and flow decomposition
    Analyze {
        /// Wide absolute-value CSV (defaults to the configured file)
        #[arg(long)]
        absolute: Option<PathBuf>,

        /// Wide percentage CSV (defaults to the configured file)
        #[arg(long)]
        percentage: Option<PathBuf>,

        /// Destination mapping JSON (defaults to the configured file)
        #[arg(long)]
        destinations: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Filtered sum over the hierarchical origin x destination matrix
    Query(QueryArgs),

    /// Run the analysis on deterministic generated data
    Synthetic {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 4)]
        regions: usize,

        #[arg(long, default_value_t = 6)]
        branches: usize,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Type to decompose (e.g. "Volume", "Billed Wt")
    #[arg(long = "type")]
    type_: Option<String>,

    /// Restrict the service type summary to one region
    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    volume_threshold: Option<f64>,

    #[arg(long)]
    weight_threshold: Option<f64>,

    /// Print the full report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Write the JSON report to a file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct QueryArgs {
    /// Matrix CSV (defaults to the configured file)
    #[arg(long)]
    matrix: Option<PathBuf>,

    /// five_level, seven_level or product_mode (defaults to the configured schema)
    #[arg(long)]
    schema: Option<SchemaVariant>,

    #[arg(long)]
    org_zone: Option<String>,
    #[arg(long)]
    org_region: Option<String>,
    #[arg(long)]
    org_city: Option<String>,
    #[arg(long)]
    org_branch: Option<String>,
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    org_product: Option<String>,
    #[arg(long = "type")]
    type_: Option<String>,
    #[arg(long)]
    des_zone: Option<String>,
    #[arg(long)]
    des_region: Option<String>,
    #[arg(long)]
    des_city: Option<String>,
    #[arg(long)]
    des_branch: Option<String>,

    /// List the values of one level under the given filters instead of summing.
    /// org_branch and des_branch list "code - name" pairs.
    #[arg(long)]
    options_for: Option<String>,
}

#[derive(Serialize)]
struct ReportEnvelope<'a> {
    generated_at: String,
    source: String,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            absolute,
            percentage,
            destinations,
            run,
        } => {
            let config = AnalysisConfig::load_or_default(&cli.data_dir)?;
            let resolve = |given: Option<PathBuf>, file: &str| {
                given.unwrap_or_else(|| PathBuf::from(config.path(&cli.data_dir, file)))
            };
            let absolute = resolve(absolute, &config.files.absolute);
            let percentage = resolve(percentage, &config.files.percentage);
            let destinations = resolve(destinations, &config.files.destinations);

            let dataset = ingest::load_flow_dataset(&absolute, &percentage)
                .with_context(|| format!("loading {} / {}", absolute.display(), percentage.display()))?;
            let directory = ingest::load_directory(&destinations)
                .with_context(|| format!("loading {}", destinations.display()))?;

            let params = run.params(&config);
            let report = run_analysis(&dataset, &directory, &params)?;
            emit(&run, &report, &directory, absolute.display().to_string())
        }
        Commands::Query(args) => run_query(&cli.data_dir, args),
        Commands::Synthetic {
            seed,
            regions,
            branches,
            run,
        } => {
            let config = AnalysisConfig::load_or_default(&cli.data_dir)?;
            let spec = SyntheticSpec {
                regions,
                branches_per_region: branches,
                ..SyntheticSpec::default()
            };
            let data = generate_dataset(seed, &spec)?;
            let mut params = run.params(&config);
            params.region_map = data.region_map.clone();
            let report = run_analysis(&data.dataset, &data.directory, &params)?;
            emit(&run, &report, &data.directory, format!("synthetic seed={seed}"))
        }
    }
}

impl RunArgs {
    fn params(&self, config: &AnalysisConfig) -> AnalysisParams {
        let mut params = AnalysisParams::from_config(config).with_region(self.region.clone());
        if let Some(t) = &self.type_ {
            params.selected_type = t.clone();
        }
        if let Some(t) = self.volume_threshold {
            params.thresholds.set(bagging_core::config::VOLUME_TYPE, t);
        }
        if let Some(t) = self.weight_threshold {
            params.thresholds.set(bagging_core::config::BILLED_WEIGHT_TYPE, t);
        }
        params
    }
}

fn emit(run: &RunArgs, report: &AnalysisReport, directory: &BranchDirectory, source: String) -> Result<()> {
    let envelope = ReportEnvelope {
        generated_at: chrono::Utc::now().to_rfc3339(),
        source,
        report,
    };
    if let Some(out) = &run.out {
        write_json(out, &envelope)?;
        log::info!("report written to {}", out.display());
    }
    if run.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_report(report, directory);
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

fn print_report(report: &AnalysisReport, directory: &BranchDirectory) {
    let type_ = &report.selected_type;
    let in_scope = |region: &str| report.region.as_deref().map_or(true, |r| r == region);

    println!("=== ALL INDIA SUMMARY ({type_}) ===");
    let s = &report.all_india;
    println!("  total units:              {:>14.2}", s.total_units);
    println!("  units through optimal:    {:>14.2}", s.optimal_units);
    println!("  % through optimal:        {:>13.2}%", s.optimal_pct);
    println!("  units not through optimal:{:>14.2}", s.non_optimal_units);
    println!("  % not through optimal:    {:>13.2}%", s.non_optimal_pct);

    println!();
    println!("=== SORTING LOCATION REQUIREMENT ===");
    for row in report.region_coverage.iter().filter(|r| in_scope(r.requirement.region.as_str())) {
        let req = &row.requirement;
        println!(
            "  {:<6} optimal={:>4} self={:>4} needed={:>5} | units={:>12.2} optimal={:>6.2}%",
            req.region,
            req.sorting_locations_for_optimal,
            req.self_branches.map_or("-".into(), |v| v.to_string()),
            req.sorting_location_needed.map_or("-".into(), |v| v.to_string()),
            row.coverage.total_units,
            row.coverage.optimal_pct,
        );
    }

    println!();
    println!("=== SERVICE TYPE SUMMARY ===");
    for row in &report.service_types {
        println!(
            "  {:<6} {:<12} units={:>10.0} threshold={:>3} ({:>6.2}%) optimal={:>3} ({:>6.2}%)",
            row.key.region,
            row.key.service_type,
            row.total_units,
            row.threshold_branches,
            row.pct_through_threshold,
            row.optimal_branches,
            row.pct_through_optimal,
        );
    }

    println!();
    println!("=== OPTIMAL BRANCHES ===");
    for set in report
        .optimal_sets
        .iter()
        .filter(|s| &s.key.type_ == type_ && in_scope(s.key.region.as_str()))
    {
        println!(
            "  {:<6} {:<12} n={:>3} cum={:>6.2}% {}",
            set.key.region,
            set.key.service_type,
            set.optimal_num_branches,
            set.optimal_cumulative_percentage,
            directory.labels(&set.branches),
        );
    }

    println!();
    println!("=== RECEIVING SIDE ===");
    let recv = &report.decomposition.receiving;
    for (i, region) in recv.regions.iter().enumerate() {
        println!(
            "  {:<6} total={:>12.2} optimal={:>6.2}% non-optimal={:>6.2}%",
            region, recv.total[i], recv.optimal_pct[i], recv.non_optimal_pct[i]
        );
    }
    let flow = &report.decomposition.all_india;
    println!(
        "  ALL    total={:>12.2} optimal={:>6.2}% non-optimal={:>6.2}%",
        flow.total, flow.optimal_pct, flow.non_optimal_pct
    );
}

fn parse_level(name: &str) -> Result<Level> {
    if let Some(l) = RowLevel::ALL.iter().find(|l| l.name() == name) {
        return Ok(Level::Origin(*l));
    }
    if let Some(l) = ColLevel::ALL.iter().find(|l| l.name() == name) {
        return Ok(Level::Destination(*l));
    }
    anyhow::bail!("unknown level '{name}'")
}

fn run_query(data_dir: &str, args: QueryArgs) -> Result<()> {
    let config = AnalysisConfig::load_or_default(data_dir)?;
    let mut matrix_config = config.matrix.clone();
    if let Some(variant) = args.schema {
        matrix_config.schema = variant;
    }
    let path = args
        .matrix
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.path(data_dir, &config.files.matrix)));
    let matrix = ingest::load_matrix(&path, matrix_config.schema())
        .with_context(|| format!("loading {}", path.display()))?;

    let filter = MatrixFilter::from_optional(
        [
            (RowLevel::OrgZone, args.org_zone.as_deref()),
            (RowLevel::OrgRegion, args.org_region.as_deref()),
            (RowLevel::OrgCity, args.org_city.as_deref()),
            (RowLevel::OrgBranch, args.org_branch.as_deref()),
            (RowLevel::Mode, args.mode.as_deref()),
            (RowLevel::OrgProduct, args.org_product.as_deref()),
        ],
        [
            (ColLevel::Type, args.type_.as_deref()),
            (ColLevel::DesZone, args.des_zone.as_deref()),
            (ColLevel::DesRegion, args.des_region.as_deref()),
            (ColLevel::DesCity, args.des_city.as_deref()),
            (ColLevel::DesBranch, args.des_branch.as_deref()),
        ],
    );

    if let Some(name) = &args.options_for {
        match parse_level(name)? {
            level @ (Level::Origin(RowLevel::OrgBranch) | Level::Destination(ColLevel::DesBranch)) => {
                let origin_side = matches!(level, Level::Origin(_));
                for (code, branch_name) in branch_options(&matrix, origin_side, &filter)? {
                    println!("{code} - {branch_name}");
                }
            }
            level => {
                for value in level_values(&matrix, level, &filter)? {
                    println!("{value}");
                }
            }
        }
        return Ok(());
    }

    let sum = filter_and_sum(&filter, &matrix)?;
    println!("Sum of filtered values: {sum}");
    Ok(())
}
