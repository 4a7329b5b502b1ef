//! Load generator entry point: CLI wiring and config-driven pipeline runs.

use std::path::{Path, PathBuf};
use std::process;

use indload_gen::config::RunConfig;
use indload_gen::data::TemplateStore;
use indload_gen::io::{export_allocation_csv, export_day_profiles_csv, export_profile_csv};
use indload_gen::pipeline::{Calendar, ProfileSummary};
use indload_gen::regional::{
    AbsentPolicy, AllocationTable, SplitBasis, load_allocation, region_profile, resolve_factor,
    scale_to_region,
};
use indload_gen::{LoadGenError, PipelineRequest, run_pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
#[derive(Default)]
struct CliArgs {
    config_path: Option<String>,
    industry: Option<u32>,
    year: Option<i32>,
    seed: Option<u64>,
    region: Option<String>,
    split_by: Option<SplitBasis>,
    absent_as_zero: bool,
    region_total: bool,
    out: Option<String>,
    regional_out: Option<String>,
    allocation_out: Option<String>,
    day_profiles_out: Option<String>,
    list_industries: bool,
}

fn print_help() {
    eprintln!("indload-gen: synthetic industrial electricity load profiles");
    eprintln!();
    eprintln!("Usage: indload-gen [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>            Load run configuration from TOML file");
    eprintln!("  --industry <u32>           Industry number from the sector table");
    eprintln!("  --year <i32>               Target year (default: 2019)");
    eprintln!("  --seed <u64>               Override fluctuation seed");
    eprintln!("  --region <id>              Disaggregate to this region");
    eprintln!("  --split-by <basis>         n_cap (employees, default) or n_sites");
    eprintln!("  --absent-as-zero           Treat missing regional allocations as zero");
    eprintln!("  --region-total             Sum all industry types of the region");
    eprintln!("  --out <path>               Export the national profile to CSV");
    eprintln!("  --regional-out <path>      Export the regional profile to CSV");
    eprintln!("  --allocation-out <path>    Export the reclassified allocation table");
    eprintln!("  --day-profiles-out <path>  Export the adjusted day profiles to CSV");
    eprintln!("  --list-industries          Print the sector table and exit");
    eprintln!("  --help                     Show this help message");
}

fn value<'a>(args: &'a [String], i: &mut usize, flag: &str, what: &str) -> &'a str {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires {what}");
        process::exit(1);
    }
    &args[*i]
}

fn parsed<T: std::str::FromStr>(raw: &str, flag: &str, what: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{raw}\" is not a valid {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                cli.config_path = Some(value(&args, &mut i, "--config", "a path argument").into());
            }
            "--industry" => {
                let raw = value(&args, &mut i, "--industry", "a u32 argument");
                cli.industry = Some(parsed(raw, "--industry", "u32"));
            }
            "--year" => {
                let raw = value(&args, &mut i, "--year", "an i32 argument");
                cli.year = Some(parsed(raw, "--year", "i32"));
            }
            "--seed" => {
                let raw = value(&args, &mut i, "--seed", "a u64 argument");
                cli.seed = Some(parsed(raw, "--seed", "u64"));
            }
            "--region" => {
                cli.region = Some(value(&args, &mut i, "--region", "a region id").into());
            }
            "--split-by" => {
                let raw = value(&args, &mut i, "--split-by", "n_cap or n_sites");
                cli.split_by = Some(parsed(raw, "--split-by", "split basis"));
            }
            "--absent-as-zero" => cli.absent_as_zero = true,
            "--region-total" => cli.region_total = true,
            "--out" => {
                cli.out = Some(value(&args, &mut i, "--out", "a path argument").into());
            }
            "--regional-out" => {
                cli.regional_out =
                    Some(value(&args, &mut i, "--regional-out", "a path argument").into());
            }
            "--allocation-out" => {
                cli.allocation_out =
                    Some(value(&args, &mut i, "--allocation-out", "a path argument").into());
            }
            "--day-profiles-out" => {
                cli.day_profiles_out =
                    Some(value(&args, &mut i, "--day-profiles-out", "a path argument").into());
            }
            "--list-industries" => cli.list_industries = true,
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Applies CLI flags on top of the file configuration.
fn apply_overrides(cfg: &mut RunConfig, cli: &CliArgs) {
    if cli.industry.is_some() {
        cfg.run.industry = cli.industry;
    }
    if let Some(year) = cli.year {
        cfg.run.year = year;
    }
    if let Some(seed) = cli.seed {
        cfg.fluctuation.seed = seed;
    }
    if cli.region.is_some() {
        cfg.regional.region.clone_from(&cli.region);
    }
    if let Some(basis) = cli.split_by {
        cfg.regional.split_by = basis;
    }
    if cli.absent_as_zero {
        cfg.regional.absent = AbsentPolicy::Zero;
    }
    if cli.region_total {
        cfg.regional.region_total = true;
    }
    let paths = [
        (&cli.out, &mut cfg.output.profile),
        (&cli.regional_out, &mut cfg.output.regional),
        (&cli.allocation_out, &mut cfg.output.allocation),
        (&cli.day_profiles_out, &mut cfg.output.day_profiles),
    ];
    for (flag, slot) in paths {
        if let Some(p) = flag {
            *slot = Some(PathBuf::from(p));
        }
    }
}

fn list_industries(store: &TemplateStore) {
    println!(
        "{:>4}  {:<8}  {:>14}  {:>5}  name",
        "no", "wz", "consumption", "fluct"
    );
    for s in store.sectors().iter() {
        println!(
            "{:>4}  {:<8}  {:>10.0} MWh  {:>4}%  {}",
            s.industry_number, s.wz_id, s.annual_consumption_mwh, s.fluctuation, s.name
        );
    }
}

fn load_regional(cfg: &RunConfig) -> Result<Option<AllocationTable>, LoadGenError> {
    match (&cfg.regional.site_counts, &cfg.regional.shares) {
        (Some(sites), Some(shares)) => load_allocation(sites, shares).map(Some),
        _ => Ok(None),
    }
}

fn export(
    label: &str,
    path: Option<&Path>,
    write: impl FnOnce(&Path) -> Result<(), LoadGenError>,
) -> Result<(), LoadGenError> {
    if let Some(path) = path {
        write(path)?;
        eprintln!("{label} written to {}", path.display());
    }
    Ok(())
}

fn run(cfg: &RunConfig, list_only: bool) -> Result<(), LoadGenError> {
    let store = TemplateStore::load(&cfg.data_source()?)?;
    if list_only {
        list_industries(&store);
        return Ok(());
    }

    let holidays = cfg.holiday_calendar();
    let allocation = load_regional(cfg)?;
    if let Some(table) = &allocation {
        export("Allocation table", cfg.output.allocation.as_deref(), |p| {
            export_allocation_csv(table, p)
        })?;
    }

    let regional = &cfg.regional;
    if regional.region_total {
        let (Some(table), Some(region)) = (&allocation, &regional.region) else {
            return Err(LoadGenError::Validation(
                "--region-total needs a region and allocation tables".into(),
            ));
        };
        let template = PipelineRequest {
            fluctuation: cfg.fluctuation_settings(),
            ..PipelineRequest::new(0, cfg.run.year)
        };
        let total = region_profile(
            &store,
            &holidays,
            table,
            region,
            regional.split_by,
            &template,
        )?;
        let calendar = Calendar::new(cfg.run.year, &holidays)?;
        for c in &total.contributions {
            println!(
                "industry {:>3}: factor {:.6}, {:.2} MWh",
                c.industry_type, c.factor, c.energy_mwh
            );
        }
        println!("\nRegion {region}");
        let summary = ProfileSummary::from_profile(&total.profile, &calendar);
        println!("{summary}");
        return export("Regional profile", cfg.output.regional.as_deref(), |p| {
            export_profile_csv(&total.profile, p)
        });
    }

    let request = cfg.request()?;
    let output = run_pipeline(&store, &holidays, &request)?;
    println!(
        "Industry {} ({}), {}",
        output.parameters.industry_number, output.parameters.name, request.year
    );
    let summary = ProfileSummary::from_profile(&output.profile, &output.calendar);
    println!("{summary}");

    export("Profile", cfg.output.profile.as_deref(), |p| {
        export_profile_csv(&output.profile, p)
    })?;
    export("Day profiles", cfg.output.day_profiles.as_deref(), |p| {
        export_day_profiles_csv(&output.adjusted, p)
    })?;

    if let (Some(table), Some(region)) = (&allocation, &regional.region) {
        let factor = resolve_factor(
            table,
            request.industry_number,
            region,
            regional.split_by,
            regional.absent,
        )?;
        let share = scale_to_region(&output.profile, factor);
        info!(region = %region, factor, "profile disaggregated");
        let basis = regional.split_by;
        println!("\nRegion {region} (factor {factor:.6} by {basis})");
        println!("{}", ProfileSummary::from_profile(&share, &output.calendar));
        export("Regional profile", cfg.output.regional.as_deref(), |p| {
            export_profile_csv(&share, p)
        })?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    let mut cfg = if let Some(ref path) = cli.config_path {
        match RunConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        RunConfig::default()
    };
    apply_overrides(&mut cfg, &cli);

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = run(&cfg, cli.list_industries) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
