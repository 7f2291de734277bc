//! Cycler simulator entry point: CLI wiring and scenario-driven batch run.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use cycler_sim::config::{RecipeConfig, ScenarioConfig, StepConfig};
use cycler_sim::io::export::{export_profile_csv, export_timelines_csv};
use cycler_sim::io::recipe_csv::import_recipe_csv;
use cycler_sim::sim::{TimelineSummary, simulate_all};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    recipe_csv: Option<String>,
    repetitions: Option<usize>,
    timeline_out: Option<String>,
    profile_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("cycler-sim - Power and energy simulator for battery cycler test recipes");
    eprintln!();
    eprintln!("Usage: cycler-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --recipe-csv <path>      Replace the scenario recipes with one imported sheet");
    eprintln!("  --repetitions <n>        Override the repetition count of every recipe");
    eprintln!("  --timeline-out <path>    Export step results to CSV");
    eprintln!("  --profile-out <path>     Export the combined power profile to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following a flag, or exits with an error.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        recipe_csv: None,
        repetitions: None,
        timeline_out: None,
        profile_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "a path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "a name"));
            }
            "--recipe-csv" => {
                i += 1;
                cli.recipe_csv = Some(flag_value(&args, i, "--recipe-csv", "a path"));
            }
            "--repetitions" => {
                i += 1;
                let raw = flag_value(&args, i, "--repetitions", "a count");
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => cli.repetitions = Some(n),
                    _ => {
                        eprintln!("error: --repetitions value \"{raw}\" is not a positive integer");
                        process::exit(1);
                    }
                }
            }
            "--timeline-out" => {
                i += 1;
                cli.timeline_out = Some(flag_value(&args, i, "--timeline-out", "a path"));
            }
            "--profile-out" => {
                i += 1;
                cli.profile_out = Some(flag_value(&args, i, "--profile-out", "a path"));
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "a u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive");
        process::exit(1);
    }

    cli
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(ref path) = cli.recipe_csv {
        let path = Path::new(path);
        let steps = match import_recipe_csv(path) {
            Ok(steps) => steps,
            Err(e) => {
                eprintln!("error: {}: {e}", path.display());
                process::exit(1);
            }
        };
        let name = path
            .file_stem()
            .map_or_else(|| "imported".to_string(), |s| s.to_string_lossy().into_owned());
        scenario.recipes = vec![RecipeConfig {
            name,
            repetitions: 1,
            equipment: None,
            steps: steps.iter().map(StepConfig::from).collect(),
        }];
    }

    if let Some(n) = cli.repetitions {
        for recipe in &mut scenario.recipes {
            recipe.repetitions = n;
        }
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let runs = scenario.recipe_runs();
    let model = scenario.efficiency_model();
    tracing::info!(recipes = runs.len(), strategy = %model.strategy(), "simulating");
    let batch = simulate_all(&runs, model);

    // Print first-cycle table and totals per recipe
    for (run, timeline) in runs.iter().zip(&batch.timelines) {
        println!("== {} ({} cycle(s)) ==", run.name, timeline.cycle_count());
        for r in timeline.first_cycle() {
            println!("{r}");
        }
        println!("\n{}", TimelineSummary::from_timeline(timeline));
    }

    let peak_after = scenario.simulation.peak_after_hours;
    println!("{}", batch.profile.summary(peak_after));

    // Export CSV if requested
    if let Some(ref path) = cli.timeline_out {
        let named: Vec<(&str, _)> = runs
            .iter()
            .map(|r| r.name.as_str())
            .zip(&batch.timelines)
            .collect();
        if let Err(e) = export_timelines_csv(&named, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Timeline written to {path}");
    }
    if let Some(ref path) = cli.profile_out {
        if let Err(e) = export_profile_csv(batch.profile.points(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Profile written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(cycler_sim::api::AppState::new(&runs, batch, peak_after));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(cycler_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
