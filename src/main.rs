use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

mod args;
mod hat;

use crate::args::Args;
use crate::hat::config_reader::read_config;
use crate::hat::server::ServiceSettings;
use crate::hat::{HatResult, RuleInputs, RunOptions};

fn run_options(args: &Args) -> RunOptions {
    RunOptions {
        input: args.input.clone(),
        input_type: args.input_type.clone(),
        excel_worksheet_name: args.excel_worksheet_name.clone(),
        rules: RuleInputs {
            strategy: args.strategy.clone(),
            group_size: args.group_size,
            min_group_size: args.min_size,
            max_group_size: args.max_size,
            use_flexibility: None,
            seed: args.seed,
        },
        layout: args.layout.clone(),
        out: args.out.clone(),
        summary: args.summary.clone(),
        reference: args.reference.clone(),
    }
}

fn run_service(addr: &str, config_path: Option<&str>) -> HatResult<()> {
    let settings = match config_path {
        Some(p) => ServiceSettings::from_config(&read_config(p)?)?,
        None => ServiceSettings::default(),
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => snafu::whatever!("Cannot start the service runtime: {}", e),
    };
    runtime.block_on(hat::server::serve(addr, settings))
}

fn run(args: &Args) -> HatResult<()> {
    if let Some(addr) = &args.serve {
        return run_service(addr, args.config.as_deref());
    }
    if let Some(groups_path) = &args.groups {
        let moves = args.moves.clone().unwrap_or_default();
        hat::run_group_edit(
            groups_path,
            &moves,
            args.layout.as_deref(),
            args.out.as_deref(),
        )?;
        return Ok(());
    }
    let result = hat::run_sorting(args.config.clone(), &run_options(args))?;
    info!(
        "Formed {} groups, mean compatibility {:.4}",
        result.groups.len(),
        result.gcs_mean
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!("args: {:?}", args);

    if args.moves.is_some() && args.groups.is_none() {
        eprintln!("--move requires --groups");
        std::process::exit(2);
    }

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
