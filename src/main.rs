//! Wordlist Combinator - hashcat-driven wordlist generation
//!
//! Main entry point for the command-line application.

use clap::Parser;
use colored::*;
use std::process;

use wordlist_combinator::cli::Args;
use wordlist_combinator::progress::{
    print_banner, print_bullet, print_error, print_header, print_info,
};
use wordlist_combinator::{Combinator, CombinatorConfig, WorkflowRegistry};

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    // Configure thread pool
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let registry = WorkflowRegistry::builtin();

    if args.list {
        print_workflows(&registry);
        return Ok(());
    }

    let name = args.workflow.as_deref().unwrap_or_default();
    let Some(workflow) = registry.get(name) else {
        anyhow::bail!(
            "Unknown workflow `{}` (available: {})",
            name,
            registry.names().join(", ")
        );
    };

    if !args.quiet {
        print_banner();
    }

    let config = CombinatorConfig::from_args(&args)?;
    if args.debug {
        print_config(&args, &config);
    }

    let combinator = Combinator::new(config)?;
    combinator.run(workflow)?;

    if !args.quiet {
        combinator.stats().print_summary();
    }
    Ok(())
}

fn print_workflows(registry: &WorkflowRegistry) {
    print_header("Workflows");
    for workflow in registry.iter() {
        print_bullet(&format!(
            "{}  {}",
            workflow.name().bold(),
            workflow.description().dimmed()
        ));
    }
}

/// Print configuration summary
fn print_config(args: &Args, config: &CombinatorConfig) {
    print_header("Configuration");

    print_info(&format!("Base dir:     {:?}", config.base_dir));
    print_info(&format!("Temp dir:     {:?}", config.temp_dir));
    print_info(&format!("Output dir:   {:?}", config.output_dir));
    print_info(&format!("Min length:   {}", config.min_length));
    print_info(&format!("Sort cores:   {}", config.cores));
    print_info(&format!("Sort memory:  {}", config.memory));
    print_info(&format!("Locale:       {}", config.locale));
    print_info(&format!("Threads:      {}", args.threads.unwrap_or_else(num_cpus::get)));
}
