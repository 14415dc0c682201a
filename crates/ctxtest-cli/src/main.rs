use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use ctxtest_core::{Executor, RunConfig, RunEvent, RunReport};
use tracing_subscriber::EnvFilter;

mod suites;

use suites::{Suite, SUITES};

fn cli() -> Command {
    Command::new("ctxtest")
        .version(ctxtest_core::VERSION)
        .about("Run hierarchical fixture-driven test suites")
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("list").about("List built-in suites"))
        .subcommand(
            Command::new("run")
                .about("Run suites and print their reports")
                .arg(
                    Arg::new("suite")
                        .num_args(0..)
                        .help("Suites to run; all of them when omitted"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output reports as JSON"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .action(ArgAction::SetTrue)
                        .help("Run tests on the thread pool"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .help("Only run tests whose path contains this text"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("TOML run configuration"),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("Print each test as it is recorded"),
                ),
        )
}

fn init_tracing(matches: &ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if matches.get_flag("log-json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file first, then command-line overrides
fn run_config(args: &ArgMatches) -> anyhow::Result<RunConfig> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => RunConfig::load(path).with_context(|| format!("loading config `{path}`"))?,
        None => RunConfig::default(),
    };
    if args.get_flag("parallel") {
        config = config.with_parallel(true);
    }
    if let Some(filter) = args.get_one::<String>("filter") {
        config = config.with_filter(filter.clone());
    }
    Ok(config)
}

fn selected_suites(args: &ArgMatches) -> anyhow::Result<Vec<&'static Suite>> {
    let Some(names) = args.get_many::<String>("suite") else {
        return Ok(SUITES.iter().collect());
    };
    names
        .map(|name| {
            suites::find(name)
                .ok_or_else(|| anyhow!("unknown suite `{name}`; try `ctxtest list`"))
        })
        .collect()
}

fn progress(event: &RunEvent) {
    match event {
        RunEvent::RunStarted { total } => eprintln!("running {total} tests"),
        RunEvent::TestRecorded(record) => {
            eprintln!("  {:<8} {} ({})", record.id, record.path, record.outcome.label());
        }
        _ => {}
    }
}

fn run(args: &ArgMatches) -> anyhow::Result<Vec<RunReport>> {
    let config = run_config(args)?;
    let mut executor = Executor::new(config);
    if args.get_flag("verbose") {
        executor = executor.with_observer(progress);
    }

    let mut reports = Vec::new();
    for suite in selected_suites(args)? {
        let tree = (suite.build)().with_context(|| format!("building suite `{}`", suite.name))?;
        reports.push(executor.run(&tree));
    }
    Ok(reports)
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(&matches);

    match matches.subcommand() {
        Some(("list", _)) => {
            for suite in SUITES {
                println!("{:<20} {}", suite.name, suite.about);
            }
        }
        Some(("run", args)) => {
            let reports = run(args)?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{}", report.to_text());
                }
            }
            std::process::exit(if reports.iter().all(RunReport::passed) { 0 } else { 1 });
        }
        _ => {
            println!("Use --help for usage information");
        }
    }
    Ok(())
}
