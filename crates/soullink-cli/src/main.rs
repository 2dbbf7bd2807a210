use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use soullink_cli::commands::{
    default_players, inspect_text, load_fallback, new_document, read_json, sanitize_file,
    templates_text, write_document, DEFAULT_GAME, DEFAULT_RULESET,
};
use soullink_cli::{run_simulator, SimulatorConfig};
use soullink_sync::SyncConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let file = || {
        Arg::new("file")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Tracker document (JSON)")
    };
    let fallback = || {
        Arg::new("fallback")
            .long("fallback")
            .value_parser(value_parser!(PathBuf))
            .help("Last-known-good document used to fill repaired fields")
    };
    let output = || {
        Arg::new("output")
            .long("output")
            .short('o')
            .value_parser(value_parser!(PathBuf))
            .help("Write the document here instead of stdout")
    };

    Command::new("soullink")
        .version(soullink_cli::VERSION)
        .about("Soullink tracker document tools")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Replication settings (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("templates").about("List built-in game templates and rulesets"))
        .subcommand(
            Command::new("new")
                .about("Create a fresh tracker document")
                .arg(
                    Arg::new("game")
                        .long("game")
                        .default_value(DEFAULT_GAME)
                        .help("Game template id"),
                )
                .arg(
                    Arg::new("ruleset")
                        .long("ruleset")
                        .default_value(DEFAULT_RULESET)
                        .help("Ruleset id"),
                )
                .arg(
                    Arg::new("player")
                        .long("player")
                        .action(ArgAction::Append)
                        .help("Player name (1 to 3, repeatable)"),
                )
                .arg(output()),
        )
        .subcommand(
            Command::new("sanitize")
                .about("Repair a tracker document")
                .arg(file())
                .arg(fallback())
                .arg(output()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize progress and report document problems")
                .arg(file())
                .arg(fallback()),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the multi-client replication simulator")
                .arg(
                    Arg::new("clients")
                        .long("clients")
                        .default_value("2")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent clients"),
                )
                .arg(
                    Arg::new("edits")
                        .long("edits")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Number of random edits across all clients"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("fail-writes")
                        .long("fail-writes")
                        .default_value("0")
                        .value_parser(value_parser!(usize))
                        .help("Remote writes to fail before the first success"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn sync_config(matches: &ArgMatches) -> Result<SyncConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(SyncConfig::new()),
    }
}

fn required_file(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("file").context("missing document file")
}

async fn run(matches: ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("templates", _)) => print!("{}", templates_text()),
        Some(("new", args)) => {
            let game = args.get_one::<String>("game").map_or(DEFAULT_GAME, String::as_str);
            let ruleset = args
                .get_one::<String>("ruleset")
                .map_or(DEFAULT_RULESET, String::as_str);
            let players: Vec<String> = args
                .get_many::<String>("player")
                .map(|names| names.cloned().collect())
                .unwrap_or_else(|| default_players(2));

            let now = chrono::Utc::now().timestamp_millis();
            let doc = new_document(game, players, ruleset, now)?;
            write_document(&doc, args.get_one::<PathBuf>("output").map(PathBuf::as_path))?;
        }
        Some(("sanitize", args)) => {
            let fallback = load_fallback(args.get_one::<PathBuf>("fallback").map(PathBuf::as_path))?;
            let (doc, report) = sanitize_file(required_file(args)?, &fallback)?;
            write_document(&doc, args.get_one::<PathBuf>("output").map(PathBuf::as_path))?;
            eprintln!("{} field(s) repaired", report.repair_count());
        }
        Some(("inspect", args)) => {
            let fallback = load_fallback(args.get_one::<PathBuf>("fallback").map(PathBuf::as_path))?;
            let raw = read_json(required_file(args)?)?;
            print!("{}", inspect_text(&raw, &fallback));
        }
        Some(("simulate", args)) => {
            let defaults = SimulatorConfig::default();
            let config = SimulatorConfig {
                clients: args.get_one::<usize>("clients").copied().unwrap_or(defaults.clients),
                edits: args.get_one::<u64>("edits").copied().unwrap_or(defaults.edits),
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                fail_writes: args
                    .get_one::<usize>("fail-writes")
                    .copied()
                    .unwrap_or(defaults.fail_writes),
                settle_timeout: Duration::from_secs(10),
            };
            info!(clients = config.clients, edits = config.edits, seed = config.seed, "running simulator");

            let report = run_simulator(config, sync_config(&matches)?).await?;
            println!("{}", report.generate_text());
            return Ok(report.passed());
        }
        _ => {}
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let passed = run(matches).await?;
    std::process::exit(if passed { 0 } else { 1 });
}
