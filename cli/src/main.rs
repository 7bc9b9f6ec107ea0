mod scenario;

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;
use zkzru_config::RollupConfig;
use zkzru_crypto::field_to_decimal;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = &args[1];

    match cmd.as_str() {
        "run" => {
            if let Err(e) = run(&args[2..]) {
                eprintln!("❌ Error running scenario: {:#}", e);
                std::process::exit(1);
            }
        }
        "config" => match args.get(2).map(|s| s.as_str()) {
            Some("show") => match RollupConfig::load() {
                Ok(config) => println!("{:#?}", config),
                Err(e) => {
                    eprintln!("❌ Error loading config: {:#}", e);
                    std::process::exit(1);
                }
            },
            _ => match RollupConfig::generate_sample() {
                Ok(sample) => print!("{}", sample),
                Err(e) => {
                    eprintln!("❌ Error rendering sample config: {:#}", e);
                    std::process::exit(1);
                }
            },
        },
        "help" | "--help" | "-h" => {
            print_usage();
        }
        _ => {
            println!("❌ Unknown command: {}", cmd);
            println!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("zkzru - zk-rollup state transition and witness generator");
    println!();
    println!("USAGE:");
    println!("  zkzru <command> [args]");
    println!();
    println!("COMMANDS:");
    println!("  run [options]              Deposit, apply one batch, write the circuit input");
    println!("  config                     Print a sample config.toml");
    println!("  config show                Print the effective configuration");
    println!("  help                       Show this help message");
    println!();
    println!("RUN OPTIONS:");
    println!("  --config <path>            Load configuration from <path>");
    println!("  --confidential             Use Pedersen-committed balances");
    println!("  --output <path>            Witness file (default: input.json)");
    println!("  --pretty                   Pretty-print the witness JSON");
    println!();
    println!("EXAMPLES:");
    println!("  zkzru run                              # Plain batch to ./input.json");
    println!("  zkzru run --confidential --pretty      # Confidential batch");
    println!("  zkzru config > config.toml             # Start a config file");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  ZKZRU_CONFIG         Config file path");
    println!("  ZKZRU_BALANCE_DEPTH  Balance tree depth");
    println!("  ZKZRU_TX_DEPTH       Transaction tree depth");
    println!("  ZKZRU_OUTPUT         Witness file path");
    println!("  ZKZRU_CONFIDENTIAL   Use confidential balances (1/true)");
    println!("  RUST_LOG             Log level (debug/info/warn/error)");
}

/// Command-line overrides for `run`, applied on top of the loaded config.
#[derive(Debug, Default)]
struct RunArgs {
    config_path: Option<PathBuf>,
    confidential: bool,
    pretty: bool,
    output: Option<String>,
}

fn parse_run_args(args: &[String]) -> RunArgs {
    let mut parsed = RunArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(path) = args.get(i + 1) {
                    parsed.config_path = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--output" | "-o" => {
                if let Some(path) = args.get(i + 1) {
                    parsed.output = Some(path.clone());
                    i += 1;
                }
            }
            "--confidential" => {
                parsed.confidential = true;
            }
            "--pretty" => {
                parsed.pretty = true;
            }
            other => {
                log::warn!("Ignoring unknown option {}", other);
            }
        }
        i += 1;
    }

    parsed
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let args = parse_run_args(args);

    let mut config = match &args.config_path {
        Some(path) => RollupConfig::load_from(path)?,
        None => RollupConfig::load()?,
    };
    if args.confidential {
        config.witness.confidential = true;
    }
    if args.pretty {
        config.witness.pretty = true;
    }
    if let Some(output) = args.output {
        config.witness.output_path = output;
    }

    let mode = if config.witness.confidential {
        "confidential"
    } else {
        "plain"
    };
    println!(
        "🌳 Balance tree depth {}, tx tree depth {}, {} balances",
        config.tree.balance_depth, config.tree.tx_depth, mode
    );

    let report = scenario::run(&config, &mut rand::thread_rng())?;
    let transition = &report.transition;

    println!("📥 Deposit root:  {}", field_to_decimal(&report.deposit_root));
    println!("🧾 Tx root:       {}", field_to_decimal(&transition.tx_root));
    println!("✅ Final root:    {}", field_to_decimal(&transition.final_root));

    let json = if config.witness.pretty {
        report.input.to_json_pretty()?
    } else {
        report.input.to_json()?
    };
    write_witness(Path::new(&config.witness.output_path), &json)?;

    println!(
        "💾 Wrote circuit input for {} transactions to {}",
        transition.txs.len(),
        config.witness.output_path
    );
    Ok(())
}

fn write_witness(path: &Path, json: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
