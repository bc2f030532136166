//! vault-engine CLI
//!
//! Run vault scenarios and conversion checks from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Execute a JSON scenario against a fresh vault
//! vault-engine run --input scenario.json
//!
//! # Output as JSON
//! vault-engine run --input scenario.json --format json
//!
//! # Simulate a donation attack, with and without defenses
//! vault-engine attack --victims 4
//! vault-engine attack --locked 1000 --offset 3
//!
//! # Convert amounts against an arbitrary pool
//! vault-engine convert --amount 10 --total-assets 14 --total-supply 9
//! ```

use serde::Serialize;
use std::fs;
use std::process;
use vault_engine::core::error::VaultError;
use vault_engine::simulation::inflation_attack::{run_inflation_attack, AttackConfig};
use vault_engine::simulation::scenario::{run_scenario, Scenario};
use vault_engine::vault::conversion::{PoolSnapshot, Rounding};

fn print_usage() {
    eprintln!(
        r#"vault-engine — tokenized vault accounting with two-phase settlement

USAGE:
    vault-engine <COMMAND> [OPTIONS]

COMMANDS:
    run         Execute a JSON scenario against a fresh vault
    attack      Simulate a first-depositor inflation attack
    convert     Convert an amount against a given pool state
    help        Show this message

OPTIONS (run):
    --input <FILE>      Path to JSON scenario file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (attack):
    --offset <N>        Virtual-liquidity decimals offset (default: 0)
    --locked <N>        Locked initial deposit (default: 0)
    --scale <N>         Asset base unit; donation is 1000*scale+1 (default: 1000000)
    --victims <N>       Number of victim deposits (default: 4)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (convert):
    --amount <N>        Amount to convert (required)
    --total-assets <N>  Pool total assets (required)
    --total-supply <N>  Pool total supply (required)
    --offset <N>        Decimals offset (default: 0)
    --format <FORMAT>   Output format: text (default) or json

Set RUST_LOG=debug to trace operation phases.

EXAMPLES:
    vault-engine run --input demos/scenarios/yield.json
    vault-engine attack --locked 1000 --format json
    vault-engine convert --amount 10 --total-assets 14 --total-supply 9"#
    );
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    process::exit(1);
}

fn value_of(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, what);
        process::exit(1);
    })
}

fn number_of<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    args.get(i)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            eprintln!("{} requires a number", flag);
            process::exit(1);
        })
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn cmd_run(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(value_of(args, i, "--input", "a file path"));
            }
            "--format" => {
                i += 1;
                format = value_of(args, i, "--format", "'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let content = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    let scenario = Scenario::from_json(&content).unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "config": {{ "pool": "pool", "asset": "USDC", "decimals_offset": 3 }},
  "mints": [ {{ "account": {{ "owner": "alice", "domain": "disclosed" }}, "amount": 100 }} ],
  "steps": [
    {{ "deposit": {{ "caller": "alice",
                  "from": {{ "owner": "alice", "domain": "disclosed" }},
                  "to": {{ "owner": "alice", "domain": "disclosed" }},
                  "amount": 100 }} }}
  ]
}}"#
        );
        process::exit(1);
    });

    let report = run_scenario(&scenario).unwrap_or_else(|e| fail(e));
    if format == "json" {
        print_json(&report);
    } else {
        println!("{}", report);
    }
}

fn cmd_attack(args: &[String]) {
    let mut config = AttackConfig::default();
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--offset" => {
                i += 1;
                config.decimals_offset = number_of(args, i, "--offset");
            }
            "--locked" => {
                i += 1;
                config.locked_deposit = number_of(args, i, "--locked");
            }
            "--scale" => {
                i += 1;
                config.scale = number_of(args, i, "--scale");
            }
            "--victims" => {
                i += 1;
                config.victims = number_of(args, i, "--victims");
            }
            "--format" => {
                i += 1;
                format = value_of(args, i, "--format", "'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let outcome = run_inflation_attack(&config).unwrap_or_else(|e| fail(e));
    if format == "json" {
        print_json(&outcome);
    } else {
        println!("{}", outcome);
    }
}

#[derive(Serialize)]
struct ConversionOutput {
    shares_down: u128,
    shares_up: u128,
    assets_down: u128,
    assets_up: u128,
}

fn convert(amount: u128, pool: &PoolSnapshot) -> Result<ConversionOutput, VaultError> {
    Ok(ConversionOutput {
        shares_down: pool.shares_for(amount, Rounding::Down)?,
        shares_up: pool.shares_for(amount, Rounding::Up)?,
        assets_down: pool.assets_for(amount, Rounding::Down)?,
        assets_up: pool.assets_for(amount, Rounding::Up)?,
    })
}

fn cmd_convert(args: &[String]) {
    let mut amount = None;
    let mut total_assets = None;
    let mut total_supply = None;
    let mut offset = 0u8;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--amount" => {
                i += 1;
                amount = Some(number_of(args, i, "--amount"));
            }
            "--total-assets" => {
                i += 1;
                total_assets = Some(number_of(args, i, "--total-assets"));
            }
            "--total-supply" => {
                i += 1;
                total_supply = Some(number_of(args, i, "--total-supply"));
            }
            "--offset" => {
                i += 1;
                offset = number_of(args, i, "--offset");
            }
            "--format" => {
                i += 1;
                format = value_of(args, i, "--format", "'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (amount, total_assets, total_supply) = match (amount, total_assets, total_supply) {
        (Some(a), Some(t), Some(s)) => (a, t, s),
        _ => {
            eprintln!("Error: --amount, --total-assets and --total-supply are required");
            process::exit(1);
        }
    };

    let pool = PoolSnapshot::new(total_assets, total_supply, offset);
    let out = convert(amount, &pool).unwrap_or_else(|e| fail(e));
    if format == "json" {
        print_json(&out);
        return;
    }
    println!("{}", pool);
    println!();
    println!("{} assets -> {} shares (down) / {} shares (up)", amount, out.shares_down, out.shares_up);
    println!("{} shares -> {} assets (down) / {} assets (up)", amount, out.assets_down, out.assets_up);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "attack" => cmd_attack(rest),
        "convert" => cmd_convert(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
