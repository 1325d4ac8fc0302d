//! Launch argument validation tool
//!
//! Reports what wakeguard would do when launched with the given arguments.

use std::process::ExitCode;
use wakeguard_config::{ArgumentError, LaunchPlan, parse_launch_args};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: validate-args [token]");
        eprintln!();
        eprintln!("Reports what wakeguard would launch with the given token.");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  validate-args 45");
        eprintln!("  validate-args /s");
        return ExitCode::from(2);
    }

    match parse_launch_args(&args) {
        Ok(plan) => {
            println!("✓ Arguments are valid");
            println!();
            match plan {
                LaunchPlan::Suppress(mode) => {
                    println!("Launch: suppress");
                    println!("  Mode: {}", mode);
                    println!("  Instance: {}", mode.kind().instance_name());
                    match mode.interval() {
                        Some(interval) => {
                            println!("  Interval: {}s ({})", interval.as_secs(), interval)
                        }
                        None => println!("  Interval: none (declarative)"),
                    }
                }
                LaunchPlan::About => println!("Launch: about dialog only"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Arguments rejected");
            eprintln!();
            eprintln!("{}", e);
            if let ArgumentError::OutOfRange { min, max, .. } = e {
                eprintln!();
                eprintln!("Accepted interval range: {}..={} seconds", min, max);
            }
            ExitCode::from(1)
        }
    }
}
