mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "typebus", version, about = "typebus frame inspection CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hash_subcommand() {
        let cli = Cli::try_parse_from(["typebus", "hash", "telemetry::Temperature"])
            .expect("hash args should parse");
        assert!(matches!(cli.command, Command::Hash(_)));
    }

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "typebus",
            "encode",
            "--type-name",
            "Temperature",
            "--hex",
            "0000ac41",
            "--output",
            "/tmp/capture.bin",
        ])
        .expect("encode args should parse");
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn rejects_conflicting_type_args() {
        let err = Cli::try_parse_from([
            "typebus",
            "encode",
            "--type-id",
            "7",
            "--type-name",
            "Temperature",
        ])
        .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_inspect_subcommand_with_repeated_types() {
        let cli = Cli::try_parse_from([
            "typebus",
            "inspect",
            "/tmp/capture.bin",
            "--type",
            "7:4",
            "--type",
            "Temperature:4",
            "--resync",
        ])
        .expect("inspect args should parse");

        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.types.len(), 2);
                assert!(args.resync);
            }
            other => panic!("expected inspect, got {other:?}"),
        }
    }
}
