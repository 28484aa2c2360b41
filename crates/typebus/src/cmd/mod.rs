use clap::{Args, Subcommand};
use std::path::PathBuf;

use typebus_frame::WireConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod encode;
pub mod hash;
pub mod inspect;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the type id derived from a type name.
    Hash(HashArgs),
    /// Encode a single frame and append it to a capture file.
    Encode(EncodeArgs),
    /// Decode a capture file and print its frames.
    Inspect(InspectArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Hash(args) => hash::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Type name to hash (e.g. "telemetry::Temperature").
    pub name: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Type id for the frame header (decimal or 0x-prefixed hex).
    #[arg(long, conflicts_with = "type_name")]
    pub type_id: Option<String>,
    /// Type name; the id is derived by hashing.
    #[arg(long, conflicts_with = "type_id")]
    pub type_name: Option<String>,
    /// Payload as hex digits.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw payload bytes from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Append to this file instead of writing to stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Capture file to decode.
    pub input: PathBuf,
    /// Expected payload as TYPE:SIZE[:PAD], where TYPE is an id or a name
    /// and PAD is trailing padding per frame (repeatable).
    #[arg(long = "type", value_name = "TYPE:SIZE[:PAD]")]
    pub types: Vec<String>,
    /// Scan forward for the next frame boundary after a decode error.
    #[arg(long)]
    pub resync: bool,
    /// Stop after decoding N frames.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct WireArgs {
    /// Frame without the 4-byte magic prefix.
    #[arg(long)]
    pub no_prefix: bool,
    /// Append this delimiter byte after each payload.
    #[arg(long, value_name = "BYTE")]
    pub postfix: Option<u8>,
}

impl WireArgs {
    pub fn to_config(&self) -> WireConfig {
        let mut config = if self.no_prefix {
            WireConfig::bare()
        } else {
            WireConfig::default()
        };
        config.postfix = self.postfix;
        config
    }
}

/// Parses a type id given as decimal, 0x-prefixed hex, or a name to hash.
pub fn parse_type_id(input: &str) -> CliResult<u32> {
    if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16)
            .map_err(|_| CliError::new(USAGE, format!("invalid hex type id: {input}")));
    }
    if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
        return input
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("type id out of range: {input}")));
    }
    if input.is_empty() {
        return Err(CliError::new(USAGE, "type id must not be empty"));
    }
    Ok(typebus_core::type_hash(input))
}
