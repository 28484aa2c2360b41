use serde::Serialize;
use typebus_core::type_hash;

use crate::cmd::HashArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct HashOutput<'a> {
    name: &'a str,
    type_id: u32,
    type_id_hex: String,
}

pub fn run(args: HashArgs, format: OutputFormat) -> CliResult<i32> {
    let type_id = type_hash(&args.name);
    let out = HashOutput {
        name: &args.name,
        type_id,
        type_id_hex: format!("{type_id:#010x}"),
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} {}", out.type_id_hex, out.name);
        }
    }

    Ok(SUCCESS)
}
