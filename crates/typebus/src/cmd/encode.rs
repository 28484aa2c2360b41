use std::fs::OpenOptions;

use typebus_frame::{encode_frame, ByteSink, IoSink};

use crate::cmd::{parse_type_id, EncodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{parse_hex, OutputFormat};

pub fn run(args: EncodeArgs, _format: OutputFormat) -> CliResult<i32> {
    let type_id = match (&args.type_id, &args.type_name) {
        (Some(id), None) => parse_type_id(id)?,
        (None, Some(name)) => typebus_core::type_hash(name),
        _ => {
            return Err(CliError::new(
                USAGE,
                "exactly one of --type-id or --type-name is required",
            ))
        }
    };

    let payload = match (&args.hex, &args.file) {
        (Some(hex), None) => parse_hex(hex).map_err(|msg| CliError::new(USAGE, msg))?,
        (None, Some(path)) => {
            std::fs::read(path).map_err(|err| io_error("read payload file", err))?
        }
        (None, None) => Vec::new(),
        _ => unreachable!("clap enforces the conflict"),
    };

    let config = args.wire.to_config();

    match &args.output {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| io_error("open output file", err))?;
            let mut sink = IoSink::new(file);
            encode_frame(&config, type_id, &payload, &mut sink)
                .map_err(|err| frame_error("encode frame", err))?;
            sink.flush().map_err(|err| io_error("flush output", err))?;
        }
        None => {
            let mut sink = IoSink::new(std::io::stdout().lock());
            encode_frame(&config, type_id, &payload, &mut sink)
                .map_err(|err| frame_error("encode frame", err))?;
            sink.flush().map_err(|err| io_error("flush output", err))?;
        }
    }

    tracing::debug!(type_id, payload_bytes = payload.len(), "frame written");
    Ok(SUCCESS)
}
