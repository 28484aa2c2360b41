use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub type_id: u32,
    pub type_id_hex: String,
    pub payload_bytes: usize,
    pub payload: String,
}

impl FrameRecord {
    pub fn new(index: usize, type_id: u32, payload: &[u8]) -> Self {
        Self {
            index,
            type_id,
            type_id_hex: format!("{type_id:#010x}"),
            payload_bytes: payload.len(),
            payload: to_hex(payload),
        }
    }
}

pub fn print_frames(records: &[FrameRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!(
                    "{}",
                    serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TYPE ID", "SIZE", "PAYLOAD"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    record.type_id_hex.clone(),
                    record.payload_bytes.to_string(),
                    record.payload.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "frame={} type_id={} size={} payload={}",
                    record.index, record.type_id_hex, record.payload_bytes, record.payload
                );
            }
        }
    }
}

pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(format!(
            "hex payload has odd length ({} digits)",
            cleaned.len()
        ));
    }
    let mut out = Vec::with_capacity(cleaned.len() / 2);
    let bytes = cleaned.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let text = std::str::from_utf8(pair).map_err(|_| "invalid hex digit".to_string())?;
        let value =
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex digit in '{text}'"))?;
        out.push(value);
    }
    Ok(out)
}
