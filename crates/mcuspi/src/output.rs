use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mcuspi_frame::Message;
use mcuspi_session::ReceiveStats;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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
struct MessageOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    serial: Option<u8>,
    descriptor: String,
    payload_size: usize,
    payload: String,
    source: &'a str,
}

/// Print one message. `serial` is known when the frame was decoded
/// directly, and absent for messages read back out of a session.
pub fn print_message(message: &Message, serial: Option<u8>, source: &str, format: OutputFormat) {
    let payload = message.payload();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                serial,
                descriptor: descriptor_hex(message),
                payload_size: payload.len(),
                payload: payload_preview(payload),
                source,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERIAL", "SIZE", "DESCRIPTOR", "PAYLOAD"])
                .add_row(vec![
                    serial.map_or_else(|| "-".to_string(), |s| s.to_string()),
                    payload.len().to_string(),
                    descriptor_hex(message),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let serial = serial.map_or_else(|| "-".to_string(), |s| s.to_string());
            println!(
                "serial={serial} size={} source={source} descriptor={} payload={}",
                payload.len(),
                descriptor_hex(message),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

pub fn print_stats(stats: &ReceiveStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["RECEIVED", "QUEUED", "CHECKSUM", "INVALID", "FULL", "READ"])
                .add_row(vec![
                    stats.received.to_string(),
                    stats.queued.to_string(),
                    stats.dropped_checksum.to_string(),
                    stats.dropped_invalid.to_string(),
                    stats.dropped_full.to_string(),
                    stats.read_failures.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "received={} queued={} dropped={}",
                stats.received,
                stats.queued,
                stats.dropped()
            );
        }
        // Stats would corrupt a raw payload stream.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Descriptor as hex with trailing zero bytes trimmed.
pub fn descriptor_hex(message: &Message) -> String {
    let descriptor = message.descriptor();
    let used = descriptor
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    to_hex(&descriptor[..used])
}

pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Parse a hex string, ignoring whitespace.
pub fn from_hex(input: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(text, 16).ok()
        })
        .collect()
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
