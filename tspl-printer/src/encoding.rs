//! Text encoding for TSPL printers
//!
//! TSPL built-in fonts are single byte. This module provides utilities for:
//! - Making free text safe to place inside a quoted command field
//! - Converting a UTF-8 command stream to the printer's code page

use tracing::{instrument, trace};

/// TSPL escape sequence for a literal double quote inside a string field
pub const QUOTE_ESCAPE: &str = "\\[\"]";

/// Make `s` safe to interpolate between the quotes of a TEXT/BARCODE field
///
/// Double quotes become the `\["]` escape. Line breaks would end the
/// command early, so CR and LF become spaces.
pub fn sanitize_field(s: &str) -> String {
    if !s.contains(['"', '\r', '\n']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '"' => out.push_str(QUOTE_ESCAPE),
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Encode a command stream to Windows-1252 bytes
///
/// ASCII passes through untouched, so command syntax is never altered.
/// Characters the code page cannot represent become `?`.
#[instrument(skip(commands), fields(len = commands.len()))]
pub fn encode_commands(commands: &str) -> Vec<u8> {
    if commands.is_ascii() {
        return commands.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(commands.len());
    let mut buf = [0u8; 4];
    let mut replaced = 0usize;
    for c in commands.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
            replaced += 1;
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    if replaced > 0 {
        trace!(replaced, "replaced characters outside code page");
    }
    out
}
