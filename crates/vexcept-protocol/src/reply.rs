//! # Reply Parsing
//!
//! Helpers that turn OpenOCD's textual Tcl replies into numbers.

use vexcept_core::error::{VexceptError, VexceptResult};

/// Parse a hexadecimal number with or without a `0x` prefix
pub fn parse_hex(text: &str) -> Option<u32>
{
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Extract the value from a `reg <n>` reply such as `pc (/32): 0x08000100`
///
/// Returns `None` when the reply has no `": "` separator or the value is not
/// hexadecimal. OpenOCD answers that way for registers it cannot access.
pub fn parse_register(reply: &str) -> Option<u32>
{
    let (_, value) = reply.split_once(": ")?;
    parse_hex(value)
}

/// Decode a `return $var` reply of a `mem2array` variable
///
/// The reply is a flat list of `index value` pairs in whatever order Tcl's
/// hash table produced. Values are decimal. The result is ordered by index.
///
/// ## Errors
///
/// - `Protocol`: odd token count, unparsable numbers, duplicate or missing
///   indices, or a different number of items than `expected`
pub fn parse_array(reply: &str, expected: usize) -> VexceptResult<Vec<u32>>
{
    let tokens: Vec<&str> = reply.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(VexceptError::Protocol(format!("malformed array reply: {reply:?}")));
    }

    let pairs = tokens.len() / 2;
    if pairs != expected {
        return Err(VexceptError::Protocol(format!(
            "expected {expected} array items, got {pairs}: {reply:?}"
        )));
    }

    let mut values: Vec<Option<u32>> = vec![None; pairs];
    for pair in tokens.chunks_exact(2) {
        let index: usize = pair[0]
            .parse()
            .map_err(|_| VexceptError::Protocol(format!("bad array index {:?}", pair[0])))?;
        let value = parse_number(pair[1])
            .ok_or_else(|| VexceptError::Protocol(format!("bad array value {:?}", pair[1])))?;

        match values.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(value),
            Some(_) => return Err(VexceptError::Protocol(format!("duplicate array index {index}"))),
            None => return Err(VexceptError::Protocol(format!("array index {index} out of range"))),
        }
    }

    // Every slot is filled: `pairs` distinct indices below `pairs`.
    Ok(values.into_iter().flatten().collect())
}

/// Decimal, or hexadecimal with a `0x` prefix
fn parse_number(text: &str) -> Option<u32>
{
    if text.starts_with("0x") || text.starts_with("0X") {
        parse_hex(text)
    } else {
        text.parse().ok()
    }
}

/// Body of an `array set` command: `0 0x.. 1 0x..`
pub fn format_array(values: &[u32]) -> String
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| format!("{index} 0x{value:x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
