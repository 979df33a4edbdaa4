//! # Number Parsing
//!
//! Addresses and lengths on the command line are written the way firmware
//! people write them: `0x0800_0000`, `0b1010`, `0o777` or plain decimal.

/// Parse an unsigned 32-bit number with an optional radix prefix
///
/// Accepts `0x`/`0X` (hex), `0o`/`0O` (octal), `0b`/`0B` (binary) or no
/// prefix (decimal). Underscores between digits are ignored.
///
/// ## Example
///
/// ```rust
/// use vexcept_utils::parse_u32;
///
/// assert_eq!(parse_u32("0x0800_0000"), Ok(0x0800_0000));
/// assert_eq!(parse_u32("64"), Ok(64));
/// ```
///
/// ## Errors
///
/// Returns a message naming the input if it is empty, has invalid digits or
/// does not fit in 32 bits.
pub fn parse_u32(text: &str) -> Result<u32, String>
{
    let trimmed = text.trim();
    let (digits, radix) = split_radix(trimmed);
    let digits: String = digits.chars().filter(|c| *c != '_').collect();

    if digits.is_empty() {
        return Err(format!("'{text}' is not a number"));
    }
    u32::from_str_radix(&digits, radix).map_err(|e| format!("'{text}' is not a valid 32-bit number: {e}"))
}

fn split_radix(text: &str) -> (&str, u32)
{
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (&text[2..], 16),
        Some("0o") => (&text[2..], 8),
        Some("0b") => (&text[2..], 2),
        _ => (text, 10),
    }
}
