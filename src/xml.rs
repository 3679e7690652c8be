/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Drops characters XML 1.0 cannot carry, e.g. control bytes that leak into
/// tick labels passed on the command line.
pub fn sanitize_xml_text(text: &str) -> String {
    text.chars().filter(|&c| is_valid_xml_char(c)).collect()
}

/// Escapes character data. Quotes are left alone since text nodes never
/// end up inside an attribute.
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escapes a double-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    escape(value, true)
}

fn escape(text: &str, in_attr: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attr => escaped.push_str("&quot;"),
            '\n' if in_attr => escaped.push_str("&#10;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Resolves a general entity reference name (`amp`, `#10`, `#x41`).
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
