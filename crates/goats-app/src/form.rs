//! `application/x-www-form-urlencoded` body parsing.

/// Look up the first value of `name` in an urlencoded body.
pub fn field(body: &[u8], name: &str) -> Option<String> {
    let body = std::str::from_utf8(body).ok()?;
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode(key).as_deref() == Some(name))
        .and_then(|(_, value)| decode(value))
}

/// Percent-decode a form component, treating `+` as a space.
fn decode(component: &str) -> Option<String> {
    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let hex = std::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_field() {
        assert_eq!(field(b"id=42", "id").as_deref(), Some("42"));
        assert_eq!(field(b"a=1&id=7&b=2", "id").as_deref(), Some("7"));
    }

    #[test]
    fn missing_field() {
        assert_eq!(field(b"", "id"), None);
        assert_eq!(field(b"name=billy", "id"), None);
    }

    #[test]
    fn empty_value_is_present() {
        assert_eq!(field(b"id=", "id").as_deref(), Some(""));
        assert_eq!(field(b"id", "id").as_deref(), Some(""));
    }

    #[test]
    fn decodes_percent_and_plus() {
        assert_eq!(field(b"name=Billy+the%20Kid", "name").as_deref(), Some("Billy the Kid"));
        assert_eq!(field(b"%69d=3", "id").as_deref(), Some("3"));
    }

    #[test]
    fn malformed_escape_is_ignored() {
        assert_eq!(field(b"id=%zz", "id"), None);
        assert_eq!(field(b"id=%4", "id"), None);
        assert_eq!(field(b"id=%+1", "id"), None);
        assert_eq!(field(b"id=%-1", "id"), None);
    }
}
