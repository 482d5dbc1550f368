//! SQL text generation for fixes an operator applies by hand.

/// Single-quoted SQL string literal with embedded quotes doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// [`quote`] for optional values, `NULL` when absent.
pub fn quote_opt(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote("St. Mary's"), "'St. Mary''s'");
        assert_eq!(quote_opt(None), "NULL");
    }
}
