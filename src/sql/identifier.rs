use crate::sql::keyword::is_keyword;

/// Quotes an identifier when PostgreSQL would not read it back verbatim.
///
/// Lower-case names made of letters, digits, `_` and `$` that are not
/// keywords are returned as is.
pub fn escape_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !is_keyword(name);
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Reverses [`escape_identifier`]; unquoted input is folded to lower case.
pub fn unquote_identifier(text: &str) -> String {
    match text.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest).replace("\"\"", "\""),
        None => text.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("users", "users")]
    #[case("user_2$", "user_2$")]
    #[case("Users", "\"Users\"")]
    #[case("order", "\"order\"")]
    #[case("my table", "\"my table\"")]
    #[case("a\"b", "\"a\"\"b\"")]
    #[case("1abc", "\"1abc\"")]
    fn escapes(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(escape_identifier(name), expected);
        assert_eq!(unquote_identifier(expected), name);
    }

    #[test]
    fn unquote_folds_case() {
        assert_eq!(unquote_identifier("Users"), "users");
        assert_eq!(unquote_identifier("\"open"), "open");
    }
}
