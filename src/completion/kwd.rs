//! Declarative keyword grammar entries.
//!
//! A statement grammar is an ordered `Vec<Kwd>`. Each entry names a keyword
//! phrase, what input follows it and the conditions under which it may be
//! offered. [`with_kwds`](crate::with_kwds) walks a list against the tokens
//! before the caret.
use crate::*;

/// What follows a keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    /// Catalog objects of these types.
    Objects(Vec<ObjectType>),
    /// Like `Objects`, but each choice is inserted inside parentheses.
    Wrapped(Vec<ObjectType>),
    Number,
    String,
    /// A boolean expression: columns and functions.
    Condition,
    /// A parenthesized option list owned by the keyword, e.g. `VACUUM (...)`.
    Options,
    /// `name = value` style options, inserted with a leading `=`.
    EqOption,
}

impl Expect {
    /// Parses a grammar expectation word such as `tableOrView` or `(column)`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_lowercase().as_str() {
            "number" => return Expect::Number,
            "string" => return Expect::String,
            "condition" => return Expect::Condition,
            "(options)" => return Expect::Options,
            "=option" => return Expect::EqOption,
            _ => {}
        }
        match raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            Some(inner) => Expect::Wrapped(ObjectType::parse_expect(inner)),
            None => Expect::Objects(ObjectType::parse_expect(raw)),
        }
    }

    pub fn object_types(&self) -> &[ObjectType] {
        match self {
            Expect::Objects(t) | Expect::Wrapped(t) => t,
            _ => &[],
        }
    }

    pub fn is_column(&self) -> bool {
        matches!(self, Expect::Objects(t) | Expect::Wrapped(t) if t.as_slice() == [ObjectType::Column])
    }
}

impl From<&str> for Expect {
    fn from(raw: &str) -> Self {
        Expect::parse(raw)
    }
}

impl From<ObjectType> for Expect {
    fn from(object_type: ObjectType) -> Self {
        Expect::Objects(vec![object_type])
    }
}

/// Fixed or computed values offered after a keyword.
#[derive(Debug, Clone)]
pub enum KwdOptions {
    List(Vec<Snippet>),
    Dynamic(fn(&Catalog, &CodeBlock) -> Vec<CompletionItem>),
}

#[derive(Debug, Clone)]
pub enum ExcludeIf {
    /// Hidden once any of these words appears before the caret.
    Words(Vec<String>),
    When(fn(&CodeBlock) -> bool),
}

#[derive(Debug, Clone, Default)]
pub struct Kwd {
    pub kwd: String,
    pub expects: Option<Expect>,
    pub options: Option<KwdOptions>,
    pub docs: Option<String>,
    /// Only offered right after one of these keywords has been used.
    pub just_after: Vec<String>,
    /// Only offered when the text before the caret ends with one of these.
    pub exactly_after: Vec<String>,
    pub depends_on: Option<String>,
    pub depends_on_after: Option<String>,
    pub exclude_if: Option<ExcludeIf>,
    pub include: Option<fn(&CodeBlock) -> bool>,
    pub optional: bool,
    pub can_repeat: bool,
}

impl Kwd {
    pub fn new(kwd: impl Into<String>) -> Self {
        Self {
            kwd: kwd.into(),
            ..Default::default()
        }
    }

    pub fn expects(mut self, expects: impl Into<Expect>) -> Self {
        self.expects = Some(expects.into());
        self
    }

    pub fn options<S: Into<Snippet>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = Some(KwdOptions::List(options.into_iter().map(Into::into).collect()));
        self
    }

    pub fn dynamic_options(mut self, f: fn(&Catalog, &CodeBlock) -> Vec<CompletionItem>) -> Self {
        self.options = Some(KwdOptions::Dynamic(f));
        self
    }

    pub fn docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn just_after<S: Into<String>>(mut self, kwds: impl IntoIterator<Item = S>) -> Self {
        self.just_after = kwds.into_iter().map(Into::into).collect();
        self
    }

    pub fn exactly_after<S: Into<String>>(mut self, kwds: impl IntoIterator<Item = S>) -> Self {
        self.exactly_after = kwds.into_iter().map(Into::into).collect();
        self
    }

    pub fn depends_on(mut self, kwd: impl Into<String>) -> Self {
        self.depends_on = Some(kwd.into());
        self
    }

    pub fn depends_on_after(mut self, kwd: impl Into<String>) -> Self {
        self.depends_on_after = Some(kwd.into());
        self
    }

    pub fn exclude_if<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.exclude_if = Some(ExcludeIf::Words(words.into_iter().map(Into::into).collect()));
        self
    }

    pub fn exclude_when(mut self, f: fn(&CodeBlock) -> bool) -> Self {
        self.exclude_if = Some(ExcludeIf::When(f));
        self
    }

    pub fn include_when(mut self, f: fn(&CodeBlock) -> bool) -> Self {
        self.include = Some(f);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn can_repeat(mut self) -> Self {
        self.can_repeat = true;
        self
    }

    /// Keyword phrase split into lower-cased words.
    pub fn words(&self) -> Vec<String> {
        self.kwd.split_whitespace().map(str::to_lowercase).collect()
    }

    pub fn is(&self, kwd: &str) -> bool {
        self.kwd.eq_ignore_ascii_case(kwd)
    }

    pub fn expects_options(&self) -> bool {
        self.expects == Some(Expect::Options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("tableOrView", Expect::Objects(vec![ObjectType::Table, ObjectType::View, ObjectType::MView]))]
    #[case("(column)", Expect::Wrapped(vec![ObjectType::Column]))]
    #[case("number", Expect::Number)]
    #[case("(options)", Expect::Options)]
    #[case("=option", Expect::EqOption)]
    #[case("role", Expect::Objects(vec![ObjectType::Role]))]
    fn parses_expectations(#[case] raw: &str, #[case] expected: Expect) {
        assert_eq!(Expect::parse(raw), expected);
    }

    #[test]
    fn builder_sets_fields() {
        let kwd = Kwd::new("GROUP BY")
            .expects("column")
            .just_after(["FROM", "WHERE"])
            .optional()
            .can_repeat();
        assert_eq!(kwd.words(), vec!["group", "by"]);
        assert!(kwd.expects.as_ref().is_some_and(Expect::is_column));
        assert_eq!(kwd.just_after, vec!["FROM", "WHERE"]);
        assert!(kwd.optional && kwd.can_repeat);
        assert!(kwd.is("group by"));
    }
}
