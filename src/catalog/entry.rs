use crate::*;

/// A named database object or grammar word that completion can offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub object_type: ObjectType,
    pub schema: Option<String>,
    /// Name as it must be written in SQL.
    pub escaped_name: String,
    /// Reference as written from outside: schema-qualified when the object
    /// lives outside `public` and `pg_catalog`.
    pub escaped: String,
    /// Owning table for columns, policies, triggers, rules, indexes and
    /// constraints.
    pub parent: Option<String>,
    /// Overrides `escaped` as the inserted text.
    pub insert_text: Option<String>,
    pub documentation: Option<String>,
    pub detail: Option<String>,
    /// Lower sorts first. Entries without one fall back to schema ordering.
    pub priority: Option<u32>,
    pub info: EntryInfo,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EntryInfo {
    #[default]
    None,
    Table(TableInfo),
    Column(ColumnInfo),
    Function(FunctionInfo),
    Setting(SettingInfo),
    Extension {
        installed: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub ordinal: u32,
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub has_default: bool,
}

impl ColumnInfo {
    pub fn new(ordinal: u32, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            has_default: false,
        }
    }
}

/// A foreign key constraint. `columns[i]` references `fcolumns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub ftable_schema: Option<String>,
    pub ftable: String,
    pub fcolumns: Vec<String>,
}

impl ForeignKey {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        ftable: impl Into<String>,
        fcolumns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ftable_schema: None,
            ftable: ftable.into(),
            fcolumns: fcolumns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.ftable_schema = Some(schema.into());
        self
    }

    /// True if this key points at the given table entry.
    pub fn references(&self, table: &Entry) -> bool {
        self.ftable == table.name
            && self
                .ftable_schema
                .as_deref()
                .is_none_or(|s| table.schema.as_deref() == Some(s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum FunctionKind {
    #[default]
    #[display("function")]
    Normal,
    #[display("aggregate")]
    Aggregate,
    #[display("window")]
    Window,
    #[display("procedure")]
    Procedure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionInfo {
    /// Argument list as declared, e.g. `a integer, b text DEFAULT 'x'`.
    pub arguments: String,
    pub arg_types: Vec<String>,
    pub returns: String,
    pub returns_set: bool,
    pub kind: FunctionKind,
}

impl FunctionInfo {
    pub fn new(arguments: impl Into<String>, returns: impl Into<String>) -> Self {
        let arguments = arguments.into();
        let arg_types = split_arguments(&arguments)
            .iter()
            .map(|a| argument_type(a))
            .collect();
        Self {
            arguments,
            arg_types,
            returns: returns.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn returns_set(mut self) -> Self {
        self.returns_set = true;
        self
    }
}

/// Splits a declared argument list on top-level commas.
fn split_arguments(arguments: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in arguments.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Type of one declared argument: drops the mode, the name and any default.
fn argument_type(arg: &str) -> String {
    let arg = arg.split_once(" DEFAULT ").map_or(arg, |(ty, _)| ty).trim();
    let mut words: Vec<&str> = arg.split_whitespace().collect();
    if words
        .first()
        .is_some_and(|w| matches!(w.to_uppercase().as_str(), "IN" | "OUT" | "INOUT" | "VARIADIC"))
    {
        words.remove(0);
    }
    let rest = words.join(" ").to_lowercase();
    if words.len() > 1 && !MULTIWORD_TYPES.iter().any(|t| rest.starts_with(t)) {
        words.remove(0);
    }
    words.join(" ")
}

const MULTIWORD_TYPES: &[&str] = &[
    "double precision",
    "character varying",
    "bit varying",
    "timestamp with",
    "timestamp without",
    "time with",
    "time without",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingInfo {
    pub category: String,
    pub vartype: String,
    pub setting: Option<String>,
    pub unit: Option<String>,
    pub enum_values: Vec<String>,
}

impl Entry {
    /// Base constructor; escapes `name` and derives the qualified reference.
    pub fn new(object_type: ObjectType, schema: Option<&str>, name: impl Into<String>) -> Self {
        let name = name.into();
        let escaped_name = escape_identifier(&name);
        let escaped = match schema {
            Some(s) if object_type.is_schema_bound() && s != "public" && s != "pg_catalog" => {
                format!("{}.{escaped_name}", escape_identifier(s))
            }
            _ => escaped_name.clone(),
        };
        Self {
            name,
            object_type,
            schema: schema.map(str::to_string),
            escaped_name,
            escaped,
            parent: None,
            insert_text: None,
            documentation: None,
            detail: None,
            priority: None,
            info: EntryInfo::None,
        }
    }

    pub fn table(
        schema: &str,
        name: impl Into<String>,
        columns: Vec<ColumnInfo>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Self {
        Self::tabular(ObjectType::Table, schema, name, columns, foreign_keys)
    }

    pub fn view(schema: &str, name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self::tabular(ObjectType::View, schema, name, columns, vec![])
    }

    pub fn mview(schema: &str, name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self::tabular(ObjectType::MView, schema, name, columns, vec![])
    }

    fn tabular(
        object_type: ObjectType,
        schema: &str,
        name: impl Into<String>,
        columns: Vec<ColumnInfo>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Self {
        let mut entry = Self::new(object_type, Some(schema), name);
        entry.detail = Some(format!("{object_type} {schema}"));
        entry.info = EntryInfo::Table(TableInfo {
            columns,
            foreign_keys,
        });
        entry
    }

    pub fn column(schema: &str, table: &str, column: ColumnInfo) -> Self {
        let mut entry = Self::new(ObjectType::Column, Some(schema), column.name.clone());
        entry.parent = Some(table.to_string());
        entry.detail = Some(column.data_type.clone());
        entry.documentation = Some(format!(
            "{}.{}: {}{}",
            escape_identifier(table),
            entry.escaped_name,
            column.data_type,
            if column.not_null { " NOT NULL" } else { "" }
        ));
        entry.info = EntryInfo::Column(column);
        entry
    }

    pub fn function(schema: &str, name: impl Into<String>, info: FunctionInfo) -> Self {
        let mut entry = Self::new(ObjectType::Function, Some(schema), name);
        entry.detail = Some(format!("({}) -> {}", info.arguments, info.returns));
        entry.info = EntryInfo::Function(info);
        entry
    }

    pub fn data_type(schema: &str, name: impl Into<String>) -> Self {
        let mut entry = Self::new(ObjectType::DataType, Some(schema), name);
        // Built-in type names are written verbatim, `double precision` included.
        if schema == "pg_catalog" {
            entry.escaped_name = entry.name.clone();
            entry.escaped = entry.name.clone();
        }
        entry
    }

    /// Object attached to a table, such as a policy, trigger or index.
    pub fn child(object_type: ObjectType, schema: &str, table: &str, name: impl Into<String>) -> Self {
        let mut entry = Self::new(object_type, Some(schema), name);
        entry.parent = Some(table.to_string());
        entry.detail = Some(format!("{object_type} on {}", escape_identifier(table)));
        entry
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::new(ObjectType::Role, None, name)
    }

    pub fn schema(name: impl Into<String>) -> Self {
        Self::new(ObjectType::Schema, None, name)
    }

    pub fn database(name: impl Into<String>) -> Self {
        Self::new(ObjectType::Database, None, name)
    }

    pub fn extension(name: impl Into<String>, installed: bool) -> Self {
        let mut entry = Self::new(ObjectType::Extension, None, name);
        entry.info = EntryInfo::Extension { installed };
        entry
    }

    pub fn setting(name: impl Into<String>, info: SettingInfo) -> Self {
        let mut entry = Self::new(ObjectType::Setting, None, name);
        entry.escaped_name = entry.name.clone();
        entry.escaped = entry.name.clone();
        entry.detail = Some(info.category.clone());
        entry.info = EntryInfo::Setting(info);
        entry
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        let mut entry = Self::new(ObjectType::Keyword, None, name);
        entry.escaped_name = entry.name.to_uppercase();
        entry.escaped = entry.escaped_name.clone();
        entry
    }

    pub fn operator(name: impl Into<String>) -> Self {
        let mut entry = Self::new(ObjectType::Operator, None, name);
        entry.escaped_name = entry.name.clone();
        entry.escaped = entry.name.clone();
        entry
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.documentation = Some(docs.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    pub fn table_info(&self) -> Option<&TableInfo> {
        match &self.info {
            EntryInfo::Table(info) => Some(info),
            _ => None,
        }
    }

    pub fn column_info(&self) -> Option<&ColumnInfo> {
        match &self.info {
            EntryInfo::Column(info) => Some(info),
            _ => None,
        }
    }

    pub fn function_info(&self) -> Option<&FunctionInfo> {
        match &self.info {
            EntryInfo::Function(info) => Some(info),
            _ => None,
        }
    }

    pub fn setting_info(&self) -> Option<&SettingInfo> {
        match &self.info {
            EntryInfo::Setting(info) => Some(info),
            _ => None,
        }
    }

    /// For extensions, whether the extension is installed in the database.
    pub fn is_installed(&self) -> bool {
        matches!(self.info, EntryInfo::Extension { installed: true })
    }

    pub fn is_public(&self) -> bool {
        matches!(self.schema.as_deref(), None | Some("public") | Some("pg_catalog"))
    }

    /// Text inserted when this entry is accepted.
    pub fn insert(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.escaped)
    }

    /// True if `written` (as typed in SQL, possibly quoted or
    /// schema-qualified) names this entry.
    pub fn is_written_as(&self, written: &str) -> bool {
        let parts = split_qualified(written);
        match parts.as_slice() {
            [name] => *name == self.name,
            [schema, name] => *name == self.name && self.schema.as_deref() == Some(schema.as_str()),
            _ => false,
        }
    }
}

/// Splits `a.b` on dots outside double quotes and unquotes each part.
pub fn split_qualified(written: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in written.trim().chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            '.' if !quoted => parts.push(unquote_identifier(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    parts.push(unquote_identifier(&current));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn schema_qualifies_outside_public() {
        let t = Entry::table("public", "users", vec![], vec![]);
        assert_eq!(t.escaped, "users");
        let t = Entry::table("sales", "Orders", vec![], vec![]);
        assert_eq!(t.escaped, "sales.\"Orders\"");
        assert_eq!(t.escaped_name, "\"Orders\"");
        assert!(!t.is_public());
    }

    #[rstest]
    #[case("users", true)]
    #[case("public.users", true)]
    #[case("\"users\"", true)]
    #[case("USERS", true)]
    #[case("other.users", false)]
    #[case("\"Users\"", false)]
    fn written_references(#[case] written: &str, #[case] expected: bool) {
        let t = Entry::table("public", "users", vec![], vec![]);
        assert_eq!(t.is_written_as(written), expected);
    }

    #[rstest]
    #[case("a integer, b text", vec!["integer", "text"])]
    #[case("VARIADIC arr integer[]", vec!["integer[]"])]
    #[case("text, integer DEFAULT 1", vec!["text", "integer"])]
    #[case("x double precision", vec!["double precision"])]
    #[case("double precision", vec!["double precision"])]
    #[case("", vec![])]
    fn parses_argument_types(#[case] args: &str, #[case] expected: Vec<&str>) {
        assert_eq!(FunctionInfo::new(args, "void").arg_types, expected);
    }

    #[test]
    fn foreign_key_targets() {
        let t1 = Entry::table("public", "t1", vec![], vec![]);
        let other = Entry::table("audit", "t1", vec![], vec![]);
        let fk = ForeignKey::new(["t1_id"], "t1", ["id"]).in_schema("public");
        assert!(fk.references(&t1));
        assert!(!fk.references(&other));
        assert!(ForeignKey::new(["t1_id"], "t1", ["id"]).references(&other));
    }
}
