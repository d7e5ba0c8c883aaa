/// Kinds of catalog entries and suggestion items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ObjectType {
    #[display("table")]
    Table,
    #[display("view")]
    View,
    #[display("materialized view")]
    MView,
    #[display("column")]
    Column,
    #[display("function")]
    Function,
    #[display("operator")]
    Operator,
    #[display("data type")]
    DataType,
    #[display("schema")]
    Schema,
    #[display("role")]
    Role,
    #[display("policy")]
    Policy,
    #[display("trigger")]
    Trigger,
    #[display("rule")]
    Rule,
    #[display("constraint")]
    Constraint,
    #[display("index")]
    Index,
    #[display("sequence")]
    Sequence,
    #[display("extension")]
    Extension,
    #[display("database")]
    Database,
    #[display("setting")]
    Setting,
    #[display("keyword")]
    Keyword,
    #[display("publication")]
    Publication,
    #[display("subscription")]
    Subscription,
    #[display("tablespace")]
    Tablespace,
    #[display("event trigger")]
    EventTrigger,
    #[display("snippet")]
    Snippet,
    #[display("folder")]
    Folder,
    #[display("file")]
    File,
}

impl ObjectType {
    /// Resolves a grammar expectation word, including its aliases.
    ///
    /// `tableOrView` expands to three types, which is why this returns a list.
    pub fn parse_expect(word: &str) -> Vec<ObjectType> {
        use ObjectType::*;
        let lc = word.trim().to_lowercase();
        let types: &[ObjectType] = match lc.as_str() {
            "table" | "foreign table" => &[Table],
            "view" => &[View],
            "mview" | "materialized view" => &[MView],
            "tableorview" => &[Table, View, MView],
            "column" => &[Column],
            "function" | "procedure" | "aggregate" | "routine" => &[Function],
            "operator" => &[Operator],
            "datatype" | "type" | "domain" => &[DataType],
            "schema" => &[Schema],
            "role" | "user" | "group" | "owner" => &[Role],
            "policy" => &[Policy],
            "trigger" => &[Trigger],
            "rule" => &[Rule],
            "constraint" => &[Constraint],
            "index" => &[Index],
            "sequence" => &[Sequence],
            "extension" => &[Extension],
            "database" => &[Database],
            "setting" => &[Setting],
            "publication" => &[Publication],
            "subscription" => &[Subscription],
            "tablespace" => &[Tablespace],
            "event trigger" => &[EventTrigger],
            _ => &[],
        };
        types.to_vec()
    }

    /// Tables, views and materialized views.
    pub fn is_tabular(self) -> bool {
        matches!(self, ObjectType::Table | ObjectType::View | ObjectType::MView)
    }

    /// Objects that live in a schema and are written schema-qualified
    /// outside `public`.
    pub fn is_schema_bound(self) -> bool {
        use ObjectType::*;
        matches!(
            self,
            Table | View | MView | Function | DataType | Index | Sequence | Constraint | Policy
        )
    }

    /// Plural label for "No X found" placeholders.
    pub fn plural(self) -> String {
        match self {
            ObjectType::Policy => "policies".into(),
            ObjectType::Index => "indexes".into(),
            other => format!("{other}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("tableOrView", vec![ObjectType::Table, ObjectType::View, ObjectType::MView])]
    #[case("dataType", vec![ObjectType::DataType])]
    #[case("type", vec![ObjectType::DataType])]
    #[case("owner", vec![ObjectType::Role])]
    #[case("procedure", vec![ObjectType::Function])]
    #[case("materialized view", vec![ObjectType::MView])]
    #[case("nonsense", vec![])]
    fn expectation_aliases(#[case] word: &str, #[case] expected: Vec<ObjectType>) {
        assert_eq!(ObjectType::parse_expect(word), expected);
    }

    #[test]
    fn display_and_plural() {
        assert_eq!(ObjectType::MView.to_string(), "materialized view");
        assert_eq!(ObjectType::Table.plural(), "tables");
        assert_eq!(ObjectType::Policy.plural(), "policies");
    }
}
