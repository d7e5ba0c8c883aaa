use crate::*;

/// Block around the `|` marker in `sql`; the marker itself is removed.
pub fn at_caret(sql: &str) -> CodeBlock {
    let (text, caret) = split_caret(sql);
    CodeBlock::new(&text, caret)
}

pub fn split_caret(sql: &str) -> (String, usize) {
    let caret = sql.find('|').expect("missing caret marker `|`");
    (sql.replacen('|', "", 1), caret)
}

/// Small but varied catalog shared by the completion tests.
pub fn fixture_catalog() -> Catalog {
    use ObjectType::*;
    let col = ColumnInfo::new;
    Catalog::new([
        Entry::schema("public"),
        Entry::schema("archive"),
        Entry::table(
            "public",
            "users",
            vec![col(1, "id", "integer"), col(2, "email", "text"), col(3, "name", "text")],
            vec![],
        ),
        Entry::table(
            "public",
            "orders",
            vec![col(1, "id", "integer"), col(2, "user_id", "integer"), col(3, "total", "numeric")],
            vec![ForeignKey::new(["user_id"], "users", ["id"])],
        ),
        Entry::table("public", "t1", vec![col(1, "id", "integer")], vec![]),
        Entry::table(
            "public",
            "t2",
            vec![col(1, "id", "integer"), col(2, "t1_id", "integer")],
            vec![ForeignKey::new(["t1_id"], "t1", ["id"])],
        ),
        Entry::table("archive", "old_orders", vec![col(1, "id", "integer")], vec![]),
        Entry::view("public", "active_users", vec![col(1, "id", "integer"), col(2, "email", "text")]),
        Entry::mview("public", "order_totals", vec![col(1, "user_id", "integer"), col(2, "total", "numeric")]),
        Entry::role("postgres"),
        Entry::role("app_user"),
        Entry::function(
            "pg_catalog",
            "count",
            FunctionInfo::new("\"any\"", "bigint").kind(FunctionKind::Aggregate),
        ),
        Entry::function(
            "pg_catalog",
            "sum",
            FunctionInfo::new("numeric", "numeric").kind(FunctionKind::Aggregate),
        ),
        Entry::function("pg_catalog", "lower", FunctionInfo::new("text", "text")),
        Entry::function("pg_catalog", "now", FunctionInfo::new("", "timestamp with time zone")),
        Entry::function(
            "pg_catalog",
            "generate_series",
            FunctionInfo::new("start integer, stop integer", "SETOF integer").returns_set(),
        ),
        Entry::function(
            "pg_catalog",
            "row_number",
            FunctionInfo::new("", "bigint").kind(FunctionKind::Window),
        ),
        Entry::function(
            "public",
            "refresh_totals",
            FunctionInfo::new("days integer", "void").kind(FunctionKind::Procedure),
        ),
        Entry::function("public", "audit_orders", FunctionInfo::new("", "trigger")),
        Entry::data_type("pg_catalog", "integer").with_priority(1),
        Entry::data_type("pg_catalog", "text").with_priority(2),
        Entry::data_type("pg_catalog", "numeric"),
        Entry::data_type("pg_catalog", "double precision"),
        Entry::data_type("pg_catalog", "timestamp with time zone"),
        Entry::child(Policy, "public", "users", "users_own_rows"),
        Entry::child(Trigger, "public", "orders", "orders_audit"),
        Entry::child(Index, "public", "users", "users_pkey"),
        Entry::child(Rule, "public", "orders", "orders_protect"),
        Entry::child(Constraint, "public", "orders", "orders_user_id_fkey"),
        Entry::new(Sequence, Some("public"), "users_id_seq"),
        Entry::extension("pgcrypto", false).with_docs("cryptographic functions"),
        Entry::extension("plpgsql", true),
        Entry::database("postgres"),
        Entry::database("analytics"),
        Entry::new(Publication, None, "pub_all"),
        Entry::new(Subscription, None, "sub_main"),
        Entry::new(Tablespace, None, "pg_default"),
        Entry::keyword("select").with_docs("Retrieves rows from a table or view."),
        Entry::operator("=").with_docs("equal"),
        Entry::setting(
            "work_mem",
            SettingInfo {
                category: "Resource Usage / Memory".into(),
                vartype: "integer".into(),
                setting: Some("4096".into()),
                unit: Some("kB".into()),
                enum_values: vec![],
            },
        ),
        Entry::setting(
            "client_min_messages",
            SettingInfo {
                category: "Client Connection Defaults".into(),
                vartype: "enum".into(),
                setting: Some("notice".into()),
                unit: None,
                enum_values: vec!["debug1".into(), "notice".into(), "warning".into()],
            },
        ),
        Entry::setting(
            "enable_seqscan",
            SettingInfo {
                category: "Query Tuning".into(),
                vartype: "bool".into(),
                setting: Some("on".into()),
                unit: None,
                enum_values: vec![],
            },
        ),
    ])
}

/// [`LiveQuery`] with canned answers, picked by a fragment of the SQL text.
/// Unknown queries return no rows.
#[derive(Default)]
pub struct FakeLive {
    answers: Vec<(&'static str, std::result::Result<LiveRows, String>)>,
    pub calls: std::sync::Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeLive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, sql_fragment: &'static str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
            .collect();
        self.answers.push((sql_fragment, Ok(rows)));
        self
    }

    pub fn fails(mut self, sql_fragment: &'static str, message: &str) -> Self {
        self.answers.push((sql_fragment, Err(message.to_string())));
        self
    }
}

impl LiveQuery for FakeLive {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        args: &'a [String],
        return_type: ReturnType,
    ) -> futures::future::BoxFuture<'a, Result<QueryOutput>> {
        self.calls.lock().unwrap().push((sql.to_string(), args.to_vec()));
        let answer = self
            .answers
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(|| Ok(vec![]));
        Box::pin(async move {
            answer
                .map(|rows| QueryOutput::shaped(std::sync::Arc::new(rows), return_type))
                .map_err(Error::LiveQuery)
        })
    }
}
