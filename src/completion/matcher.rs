//! Statement matcher registry.
//!
//! Each [`Command`] recognizes one family of statements from the tokens of
//! the current block and produces its suggestions. Matchers recurse into
//! nested statements (subqueries, `WITH` bodies, `EXPLAIN` targets) through
//! [`match_nested`].
use crate::completion::matchers;
use crate::*;
use futures::{FutureExt as _, future::BoxFuture};

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Suppress `INTO` inside a nested SELECT.
    pub exclude_into: bool,
}

/// Everything a matcher reads.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub cb: &'a CodeBlock,
    pub catalog: &'a Catalog,
    pub live: Option<&'a dyn LiveQuery>,
    /// Block of the enclosing statement when matching a nested one.
    pub parent: Option<&'a CodeBlock>,
    pub options: MatchOptions,
}

impl<'a> MatchContext<'a> {
    pub fn new(cb: &'a CodeBlock, catalog: &'a Catalog) -> Self {
        Self {
            cb,
            catalog,
            live: None,
            parent: None,
            options: MatchOptions::default(),
        }
    }

    pub fn with_live(mut self, live: Option<&'a dyn LiveQuery>) -> Self {
        self.live = live;
        self
    }

    pub fn with_kwds(&self, kwds: &'a [Kwd], opts: KwdOpts) -> WithKwds<'a> {
        with_kwds(kwds, self.cb, self.catalog, opts)
    }

    /// Relations visible from the caret, including the enclosing statement's.
    pub fn tabular_expressions(&self) -> Vec<TabularExpr> {
        let mut exprs = get_tabular_expressions(self.cb, self.catalog);
        if let Some(parent) = self.parent {
            let outer: Vec<TabularExpr> = get_tabular_expressions(parent, self.catalog)
                .into_iter()
                .filter(|o| !exprs.iter().any(|e| e.offset == o.offset))
                .collect();
            exprs.extend(outer);
        }
        exprs
    }

    pub fn column_like(&self) -> Vec<CompletionItem> {
        column_like_from(&self.tabular_expressions(), self.cb, self.catalog)
    }

    pub fn columns(&self) -> Vec<CompletionItem> {
        columns_from(&self.tabular_expressions(), self.cb, self.catalog)
    }

    pub fn table_like(&self) -> Vec<CompletionItem> {
        suggest_table_like(self.cb, self.catalog)
    }

    pub fn expected(&self, expect: impl Into<Expect>) -> Vec<CompletionItem> {
        get_expected(&expect.into(), self.cb, self.catalog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Command {
    Publication,
    Subscription,
    With,
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Grant,
    Copy,
    Vacuum,
    Reindex,
    Set,
    Comment,
    Reassign,
}

impl Command {
    /// Priority order; the first matching command wins.
    pub const ALL: [Command; 17] = [
        Command::Publication,
        Command::Subscription,
        Command::With,
        Command::Select,
        Command::Insert,
        Command::Update,
        Command::Delete,
        Command::Create,
        Command::Alter,
        Command::Drop,
        Command::Grant,
        Command::Copy,
        Command::Vacuum,
        Command::Reindex,
        Command::Set,
        Command::Comment,
        Command::Reassign,
    ];

    /// Statements that may appear nested inside another.
    pub const DML: [Command; 4] = [Command::Select, Command::Insert, Command::Update, Command::Delete];

    pub fn matches(self, cb: &CodeBlock) -> bool {
        let first = |kwds: &[&str]| cb.ftoken().is_some_and(|t| t.is_any(kwds));
        let second = |kwd: &str| cb.tokens.get(1).is_some_and(|t| t.is(kwd));
        match self {
            Command::Publication => second("publication"),
            Command::Subscription => second("subscription"),
            Command::With => first(&["with"]),
            Command::Select => {
                first(&["select"])
                    || (cb.prev_top_kwds().first().is_some_and(|t| t.is("select")) && !first(SELECT_OWNERS))
            }
            Command::Insert => first(&["insert"]),
            Command::Update => first(&["update"]),
            Command::Delete => first(&["delete"]),
            Command::Create => cb.text_lc().starts_with("create"),
            Command::Alter => first(&["alter"]),
            Command::Drop => cb.prev_lc().starts_with("drop"),
            Command::Grant => first(&["grant", "revoke"]),
            Command::Copy => cb.prev_lc().starts_with("copy"),
            Command::Vacuum => first(&["vacuum", "analyze"]),
            Command::Reindex => first(&["reindex"]),
            Command::Set => first(&["set", "show", "reset"]),
            Command::Comment => first(&["comment"]),
            Command::Reassign => first(&["reassign"]),
        }
    }

    pub fn result<'a>(self, ctx: MatchContext<'a>) -> BoxFuture<'a, Vec<CompletionItem>> {
        match self {
            Command::Publication => async move { matchers::publication::result(ctx) }.boxed(),
            Command::Subscription => async move { matchers::subscription::result(ctx) }.boxed(),
            Command::With => matchers::with::result(ctx).boxed(),
            Command::Select => matchers::select::result(ctx).boxed(),
            Command::Insert => matchers::insert::result(ctx).boxed(),
            Command::Update => matchers::update::result(ctx).boxed(),
            Command::Delete => matchers::delete::result(ctx).boxed(),
            Command::Create => matchers::create::result(ctx).boxed(),
            Command::Alter => async move { matchers::alter::result(ctx) }.boxed(),
            Command::Drop => async move { matchers::drop::result(ctx) }.boxed(),
            Command::Grant => async move { matchers::grant::result(ctx) }.boxed(),
            Command::Copy => matchers::copy::result(ctx).boxed(),
            Command::Vacuum => async move { matchers::vacuum::result(ctx) }.boxed(),
            Command::Reindex => async move { matchers::reindex::result(ctx) }.boxed(),
            Command::Set => matchers::set::result(ctx).boxed(),
            Command::Comment => async move { matchers::comment::result(ctx) }.boxed(),
            Command::Reassign => async move { matchers::reassign::result(ctx) }.boxed(),
        }
    }
}

/// First command in priority order that recognizes the block.
pub fn get_match(cb: &CodeBlock) -> Option<Command> {
    get_match_among(cb, &Command::ALL)
}

pub fn get_match_among(cb: &CodeBlock, commands: &[Command]) -> Option<Command> {
    Command::ALL
        .into_iter()
        .filter(|c| commands.contains(c))
        .find(|c| c.matches(cb))
}

/// Re-runs matching on the tokens inside `[start, end]`, restricted to
/// `commands`. `None` when no command recognizes the nested statement.
pub fn match_nested<'a>(
    ctx: MatchContext<'a>,
    start: usize,
    end: usize,
    commands: &'a [Command],
    options: MatchOptions,
) -> BoxFuture<'a, Option<Vec<CompletionItem>>> {
    async move {
        let nested = ctx.cb.nested(start, end);
        let command = get_match_among(&nested, commands)?;
        debug!("Nested {command} statement at {start}..{end}");
        let nested_ctx = MatchContext {
            cb: &nested,
            parent: Some(ctx.cb),
            options,
            ..ctx
        };
        Some(command.result(nested_ctx).await)
    }
    .boxed()
}

/// Matches the statement inside the innermost parenthesis group around the
/// caret that starts with a statement keyword, e.g. `IN (SELECT ...)`.
pub fn match_nested_group<'a>(
    ctx: MatchContext<'a>,
    commands: &'a [Command],
    options: MatchOptions,
) -> BoxFuture<'a, Option<Vec<CompletionItem>>> {
    async move {
        let cb = ctx.cb;
        let mut level = Some(cb.curr_nesting_id.clone());
        while let Some(id) = level.filter(|id| !id.is_top()) {
            let mut group = cb.tokens.iter().filter(|t| t.nesting_id.is_within(&id));
            if let Some(first) = group.next().filter(|t| t.nesting_id == id && t.is_any(STATEMENT_STARTS)) {
                let end = group.last().map_or(first.offset, |t| t.offset);
                return match_nested(ctx, first.offset, end, commands, options).await;
            }
            level = id.parent();
        }
        None
    }
    .boxed()
}

const STATEMENT_STARTS: &[&str] = &["select", "with", "insert", "update", "delete"];

/// Statements whose own matcher handles a top-level `SELECT` keyword, either
/// as a privilege or event name or by recursing into a query body.
const SELECT_OWNERS: &[&str] = &[
    "with", "create", "alter", "drop", "grant", "revoke", "comment", "copy", "update", "delete",
];
