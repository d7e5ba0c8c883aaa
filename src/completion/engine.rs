//! Entry point tying the tokenizer, the matchers and the post-processor
//! together.
use crate::completion::matchers::first;
use crate::*;

/// Suggestions for the caret at byte `offset` of `text`.
///
/// Never fails: unrecognized input yields an empty list and failed live
/// lookups surface as placeholder items. The result only depends on the
/// arguments, so a late answer to a stale request is harmless.
pub async fn complete(
    text: &str,
    offset: usize,
    catalog: &Catalog,
    live: Option<&dyn LiveQuery>,
) -> Vec<CompletionItem> {
    let cb = CodeBlock::new(text, offset);
    if cb.is_commenting {
        trace!("Caret at {offset} is inside a comment");
        return vec![];
    }
    trace!(
        "Block of {} tokens, nesting {}, current token {:?}",
        cb.tokens.len(),
        cb.curr_nesting_id,
        cb.curr_token().map(|t| t.text.as_str())
    );

    let ctx = MatchContext::new(&cb, catalog).with_live(live);
    let items = resolve(ctx).await;
    postprocess(items, &cb, config().max_suggestions)
}

async fn resolve(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if let Some(items) = first::result(ctx).await {
        debug!("Statement independent shape produced {} suggestions", items.len());
        return items;
    }
    match get_match(cb) {
        Some(command) => {
            let items = command.result(ctx).await;
            debug!("{command} matcher produced {} suggestions", items.len());
            items
        }
        None if cb.prev_tokens().is_empty() => starting_keywords(ctx.catalog),
        None => {
            debug!("No matcher for {:?}", cb.ftoken().map(|t| t.text.as_str()));
            vec![]
        }
    }
}

/// Statement keywords offered on an empty statement.
fn starting_keywords(catalog: &Catalog) -> Vec<CompletionItem> {
    suggest_snippets(STARTING_KEYWORDS.iter().map(|kwd| {
        let snippet = Snippet::new(*kwd);
        match catalog.keyword_docs(kwd) {
            Some(docs) => snippet.docs(docs),
            None => snippet,
        }
    }))
}
