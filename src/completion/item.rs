use crate::*;
use std::sync::Arc;

/// Icon category shown next to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ItemKind {
    Function,
    Field,
    Struct,
    Interface,
    Module,
    Variable,
    Value,
    Operator,
    Keyword,
    Snippet,
    User,
    Event,
    Property,
    Folder,
    File,
    Text,
}

impl ItemKind {
    pub fn for_type(object_type: ObjectType) -> Self {
        use ObjectType::*;
        match object_type {
            Table => ItemKind::Struct,
            View | MView => ItemKind::Interface,
            Column => ItemKind::Field,
            Function => ItemKind::Function,
            Operator => ItemKind::Operator,
            DataType => ItemKind::Variable,
            Schema | Database | Extension | Tablespace => ItemKind::Module,
            Role => ItemKind::User,
            Policy | Rule | Constraint | Index | Sequence => ItemKind::Property,
            Trigger | EventTrigger | Publication | Subscription => ItemKind::Event,
            Setting => ItemKind::Value,
            Keyword => ItemKind::Keyword,
            Snippet => ItemKind::Snippet,
            Folder => ItemKind::Folder,
            File => ItemKind::File,
        }
    }
}

/// Byte range of the document replaced when an item is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

/// A single suggestion.
///
/// `insert_text` may contain snippet placeholders (`$0`, `${1:name}`).
/// Items resolved from the catalog keep the originating entry in `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub label: String,
    /// Short text shown after the label, e.g. `(optional)`.
    pub detail: Option<String>,
    pub insert_text: String,
    pub kind: ItemKind,
    pub object_type: ObjectType,
    pub sort_text: String,
    pub documentation: Option<String>,
    pub range: Option<Range>,
    pub filter_text: Option<String>,
    pub source: Option<Arc<Entry>>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, object_type: ObjectType) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            detail: None,
            kind: ItemKind::for_type(object_type),
            object_type,
            sort_text: String::new(),
            documentation: None,
            range: None,
            filter_text: None,
            source: None,
        }
    }

    /// Item for a catalog entry; the entry is carried along unchanged.
    pub fn from_entry(entry: &Arc<Entry>) -> Self {
        let mut item = Self::new(entry.escaped.clone(), entry.object_type);
        item.insert_text = entry.insert().to_string();
        item.detail = entry.detail.clone();
        item.documentation = entry.documentation.clone();
        item.source = Some(entry.clone());
        if let Some(info) = entry.function_info() {
            item.label = format!("{}({})", entry.escaped, info.arguments);
            item.filter_text = Some(entry.escaped.clone());
            if entry.insert_text.is_none() {
                item.insert_text = match info.arguments.is_empty() {
                    true => format!("{}()", entry.escaped),
                    false => format!("{}($0)", entry.escaped),
                };
            }
        }
        item
    }

    /// Keyword item; the label is shown as written.
    pub fn keyword(kwd: impl Into<String>) -> Self {
        Self::new(kwd, ObjectType::Keyword)
    }

    /// Inert item shown when a lookup produced nothing. Accepting it inserts
    /// nothing.
    pub fn placeholder(label: impl Into<String>) -> Self {
        let mut item = Self::new(label, ObjectType::Snippet);
        item.insert_text = String::new();
        item.kind = ItemKind::Text;
        item.sort_text = "z".into();
        item
    }

    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self
    }

    pub fn sort(mut self, sort_text: impl Into<String>) -> Self {
        self.sort_text = sort_text.into();
        self
    }

    pub fn docs(mut self, docs: impl Into<String>) -> Self {
        self.documentation = Some(docs.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == ItemKind::Text && self.insert_text.is_empty()
    }
}

/// Hand-written suggestion, rendered through [`suggest_snippets`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snippet {
    pub label: String,
    pub insert_text: Option<String>,
    pub docs: Option<String>,
    pub sort_text: Option<String>,
    pub kind: Option<ItemKind>,
}

impl Snippet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    pub fn docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn sort(mut self, sort_text: impl Into<String>) -> Self {
        self.sort_text = Some(sort_text.into());
        self
    }

    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl From<&str> for Snippet {
    fn from(label: &str) -> Self {
        Snippet::new(label)
    }
}

/// Renders snippets as keyword-typed items. Snippets without an explicit
/// sort text keep their declaration order.
pub fn suggest_snippets(snippets: impl IntoIterator<Item = impl Into<Snippet>>) -> Vec<CompletionItem> {
    snippets
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let s: Snippet = s.into();
            let mut item = CompletionItem::keyword(s.label.clone())
                .insert(s.insert_text.unwrap_or(s.label))
                .sort(s.sort_text.unwrap_or_else(|| format!("{i:02}")));
            item.documentation = s.docs;
            if let Some(kind) = s.kind {
                item.kind = kind;
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippets_keep_declaration_order() {
        let items = suggest_snippets([
            Snippet::new("ASC"),
            Snippet::new("DESC").docs("Descending"),
            Snippet::new("NULLS FIRST").insert("NULLS FIRST$0").sort("z"),
        ]);
        let sorts: Vec<_> = items.iter().map(|i| i.sort_text.as_str()).collect();
        assert_eq!(sorts, vec!["00", "01", "z"]);
        assert_eq!(items[1].documentation.as_deref(), Some("Descending"));
        assert_eq!(items[2].insert_text, "NULLS FIRST$0");
        assert!(items.iter().all(|i| i.kind == ItemKind::Keyword));
    }

    #[test]
    fn function_items_insert_a_call() {
        let f = Arc::new(Entry::function("public", "now", FunctionInfo::new("", "timestamptz")));
        let item = CompletionItem::from_entry(&f);
        assert_eq!(item.label, "now()");
        assert_eq!(item.insert_text, "now()");
        assert!(Arc::ptr_eq(item.source.as_ref().unwrap(), &f));

        let g = Arc::new(Entry::function("public", "lower", FunctionInfo::new("text", "text")));
        assert_eq!(CompletionItem::from_entry(&g).insert_text, "lower($0)");
    }

    #[test]
    fn placeholders_are_inert() {
        let item = CompletionItem::placeholder("No tables found");
        assert!(item.is_placeholder());
        assert_eq!(item.insert_text, "");
    }
}
