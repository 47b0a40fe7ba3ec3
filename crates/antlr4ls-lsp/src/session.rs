//! Per-document state and the order in which work on a document happens.
//!
//! Each URI gets one entry behind an async mutex. Analyses and queries for
//! the same URI queue on that mutex in arrival order; different URIs run
//! independently. Parsing and analysis run on the blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use antlr4ls_parser::GrammarTree;
use antlr4ls_tool::{MessageCollector, Tool};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tower_lsp::lsp_types::{Diagnostic, Location, Position, Url};

use crate::diagnostics::DiagnosticCollector;
use crate::resolve;

/// Where diagnostics go after an analysis.
#[tower_lsp::async_trait]
pub trait DiagnosticPublisher: Send + Sync {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>);
}

/// A symbol query against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Hover,
    Definition,
    References { include_declaration: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Hover(String),
    Locations(Vec<Location>),
}

impl QueryResult {
    fn empty(query: Query) -> Self {
        match query {
            Query::Hover => QueryResult::Hover(String::new()),
            _ => QueryResult::Locations(Vec::new()),
        }
    }
}

#[derive(Default)]
struct DocumentEntry {
    /// Tree from the latest parse of the file on disk.
    tree: Option<Arc<GrammarTree>>,
}

type EntryMap = FxHashMap<String, Arc<AsyncMutex<DocumentEntry>>>;

pub struct Workspace {
    tool: Tool,
    entries: Mutex<EntryMap>,
    publisher: OnceLock<Arc<dyn DiagnosticPublisher>>,
}

impl Workspace {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            entries: Mutex::new(FxHashMap::default()),
            publisher: OnceLock::new(),
        }
    }

    /// Attach the diagnostics sink. Only the first call has an effect.
    pub fn connect(&self, publisher: Arc<dyn DiagnosticPublisher>) -> bool {
        self.publisher.set(publisher).is_ok()
    }

    fn entry(&self, uri: &Url) -> Arc<AsyncMutex<DocumentEntry>> {
        self.entries
            .lock()
            .entry(uri.to_string())
            .or_default()
            .clone()
    }

    pub async fn on_open(&self, uri: &Url) {
        self.analyze_and_publish(uri).await;
    }

    pub async fn on_save(&self, uri: &Url) {
        self.analyze_and_publish(uri).await;
    }

    /// Edits are not analyzed; the next save picks them up.
    pub async fn on_change(&self, uri: &Url) {
        tracing::debug!(%uri, "ignoring change");
    }

    /// Drop every cached tree.
    pub fn shutdown(&self) {
        self.entries.lock().clear();
    }

    /// Whether a tree is cached for `uri`.
    pub async fn has_tree(&self, uri: &Url) -> bool {
        let entry = self.entry(uri);
        let entry = entry.lock().await;
        entry.tree.is_some()
    }

    async fn analyze_and_publish(&self, uri: &Url) {
        let Some(publisher) = self.publisher.get().cloned() else {
            tracing::debug!(%uri, "no client connected, dropping notification");
            return;
        };

        let entry = self.entry(uri);
        let mut entry = entry.lock().await;
        entry.tree = None;

        let collector = DiagnosticCollector::new();
        let tree = match file_path(uri) {
            Some(path) => {
                let tool = self.tool.clone();
                let mut listener = collector.clone();
                let task = tokio::task::spawn_blocking(move || {
                    let grammar = tool.parse_grammar(&path, &mut listener)?;
                    tool.process(&grammar, &mut listener);
                    Ok::<_, antlr4ls_tool::ToolError>(grammar.tree)
                });
                match task.await {
                    Ok(Ok(tree)) => Some(Arc::new(tree)),
                    Ok(Err(err)) => {
                        tracing::warn!(%uri, "{}", err);
                        None
                    }
                    Err(err) => {
                        tracing::warn!(%uri, "analysis failed: {}", err);
                        None
                    }
                }
            }
            None => None,
        };

        let diagnostics = collector.snapshot();
        tracing::info!(%uri, count = diagnostics.len(), "publishing diagnostics");
        publisher.publish(uri.clone(), diagnostics).await;
        entry.tree = tree;
    }

    /// Answer a symbol query, parsing the file first if no tree is cached.
    pub async fn query(&self, uri: &Url, query: Query, position: Position) -> QueryResult {
        let entry = self.entry(uri);
        let mut entry = entry.lock().await;

        if entry.tree.is_none() {
            entry.tree = self.parse_only(uri).await;
        }
        let Some(tree) = entry.tree.clone() else {
            return QueryResult::empty(query);
        };

        // Cancellation checkpoint between locating and resolving.
        tokio::task::yield_now().await;

        match query {
            Query::Hover => QueryResult::Hover(resolve::hover(&tree, position)),
            Query::Definition => QueryResult::Locations(resolve::definition(&tree, position, uri)),
            Query::References {
                include_declaration,
            } => QueryResult::Locations(resolve::references(
                &tree,
                position,
                uri,
                include_declaration,
            )),
        }
    }

    /// Parse without analysis or publishing.
    async fn parse_only(&self, uri: &Url) -> Option<Arc<GrammarTree>> {
        let path = file_path(uri)?;
        let tool = self.tool.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut ignored = MessageCollector::new();
            tool.parse_grammar(&path, &mut ignored).map(|grammar| grammar.tree)
        });
        match task.await {
            Ok(Ok(tree)) => Some(Arc::new(tree)),
            Ok(Err(err)) => {
                tracing::warn!(%uri, "{}", err);
                None
            }
            Err(err) => {
                tracing::warn!(%uri, "parse failed: {}", err);
                None
            }
        }
    }
}

fn file_path(uri: &Url) -> Option<PathBuf> {
    match uri.to_file_path() {
        Ok(path) => Some(path),
        Err(()) => {
            tracing::warn!(%uri, "not a file URI");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Mutex<Vec<(Url, usize)>>);

    #[tower_lsp::async_trait]
    impl DiagnosticPublisher for Recorder {
        async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
            self.0.lock().push((uri, diagnostics.len()));
        }
    }

    #[tokio::test]
    async fn notifications_before_connect_are_dropped() {
        let workspace = Workspace::new(Tool::new());
        let uri = Url::parse("file:///nonexistent/T.g4").unwrap();
        workspace.on_open(&uri).await;
        assert!(!workspace.has_tree(&uri).await);

        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        assert!(workspace.connect(recorder.clone()));
        assert!(!workspace.connect(recorder.clone()));
        assert!(recorder.0.lock().is_empty());
    }

    #[tokio::test]
    async fn unreadable_file_still_publishes() {
        let workspace = Workspace::new(Tool::new());
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        workspace.connect(recorder.clone());
        let uri = Url::parse("file:///nonexistent/T.g4").unwrap();

        workspace.on_save(&uri).await;
        assert_eq!(recorder.0.lock().as_slice(), &[(uri.clone(), 0)]);
        assert!(!workspace.has_tree(&uri).await);

        let result = workspace.query(&uri, Query::Hover, Position::new(0, 0)).await;
        assert_eq!(result, QueryResult::Hover(String::new()));
        let result = workspace
            .query(&uri, Query::Definition, Position::new(0, 0))
            .await;
        assert_eq!(result, QueryResult::Locations(Vec::new()));
    }
}
