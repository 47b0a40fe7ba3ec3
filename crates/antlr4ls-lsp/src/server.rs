//! Tower-lsp backend for the ANTLR4 grammar language server.
//!
//! Implements the LSP `LanguageServer` trait with support for:
//! - textDocument/didOpen, didSave (diagnostics)
//! - textDocument/hover (tree of the symbol under the cursor)
//! - textDocument/definition
//! - textDocument/references
//!
//! Everything document-related is delegated to the [`Workspace`].

use std::sync::Arc;

use antlr4ls_tool::Tool;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::session::{DiagnosticPublisher, Query, QueryResult, Workspace};

pub const SERVER_NAME: &str = "antlr4ls";
pub const SERVER_VERSION: &str = "0.1.0";

/// Publishes through the connected LSP client.
struct ClientPublisher(Client);

#[tower_lsp::async_trait]
impl DiagnosticPublisher for ClientPublisher {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        self.0.publish_diagnostics(uri, diagnostics, None).await;
    }
}

/// The ANTLR4 LSP server backend.
pub struct Antlr4Backend {
    client: Client,
    workspace: Workspace,
}

impl Antlr4Backend {
    pub fn new(client: Client) -> Self {
        Self::with_tool(client, Tool::new())
    }

    /// A backend whose analyses search `tool`'s library directory.
    pub fn with_tool(client: Client, tool: Tool) -> Self {
        let workspace = Workspace::new(tool);
        workspace.connect(Arc::new(ClientPublisher(client.clone())));
        Self { client, workspace }
    }

    async fn locations(&self, uri: &Url, query: Query, position: Position) -> Vec<Location> {
        match self.workspace.query(uri, query, position).await {
            QueryResult::Locations(locations) => locations,
            QueryResult::Hover(_) => Vec::new(),
        }
    }
}

pub fn capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::NONE),
                save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Antlr4Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: capabilities(),
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "ANTLR4 language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down");
        self.workspace.shutdown();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.workspace.on_open(&params.text_document.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.workspace.on_change(&params.text_document.uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.workspace.on_save(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        tracing::debug!(uri = %params.text_document.uri, "close ignored");
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {}

    async fn did_change_watched_files(&self, _: DidChangeWatchedFilesParams) {}

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let value = match self.workspace.query(&uri, Query::Hover, position).await {
            QueryResult::Hover(text) => text,
            QueryResult::Locations(_) => String::new(),
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::PlainText,
                value,
            }),
            range: None,
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let locations = self.locations(&uri, Query::Definition, position).await;
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let query = Query::References {
            include_declaration: params.context.include_declaration,
        };
        Ok(Some(self.locations(&uri, query, position).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_capabilities() {
        let (service, _) = tower_lsp::LspService::new(Antlr4Backend::new);
        let server = service.inner();
        let result = server
            .initialize(InitializeParams::default())
            .await
            .unwrap();

        let caps = result.capabilities;
        assert_eq!(caps.hover_provider, Some(HoverProviderCapability::Simple(true)));
        assert_eq!(caps.definition_provider, Some(OneOf::Left(true)));
        assert_eq!(caps.references_provider, Some(OneOf::Left(true)));
        assert!(caps.text_document_sync.is_some());

        let info = result.server_info.unwrap();
        assert_eq!(info.name, "antlr4ls");
        assert_eq!(info.version.as_deref(), Some("0.1.0"));
    }

    #[tokio::test]
    async fn hover_on_unknown_document_is_empty_markup() {
        let (service, _) = tower_lsp::LspService::new(Antlr4Backend::new);
        let server = service.inner();
        let params = HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier {
                    uri: Url::parse("file:///nonexistent/T.g4").unwrap(),
                },
                position: Position::new(0, 0),
            },
            work_done_progress_params: Default::default(),
        };
        let hover = server.hover(params).await.unwrap().unwrap();
        assert_eq!(
            hover.contents,
            HoverContents::Markup(MarkupContent {
                kind: MarkupKind::PlainText,
                value: String::new(),
            })
        );
    }
}
