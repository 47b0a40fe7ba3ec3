//! ANTLR4 grammar Language Server Protocol (LSP) implementation.
//!
//! Diagnostics come from the grammar tool on open and save. Symbol queries
//! work on the grammar tree:
//!
//! - **Hover**: the subtree under the cursor as an s-expression
//! - **Go-to-definition**: the rule declaring a referenced name
//! - **References**: every occurrence of a rule or token name
//!
//! The server talks LSP over stdin/stdout through `tower-lsp`.

pub mod diagnostics;
pub mod locate;
pub mod position;
pub mod resolve;
pub mod server;
pub mod session;

use antlr4ls_tool::Tool;
use tower_lsp::{LspService, Server};

use server::Antlr4Backend;

/// Run the language server on stdin/stdout until the client exits.
pub async fn run_server(tool: Tool) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Antlr4Backend::with_tool(client, tool));
    Server::new(stdin, stdout, socket).serve(service).await;
}
