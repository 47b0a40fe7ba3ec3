use crate::message::{Severity, ToolMessage};

/// Receives everything the tool reports while parsing and analyzing.
pub trait ToolListener {
    /// Progress notes such as loaded imports. Ignored unless overridden.
    fn info(&mut self, _message: &str) {}

    fn error(&mut self, message: &ToolMessage);

    fn warning(&mut self, message: &ToolMessage);
}

/// Route a message to `error` or `warning` by its severity.
pub(crate) fn emit(listener: &mut dyn ToolListener, message: ToolMessage) {
    match message.severity() {
        Severity::Error => listener.error(&message),
        Severity::Warning => listener.warning(&message),
    }
}

/// A listener that keeps every message in emission order.
#[derive(Debug, Default, Clone)]
pub struct MessageCollector {
    pub messages: Vec<ToolMessage>,
    pub infos: Vec<String>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ToolMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ToolMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl ToolListener for MessageCollector {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn error(&mut self, message: &ToolMessage) {
        self.messages.push(message.clone());
    }

    fn warning(&mut self, message: &ToolMessage) {
        self.messages.push(message.clone());
    }
}
