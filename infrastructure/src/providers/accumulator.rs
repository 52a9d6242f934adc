//! Reassembly of tool calls streamed as argument fragments

use std::collections::BTreeMap;

use toolgate_domain::ToolCall;

/// One in-flight tool call
#[derive(Debug, Default, Clone)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

/// Per-index tool call state shared by the streaming normalizers.
///
/// Each vendor identifies in-flight calls by a positional index (content
/// block, tool call slot). `start` opens a slot, `append` adds argument
/// text, `finish` parses and closes it.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: BTreeMap<usize, PendingCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reset) the slot at `index`.
    pub fn start(&mut self, index: usize, id: &str, name: &str) {
        self.pending.insert(
            index,
            PendingCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: String::new(),
            },
        );
    }

    /// Fill in id/name that arrive on a later delta. Empty values are ignored.
    pub fn identify(&mut self, index: usize, id: Option<&str>, name: Option<&str>) {
        let call = self.pending.entry(index).or_default();
        if let Some(id) = id.filter(|s| !s.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(name) = name.filter(|s| !s.is_empty()) {
            call.name = name.to_string();
        }
    }

    /// Append an argument fragment, opening the slot if needed.
    pub fn append(&mut self, index: usize, fragment: &str) {
        self.pending
            .entry(index)
            .or_default()
            .arguments
            .push_str(fragment);
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.pending.contains_key(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Finalize the call at `index`, if one is open.
    pub fn finish(&mut self, index: usize) -> Option<ToolCall> {
        self.pending.remove(&index).map(finalize)
    }

    /// Finalize every open call in index order.
    pub fn finish_all(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.pending)
            .into_values()
            .map(finalize)
            .collect()
    }
}

fn finalize(call: PendingCall) -> ToolCall {
    ToolCall::new(call.id, call.name.clone(), parse_arguments(&call.name, &call.arguments))
}

/// Parse accumulated argument text. Empty text becomes `{}`.
///
/// Unparseable text also becomes `{}` so the tool rejects it as invalid
/// input instead of the whole stream failing.
pub fn parse_arguments(tool: &str, text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::json!({});
    }
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(tool = %tool, error = %e, "Discarding malformed tool arguments");
            serde_json::json!({})
        }
    }
}
