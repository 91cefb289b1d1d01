use crate::types::tool::{ToolCall, ToolCallDelta};

#[derive(Debug)]
struct PendingCall {
    index: u32,
    id: String,
    name: String,
    arguments: String,
}

/// Collects streamed tool call deltas into final ToolCall objects.
///
/// Deltas are keyed by `index`: the first delta for an index carries the id and
/// name, later ones only argument fragments. Arguments that fail to parse as
/// JSON are kept as the raw string.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    calls: Vec<PendingCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_delta(&mut self, delta: &ToolCallDelta) {
        let pos = match self.calls.iter().position(|c| c.index == delta.index) {
            Some(pos) => pos,
            None => {
                self.calls.push(PendingCall {
                    index: delta.index,
                    id: String::new(),
                    name: String::new(),
                    arguments: String::new(),
                });
                self.calls.len() - 1
            }
        };
        let call = &mut self.calls[pos];
        if let Some(id) = &delta.id {
            if call.id.is_empty() {
                call.id = id.clone();
            }
        }
        if let Some(name) = &delta.name {
            call.name.push_str(name);
        }
        if let Some(args) = &delta.arguments {
            call.arguments.push_str(args);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn finalize(mut self) -> Vec<ToolCall> {
        self.calls.sort_by_key(|c| c.index);
        self.calls
            .into_iter()
            .map(|c| {
                let trimmed = c.arguments.trim();
                let arguments = if trimmed.is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(trimmed)
                        .unwrap_or_else(|_| serde_json::Value::String(c.arguments.clone()))
                };
                ToolCall {
                    id: c.id,
                    name: c.name,
                    arguments,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(index: u32, id: Option<&str>, name: Option<&str>, args: &str) -> ToolCallDelta {
        ToolCallDelta {
            index,
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            arguments: Some(args.to_string()),
        }
    }

    #[test]
    fn test_assembles_fragments_by_index() {
        let mut asm = ToolCallAssembler::new();
        asm.on_delta(&delta(0, Some("call_a"), Some("get_weather"), ""));
        asm.on_delta(&delta(1, Some("call_b"), Some("search"), "{\"q\":"));
        asm.on_delta(&delta(0, None, None, "{\"location\":"));
        asm.on_delta(&delta(1, None, None, "\"rust\"}"));
        asm.on_delta(&delta(0, None, None, "\"Tokyo\"}"));

        let calls = asm.finalize();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].arguments, json!({"location": "Tokyo"}));
        assert_eq!(calls[1].name, "search");
        assert_eq!(calls[1].arguments, json!({"q": "rust"}));
    }

    #[test]
    fn test_malformed_arguments_kept_raw() {
        let mut asm = ToolCallAssembler::new();
        asm.on_delta(&delta(0, Some("c"), Some("f"), "{\"broken\":"));
        let calls = asm.finalize();
        assert_eq!(calls[0].arguments, json!("{\"broken\":"));
    }
}
