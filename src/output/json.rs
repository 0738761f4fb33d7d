use super::{Delta, Formatter};

/// One delta per line as compact JSON
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, delta: &Delta) -> String {
        serde_json::to_string(delta).unwrap_or_else(|e| {
            log::error!("Failed to serialize delta: {}", e);
            String::new()
        })
    }
}
