//! slabtree benchmarking suite
//!
//! Sample documents shared by the criterion benches.

pub use slabtree::{Arena, ArenaConfig, Error, Node, Result};

pub const SMALL_JSON: &str = r#"{"id": 1, "name": "test", "status": "active"}"#;

pub const MEDIUM_JSON: &str = r#"{
  "agent": {
    "name": "scout",
    "state": "thinking",
    "llm": {
      "endpoint": "http://localhost:1234/v1/chat/completions",
      "model": "local",
      "temperature": 0.7
    },
    "tools": ["search", "memory_add", "memory_remove"],
    "working_memory": [
      {"key": "goal", "value": "summarize the report", "priority": 1},
      {"key": "next", "value": "read section 2", "priority": 2}
    ]
  }
}"#;

pub const MEDIUM_XML: &str = r#"<agent>
  <action>
    <type>working_memory_add</type>
    <tags>plan, todo</tags>
    <value><![CDATA[read section 2 & summarize]]></value>
  </action>
  <reasoning>The report has &lt;3&gt; sections; section 1 is done.</reasoning>
</agent>"#;

/// A list of `items` records, each with nested metadata
pub fn generate_large_json(items: usize) -> String {
    let records: Vec<String> = (0..items)
        .map(|i| {
            format!(
                r#"{{"id": {i}, "name": "Item {i}", "description": "This is item number {i} with some content", "price": {:.2}, "active": {}, "metadata": {{"created": "2024-01-01T10:30:00Z", "tags": ["tag1", "tag2", "tag3"]}}}}"#,
                i as f64 * 1.5 + 10.0,
                i % 2 == 0
            )
        })
        .collect();
    format!(
        r#"{{"data": [{}], "total": {items}, "page": 1}}"#,
        records.join(",")
    )
}

/// Arena large enough for the biggest generated document
pub fn bench_arena() -> Result<Arena> {
    Arena::new(ArenaConfig::high_capacity())
}
