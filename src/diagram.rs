//! Mermaid rendering of an entity resolution graph, for debugging only.

use std::fmt::Write;

use crate::erg::EntityResolutionGraph;

/// Controls how much of the provenance ends up in the diagram.
#[derive(Debug, Clone)]
pub struct DiagramOptions {
    /// Draw one leaf node per constituent mention.
    pub show_mentions: bool,
    /// Cap on mention leaves per entity; the rest collapse into one node.
    pub max_mentions: usize,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            show_mentions: true,
            max_mentions: 10,
        }
    }
}

/// Escape text for use inside a quoted Mermaid label.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("#quot;"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Render `erg` as Mermaid `graph TD` text.
pub fn render(erg: &EntityResolutionGraph, options: &DiagramOptions) -> String {
    let mut out = String::from("graph TD\n");
    for (i, canonical) in erg.canonical_ids().iter().enumerate() {
        let mentions = erg.mentions_for_entity(canonical);
        let text = erg.canonical_text(canonical).unwrap_or(canonical);
        let _ = writeln!(
            out,
            "    e{i}[\"{}<br/>{} ({} mentions)\"]",
            escape(text),
            escape(canonical),
            mentions.len()
        );

        if !options.show_mentions {
            continue;
        }
        for (j, record) in mentions.iter().take(options.max_mentions).enumerate() {
            let _ = writeln!(
                out,
                "    e{i} -->|chunk {}| e{i}m{j}([\"{}: {}\"])",
                record.chunk_index,
                escape(&record.mention_id),
                escape(&record.text)
            );
        }
        let hidden = mentions.len().saturating_sub(options.max_mentions);
        if hidden > 0 {
            let _ = writeln!(out, "    e{i} --> e{i}more([\"+{hidden} more\"])");
        }
    }
    out
}
