// petit-compiler/src/codegen/pool.rs
// Branch labels and the string literal pool

use std::collections::HashMap;

/// Issues `L1`, `L2`, ... for the whole generation run.
#[derive(Debug, Default)]
pub struct LabelPool {
    counter: usize,
}

impl LabelPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> String {
        self.counter += 1;
        format!("L{}", self.counter)
    }

    pub fn issued(&self) -> usize {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// Deduplicated string literals, kept in first-seen order.
#[derive(Debug, Default)]
pub struct StringPool {
    labels: HashMap<String, usize>,
    entries: Vec<(String, String)>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for `value`, allocating `str_<n>` on first sight.
    pub fn intern(&mut self, value: &str) -> String {
        if let Some(index) = self.labels.get(value) {
            return self.entries[*index].0.clone();
        }
        let label = format!("str_{}", self.entries.len());
        self.labels.insert(value.to_string(), self.entries.len());
        self.entries.push((label.clone(), value.to_string()));
        label
    }

    /// `(label, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.labels.clear();
        self.entries.clear();
    }
}

/// Escape a literal for an `.asciz` directive.
pub fn escape_asciz(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out
}
