// petit-compiler/src/verify.rs
// Label integrity check over emitted assembly text

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("label `{label}` defined twice (lines {first} and {second})")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },
    #[error("branch on line {line} targets undefined label `{label}`")]
    UndefinedTarget { label: String, line: usize },
}

/// Labels found in a piece of assembly text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    /// Defined labels in text order.
    pub definitions: Vec<String>,
    /// Every branch or call target in text order, repeats included.
    pub references: Vec<String>,
}

impl LabelReport {
    pub fn is_defined(&self, label: &str) -> bool {
        self.definitions.iter().any(|l| l == label)
    }

    /// Number of branch sites targeting `label`.
    pub fn reference_count(&self, label: &str) -> usize {
        self.references.iter().filter(|l| *l == label).count()
    }
}

// Label definition at column 0, e.g. `L3:` or `_main:`
static RE_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_.$][\w.$]*):\s*$").unwrap());

// Unconditional and conditional branches plus calls, both syntaxes
static RE_BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:b|bl|beq|bne|jmp|jz|jnz|je|jne|call)\s+([A-Za-z_.$][\w.$]*)\s*$").unwrap()
});

// Compare-and-branch, e.g. `cbz x0, L1`
static RE_CBZ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^cbn?z\s+[wx]\d+,\s*([A-Za-z_.$][\w.$]*)\s*$").unwrap()
});

/// Check that every label is defined once and every branch target exists.
pub fn check_labels(asm: &str) -> Result<LabelReport, VerifyError> {
    let mut report = LabelReport::default();
    let mut defined_at: HashMap<&str, usize> = HashMap::new();
    let mut targets: Vec<(&str, usize)> = Vec::new();

    for (index, raw) in asm.lines().enumerate() {
        let line_no = index + 1;

        if let Some(caps) = RE_DEF.captures(raw) {
            if let Some(label) = caps.get(1) {
                let label = label.as_str();
                if let Some(&first) = defined_at.get(label) {
                    return Err(VerifyError::DuplicateLabel {
                        label: label.to_string(),
                        first,
                        second: line_no,
                    });
                }
                defined_at.insert(label, line_no);
                report.definitions.push(label.to_string());
            }
            continue;
        }

        let line = raw.trim();
        let target = RE_BRANCH
            .captures(line)
            .or_else(|| RE_CBZ.captures(line))
            .and_then(|caps| caps.get(1));
        if let Some(target) = target {
            targets.push((target.as_str(), line_no));
            report.references.push(target.as_str().to_string());
        }
    }

    for (label, line) in targets {
        if !defined_at.contains_key(label) {
            return Err(VerifyError::UndefinedTarget {
                label: label.to_string(),
                line,
            });
        }
    }

    Ok(report)
}
