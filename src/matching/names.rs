// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Object-name normalization and the per-run name translation context

use ahash::AHashMap;

/// Strip trailing variant decorations from an object name.
///
/// Removes, repeatedly, numeric duplicate suffixes (`.001`, `_2`), variant
/// markers (`+`) and surrounding whitespace: `"Hair+.001"` -> `"Hair"`.
pub fn strip_decorations(name: &str) -> &str {
    let mut current = name.trim_end();
    loop {
        let before = current.len();
        current = current.trim_end_matches('+').trim_end();
        current = strip_numeric_suffix(current, '.');
        current = strip_numeric_suffix(current, '_');
        if current.len() == before {
            break;
        }
    }
    if current.is_empty() {
        name
    } else {
        current
    }
}

fn strip_numeric_suffix(name: &str, separator: char) -> &str {
    match name.rfind(separator) {
        Some(pos) if pos > 0 => {
            let digits = &name[pos + separator.len_utf8()..];
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                &name[..pos]
            } else {
                name
            }
        }
        _ => name,
    }
}

/// Bidirectional source-name / target-name table for one run
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    source_to_target: AHashMap<String, String>,
    target_to_source: AHashMap<String, String>,
}

impl NameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        self.source_to_target.insert(source.clone(), target.clone());
        self.target_to_source.insert(target, source);
    }

    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.source_to_target.get(source).map(String::as_str)
    }

    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.target_to_source.get(target).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.source_to_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_to_target.is_empty()
    }
}
