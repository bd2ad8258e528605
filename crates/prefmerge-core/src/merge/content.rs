//! Folding parsed sources into a single document.
//!
//! Structured sources are merged while the accumulator is a mapping. The
//! first text source, a null value, or a text output switches to the
//! concatenating strategy: the accumulator becomes a string and every
//! later fragment is appended as a JSON literal. Appending a structured
//! fragment to a string accumulator first re-encodes the accumulator
//! itself, so earlier fragments end up escaped once more per step.

use crate::codec::{self, Mapping, OutputType, Value};
use crate::core::{PrefMergeError, Result};
use crate::merge::object::merge_mapping;
use crate::merge::target::MergeSource;

/// Running merge result.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Map(Mapping),
    Text(String),
}

/// Folds `(source, text)` pairs in source order.
#[derive(Debug)]
pub struct MergeContent {
    acc: Accumulator,
    output: OutputType,
    depth: usize,
    indent: usize,
    warnings: Vec<String>,
}

impl MergeContent {
    pub fn new(output: OutputType, depth: usize, indent: usize) -> Self {
        let acc = if output.is_text() {
            Accumulator::Text(String::new())
        } else {
            Accumulator::Map(Mapping::new())
        };
        Self {
            acc,
            output,
            depth,
            indent,
            warnings: Vec::new(),
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.acc
    }

    /// Non-fatal warnings raised so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Parse `text` as `source` declares and fold it in.
    pub fn push(&mut self, source: &MergeSource, text: &str) -> Result<()> {
        let value = codec::parse_named(&source.path, text, source.doc_type)?;
        let acc = std::mem::replace(&mut self.acc, Accumulator::Text(String::new()));

        self.acc = if source.doc_type.is_text() {
            let mut out = match acc {
                Accumulator::Map(m) => {
                    self.concatenating(source, false);
                    if m.is_empty() {
                        String::new()
                    } else {
                        codec::stringify(&Value::Mapping(m))?
                    }
                }
                Accumulator::Text(s) => s,
            };
            out.push_str(&codec::stringify(&value)?);
            Accumulator::Text(out)
        } else {
            match (acc, value) {
                (Accumulator::Map(m), v @ (Value::Mapping(_) | Value::Sequence(_))) => {
                    let incoming = v.into_mapping().unwrap_or_default();
                    Accumulator::Map(merge_mapping(m, &incoming, self.depth))
                }
                (acc @ Accumulator::Text(_), v) | (acc, v @ Value::Null) => {
                    self.concatenating(source, matches!(v, Value::Null));
                    let mut out = match acc {
                        Accumulator::Map(m) => codec::to_json_pretty(&Value::Mapping(m), self.indent)?,
                        Accumulator::Text(s) => codec::stringify(&Value::String(s))?,
                    };
                    out.push_str(&codec::stringify(&v)?);
                    Accumulator::Text(out)
                }
                (_, v) => {
                    return Err(PrefMergeError::MergeType(format!(
                        "{} from \"{}\" into an object",
                        v.type_name(),
                        source.path
                    )))
                }
            }
        };
        Ok(())
    }

    /// Serialize the accumulator as the output type.
    pub fn finish(self) -> Result<String> {
        let value = match self.acc {
            Accumulator::Map(m) => Value::Mapping(m),
            Accumulator::Text(s) => Value::String(s),
        };
        codec::serialize(&value, self.output, self.indent)
    }

    fn concatenating(&mut self, source: &MergeSource, null: bool) {
        if !self.warnings.is_empty() {
            return;
        }
        let message = if null {
            format!(
                "Source \"{}\" is null; concatenating merge strategy will be used.",
                source.path
            )
        } else {
            format!(
                "Source with type='{}' found when output has type='{}'. Concatenating merge strategy will be used.",
                source.doc_type, self.output
            )
        };
        tracing::warn!("[Pipeline] {}", message);
        self.warnings.push(message);
    }
}
