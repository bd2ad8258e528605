//! Depth-limited object merging.
//!
//! At depth 0 every key of the source replaces the key in the target. At
//! depth `n > 0` a mapping-valued key is opened one level: its scalar
//! children are set, its mapping children are merged at depth `n - 1`.
//! Overwritten keys keep their original position.

use crate::codec::{Mapping, Value};

/// Depth used by the engine unless settings override it.
pub const DEFAULT_MERGE_DEPTH: usize = 1;

/// Merge `source` into `target` and return the result.
pub fn merge_mapping(mut target: Mapping, source: &Mapping, depth: usize) -> Mapping {
    for (key, value) in source {
        match value {
            Value::Mapping(inner) if depth > 0 => {
                let mut nested = take_mapping(&mut target, key);
                for (k, v) in inner {
                    let merged = match v {
                        Value::Mapping(m) => {
                            Value::Mapping(merge_mapping(take_mapping(&mut nested, k), m, depth - 1))
                        }
                        other => other.clone(),
                    };
                    nested.insert(k.clone(), merged);
                }
                target.insert(key.clone(), Value::Mapping(nested));
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
    target
}

/// Merge every source into `base`, left to right.
pub fn merge_objects<'a, I>(base: Mapping, sources: I, depth: usize) -> Mapping
where
    I: IntoIterator<Item = &'a Mapping>,
{
    sources
        .into_iter()
        .fold(base, |acc, source| merge_mapping(acc, source, depth))
}

/// Move the mapping stored at `key` out of `map`. Anything else yields an
/// empty mapping; the slot keeps its position until it is overwritten.
fn take_mapping(map: &mut Mapping, key: &str) -> Mapping {
    match map.get_mut(key).map(std::mem::take) {
        Some(Value::Mapping(m)) => m,
        _ => Mapping::new(),
    }
}
