//! Theme store.
//!
//! A theme is a nested JSON-like value (scales, colors, breakpoints) that
//! rules and variants consult while producing CSS. Presets contribute
//! partial themes which are deep-merged in preset order:
//!
//! - objects merge key by key, recursively
//! - arrays concatenate, unless [`ThemeMerge::Replace`] is selected
//! - anything else is replaced by the later value
//!
//! ```
//! use atomcss::theme::{Theme, ThemeMerge};
//! use serde_json::json;
//!
//! let mut theme = Theme::from_value(json!({ "colors": { "red": { "500": "#ef4444" } } })).unwrap();
//! theme.merge(&json!({ "colors": { "red": { "600": "#dc2626" } } }), ThemeMerge::Concat);
//!
//! assert_eq!(theme.get_str("colors.red.500"), Some("#ef4444"));
//! assert_eq!(theme.lookup("colors", "red-600").and_then(|v| v.as_str()), Some("#dc2626"));
//! ```

use serde_json::{Map, Value};

use crate::error::{AtomError, Result};

/// How array-valued leaves combine when themes merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMerge {
    /// Arrays from later themes are appended.
    #[default]
    Concat,
    /// Arrays from later themes replace earlier ones.
    Replace,
}

/// The merged theme of a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    root: Value,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// Creates an empty theme.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wraps a value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        check_shape(&value)?;
        Ok(Self { root: value })
    }

    /// Returns the underlying value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Looks up a dot-separated path such as `breakpoints.sm`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Looks up a dot-separated path that must hold a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Sets a dot-separated path, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut node = &mut self.root;
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        for segment in parents {
            if !node.get(*segment).is_some_and(Value::is_object) {
                if let Value::Object(map) = &mut *node {
                    map.insert(segment.to_string(), Value::Object(Map::new()));
                }
            }
            node = match node.get_mut(*segment) {
                Some(next) => next,
                None => return,
            };
        }
        if let Value::Object(map) = &mut *node {
            map.insert(last.to_string(), value);
        }
    }

    /// Resolves a dash-separated key below a section.
    ///
    /// Token values name theme entries with dashes (`red-500`,
    /// `light-blue-300`) while the theme nests them (`red.500`) or keeps
    /// dashed keys (`light-blue`). Every split of the key is tried, longest
    /// leading key first. An object reached with no key left resolves to its
    /// `DEFAULT` entry.
    pub fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        let parts: Vec<&str> = key.split('-').collect();
        lookup_dashed(self.get(section)?, &parts)
    }

    /// Merges another theme value on top of this one.
    pub fn merge(&mut self, overlay: &Value, mode: ThemeMerge) {
        deep_merge(&mut self.root, overlay, mode);
    }
}

fn lookup_dashed<'a>(node: &'a Value, parts: &[&str]) -> Option<&'a Value> {
    if parts.is_empty() {
        return match node {
            Value::Object(map) => map.get("DEFAULT"),
            other => Some(other),
        };
    }
    let map = node.as_object()?;
    for split in (1..=parts.len()).rev() {
        let key = parts[..split].join("-");
        if let Some(child) = map.get(&key) {
            if let Some(found) = lookup_dashed(child, &parts[split..]) {
                return Some(found);
            }
        }
    }
    None
}

/// Rejects theme values whose root is not an object.
pub fn check_shape(value: &Value) -> Result<()> {
    if value.is_object() {
        return Ok(());
    }
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    Err(AtomError::InvalidTheme(kind.to_string()))
}

/// Deep-merges `overlay` into `base`.
pub fn deep_merge(base: &mut Value, overlay: &Value, mode: ThemeMerge) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value, mode),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) if mode == ThemeMerge::Concat => {
            base_items.extend(overlay_items.iter().cloned());
        }
        (slot, value) => *slot = value.clone(),
    }
}
