//! Capability table for formatters and sorters.
//!
//! Column definitions name their formatter/sorter either by registered name
//! or with a closure. The table is built once when the grid is constructed;
//! each column resolves its spec to a plain callable at initialization, so
//! rendering and sorting never dispatch on the definition shape again.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::data::record::value_to_text;
use crate::error::{GridError, Result};

pub type FormatterFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;
pub type SorterFn = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// How a column formats its cell values
#[derive(Clone)]
pub enum FormatterSpec {
    Named(String),
    Custom(FormatterFn),
}

/// How a column compares its cell values
#[derive(Clone)]
pub enum SorterSpec {
    Named(String),
    Custom(SorterFn),
}

impl Default for FormatterSpec {
    fn default() -> Self {
        FormatterSpec::Named("plaintext".to_string())
    }
}

impl Default for SorterSpec {
    fn default() -> Self {
        SorterSpec::Named("string".to_string())
    }
}

impl fmt::Debug for FormatterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterSpec::Named(name) => write!(f, "Named({name})"),
            FormatterSpec::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl fmt::Debug for SorterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SorterSpec::Named(name) => write!(f, "Named({name})"),
            SorterSpec::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Name to implementation mapping, built at grid construction
#[derive(Clone)]
pub struct Capabilities {
    formatters: HashMap<String, FormatterFn>,
    sorters: HashMap<String, SorterFn>,
}

impl Capabilities {
    /// An empty table with nothing registered
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
            sorters: HashMap::new(),
        }
    }

    /// The built-in formatters and sorters
    pub fn builtin() -> Self {
        let mut caps = Self::empty();

        caps.register_formatter("plaintext", value_to_text);
        caps.register_formatter("money", format_money);
        caps.register_formatter("tickCross", |v| {
            if is_truthy(v) {
                "✔".to_string()
            } else {
                "✘".to_string()
            }
        });
        caps.register_formatter("uppercase", |v| value_to_text(v).to_uppercase());

        caps.register_sorter("string", compare_string);
        caps.register_sorter("number", compare_number);
        caps.register_sorter("alphanum", compare_alphanum);
        caps.register_sorter("boolean", |a, b| is_truthy(a).cmp(&is_truthy(b)));

        caps
    }

    pub fn register_formatter<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.formatters.insert(name.to_string(), Arc::new(f));
    }

    pub fn register_sorter<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        self.sorters.insert(name.to_string(), Arc::new(f));
    }

    pub fn resolve_formatter(&self, spec: &FormatterSpec) -> Result<FormatterFn> {
        match spec {
            FormatterSpec::Custom(f) => Ok(f.clone()),
            FormatterSpec::Named(name) => {
                self.formatters
                    .get(name)
                    .cloned()
                    .ok_or_else(|| GridError::UnknownCapability {
                        kind: "formatter",
                        name: name.clone(),
                    })
            }
        }
    }

    pub fn resolve_sorter(&self, spec: &SorterSpec) -> Result<SorterFn> {
        match spec {
            SorterSpec::Custom(f) => Ok(f.clone()),
            SorterSpec::Named(name) => {
                self.sorters
                    .get(name)
                    .cloned()
                    .ok_or_else(|| GridError::UnknownCapability {
                        kind: "sorter",
                        name: name.clone(),
                    })
            }
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1" | "y"),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn format_money(value: &Value) -> String {
    let Some(number) = as_number(value) else {
        return value_to_text(value);
    };

    let negative = number < 0.0;
    let fixed = format!("{:.2}", number.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// Case-insensitive text comparison, empty values first
pub fn compare_string(a: &Value, b: &Value) -> Ordering {
    let a = value_to_text(a).to_lowercase();
    let b = value_to_text(b).to_lowercase();
    a.cmp(&b)
}

/// Numeric comparison; values that are not numbers sort before numbers
pub fn compare_number(a: &Value, b: &Value) -> Ordering {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Natural ordering: digit runs compare numerically ("row2" < "row10")
pub fn compare_alphanum(a: &Value, b: &Value) -> Ordering {
    let a = value_to_text(a).to_lowercase();
    let b = value_to_text(b).to_lowercase();
    let chunks_a = alphanum_chunks(&a);
    let chunks_b = alphanum_chunks(&b);

    for (x, y) in chunks_a.iter().zip(chunks_b.iter()) {
        let ord = match (x.parse::<u128>(), y.parse::<u128>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny).then_with(|| x.len().cmp(&y.len())),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    chunks_a.len().cmp(&chunks_b.len())
}

fn alphanum_chunks(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut last_digit: Option<bool> = None;

    for (i, ch) in s.char_indices() {
        let digit = ch.is_ascii_digit();
        if let Some(prev) = last_digit {
            if prev != digit {
                chunks.push(&s[start..i]);
                start = i;
            }
        }
        last_digit = Some(digit);
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_resolution() {
        let caps = Capabilities::builtin();
        let money = caps
            .resolve_formatter(&FormatterSpec::Named("money".to_string()))
            .unwrap();
        assert_eq!(money(&json!(1234567.5)), "1,234,567.50");
        assert_eq!(money(&json!(-12)), "-12.00");
        assert_eq!(money(&json!("n/a")), "n/a");
    }

    #[test]
    fn test_unknown_capability() {
        let caps = Capabilities::builtin();
        let err = caps
            .resolve_sorter(&SorterSpec::Named("nope".to_string()))
            .err()
            .unwrap();
        assert!(matches!(err, GridError::UnknownCapability { kind: "sorter", .. }));
    }

    #[test]
    fn test_custom_passthrough() {
        let caps = Capabilities::empty();
        let f = caps
            .resolve_formatter(&FormatterSpec::Custom(Arc::new(|_| "x".to_string())))
            .unwrap();
        assert_eq!(f(&json!(1)), "x");
    }

    #[test]
    fn test_sorters() {
        assert_eq!(compare_number(&json!("10"), &json!(9)), Ordering::Greater);
        assert_eq!(compare_number(&json!(null), &json!(1)), Ordering::Less);
        assert_eq!(compare_string(&json!("b"), &json!("A")), Ordering::Greater);
        assert_eq!(
            compare_alphanum(&json!("row2"), &json!("row10")),
            Ordering::Less
        );
        assert_eq!(compare_alphanum(&json!("a"), &json!("a1")), Ordering::Less);
    }
}
