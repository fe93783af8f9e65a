//! Rust source rendering of artifact specs.
//!
//! The rendered source is a readable view of what an artifact exposes: a
//! struct with one optional slot per entry, the strongly named accessors and
//! the name-driven `exists`/`isset`/`unset` dispatch. It is not compiled by
//! cfgen itself.

use std::fmt::Write;

use cfgen_schema::{ScalarType, Value};

use crate::artifact::{AccessorOp, ArtifactSpec, EntryKind, EntrySpec};

/// Banner placed at the top of every rendered file.
pub const GENERATED_BANNER: &str = "THIS IS AN AUTOMATICALLY GENERATED FILE, PLEASE DO NOT MODIFY IT. \
YOU MAY SAFELY DELETE THE FILE AS IT WILL BE REGENERATED ON-DEMAND.";

/// Renders one artifact spec as Rust source.
pub fn render_rust(spec: &ArtifactSpec) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_artifact(&mut out, spec);
    out
}

fn write_artifact(out: &mut String, spec: &ArtifactSpec) -> std::fmt::Result {
    writeln!(out, "// {GENERATED_BANNER}")?;
    writeln!(out, "//")?;
    writeln!(out, "// artifact: {}", spec.canonical_name)?;
    writeln!(out, "// subject:  {}", spec.subject)?;
    if let Some(parent) = &spec.parent {
        writeln!(out, "// parent:   {parent}")?;
    }
    writeln!(out)?;

    writeln!(out, "#[allow(non_camel_case_types)]")?;
    writeln!(out, "#[derive(Debug, Clone, Default)]")?;
    writeln!(out, "pub struct {} {{", spec.name)?;
    for entry in &spec.entries {
        writeln!(out, "    {}: Option<{}>,", field(&entry.key), slot_type(&entry.kind))?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl {} {{", spec.name)?;
    for entry in &spec.entries {
        for accessor in &entry.accessors {
            write_accessor(out, entry, &accessor.name, accessor.op)?;
        }
    }
    write_dispatch(out, spec)?;
    writeln!(out, "}}")
}

fn write_accessor(
    out: &mut String,
    entry: &EntrySpec,
    method: &str,
    op: AccessorOp,
) -> std::fmt::Result {
    let f = field(&entry.key);
    match (&entry.kind, op) {
        (EntryKind::Config { artifact }, AccessorOp::Get) => {
            let child = short_name(artifact);
            writeln!(out, "    pub fn {method}(&mut self) -> &mut {child} {{")?;
            writeln!(out, "        self.{f}.get_or_insert_with(Default::default)")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::Config { .. }, AccessorOp::Isset) => {
            writeln!(out, "    pub fn {method}(&self) -> bool {{")?;
            writeln!(out, "        // config is immutable")?;
            writeln!(out, "        true")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::Config { .. }, AccessorOp::Set | AccessorOp::Unset) => {
            writeln!(out, "    pub fn {method}(&mut self) -> &mut Self {{")?;
            writeln!(out, "        // config is immutable")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (kind, AccessorOp::Get) => {
            let ty = slot_type(kind);
            writeln!(out, "    pub fn {method}(&self) -> Option<{ty}> {{")?;
            match default_literal(kind) {
                Some(default) => writeln!(
                    out,
                    "        self.{f}.clone().or_else(|| Some({default}))"
                )?,
                None => writeln!(out, "        self.{f}.clone()")?,
            }
            writeln!(out, "    }}")?;
        }
        (EntryKind::Scalar { ty, .. }, AccessorOp::Set) => {
            writeln!(out, "    pub fn {method}(&mut self, value: {}) -> &mut Self {{", rust_type(ty))?;
            writeln!(out, "        self.{f} = Some(value);")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (kind @ (EntryKind::List { .. } | EntryKind::Map { .. }), AccessorOp::Set) => {
            writeln!(out, "    pub fn {method}(&mut self, values: {}) -> &mut Self {{", slot_type(kind))?;
            writeln!(out, "        self.{f} = (!values.is_empty()).then_some(values);")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (_, AccessorOp::Isset) => {
            writeln!(out, "    pub fn {method}(&self) -> bool {{")?;
            writeln!(out, "        self.{f}.is_some()")?;
            writeln!(out, "    }}")?;
        }
        (_, AccessorOp::Unset | AccessorOp::Clear) => {
            writeln!(out, "    pub fn {method}(&mut self) -> &mut Self {{")?;
            writeln!(out, "        self.{f} = None;")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::List { element, .. }, AccessorOp::GetAt) => {
            writeln!(out, "    pub fn {method}(&self, index: usize) -> Option<{}> {{", rust_type(element))?;
            writeln!(out, "        self.{f}.as_ref()?.get(index).cloned()")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::List { element, .. }, AccessorOp::SetAt) => {
            writeln!(
                out,
                "    pub fn {method}(&mut self, index: usize, value: {}) -> &mut Self {{",
                rust_type(element)
            )?;
            writeln!(out, "        let len = self.{f}.as_ref().map_or(0, Vec::len);")?;
            writeln!(out, "        if index > len {{")?;
            writeln!(out, "            return self;")?;
            writeln!(out, "        }}")?;
            writeln!(out, "        let items = self.{f}.get_or_insert_with(Vec::new);")?;
            writeln!(out, "        if index == len {{")?;
            writeln!(out, "            items.push(value);")?;
            writeln!(out, "        }} else {{")?;
            writeln!(out, "            items[index] = value;")?;
            writeln!(out, "        }}")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::List { element, .. }, AccessorOp::Push | AccessorOp::Unshift) => {
            let insert = if op == AccessorOp::Push {
                "push(value)"
            } else {
                "insert(0, value)"
            };
            writeln!(out, "    pub fn {method}(&mut self, value: {}) -> &mut Self {{", rust_type(element))?;
            writeln!(out, "        self.{f}.get_or_insert_with(Vec::new).{insert};")?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::List { element, .. }, AccessorOp::Pop) => {
            writeln!(out, "    pub fn {method}(&mut self) -> Option<{}> {{", rust_type(element))?;
            writeln!(out, "        self.{f}.as_mut()?.pop()")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::List { element, .. }, AccessorOp::Shift) => {
            writeln!(out, "    pub fn {method}(&mut self) -> Option<{}> {{", rust_type(element))?;
            writeln!(out, "        let items = self.{f}.as_mut()?;")?;
            writeln!(out, "        (!items.is_empty()).then(|| items.remove(0))")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::Map { element, .. }, AccessorOp::GetAt) => {
            writeln!(out, "    pub fn {method}(&self, key: &str) -> Option<{}> {{", rust_type(element))?;
            writeln!(out, "        self.{f}.as_ref()?.get(key).cloned()")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::Map { element, .. }, AccessorOp::SetAt) => {
            writeln!(
                out,
                "    pub fn {method}(&mut self, key: impl Into<String>, value: {}) -> &mut Self {{",
                rust_type(element)
            )?;
            writeln!(
                out,
                "        self.{f}.get_or_insert_with(Default::default).insert(key.into(), value);"
            )?;
            writeln!(out, "        self")?;
            writeln!(out, "    }}")?;
        }
        (EntryKind::Map { element, .. }, AccessorOp::RemoveAt) => {
            writeln!(out, "    pub fn {method}(&mut self, key: &str) -> Option<{}> {{", rust_type(element))?;
            writeln!(out, "        self.{f}.as_mut()?.shift_remove(key)")?;
            writeln!(out, "    }}")?;
        }
        // The compiler never pairs these ops with these kinds.
        (kind, op) => {
            writeln!(out, "    // {method}: {op:?} is not available on {} entries", kind.name())?;
        }
    }
    writeln!(out)
}

fn write_dispatch(out: &mut String, spec: &ArtifactSpec) -> std::fmt::Result {
    writeln!(out, "    pub fn exists(&self, key: &str) -> bool {{")?;
    if spec.entries.is_empty() {
        writeln!(out, "        let _ = key;")?;
        writeln!(out, "        false")?;
    } else {
        let keys: Vec<String> = spec.entries.iter().map(|e| format!("{:?}", e.key)).collect();
        writeln!(out, "        matches!(key, {})", keys.join(" | "))?;
    }
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(out, "    pub fn isset(&self, key: &str) -> bool {{")?;
    writeln!(out, "        match key {{")?;
    for entry in &spec.entries {
        if let Some(method) = method_for(entry, AccessorOp::Isset) {
            writeln!(out, "            {:?} => self.{method}(),", entry.key)?;
        }
    }
    writeln!(out, "            _ => false,")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(out, "    pub fn unset(&mut self, key: &str) -> &mut Self {{")?;
    writeln!(out, "        match key {{")?;
    for entry in &spec.entries {
        if let Some(method) = method_for(entry, AccessorOp::Unset) {
            writeln!(out, "            {:?} => self.{method}(),", entry.key)?;
        }
    }
    writeln!(out, "            _ => self,")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")
}

fn method_for(entry: &EntrySpec, op: AccessorOp) -> Option<&str> {
    entry
        .accessors
        .iter()
        .find(|a| a.op == op)
        .map(|a| a.name.as_str())
}

fn field(key: &str) -> String {
    let ident: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else if matches!(ident.as_str(), "self" | "Self" | "super" | "crate" | "_") {
        // Not usable as raw identifiers.
        format!("{ident}_")
    } else if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

fn short_name(canonical: &str) -> &str {
    canonical.rsplit("::").next().unwrap_or(canonical)
}

fn rust_type(ty: &ScalarType) -> String {
    match ty {
        ScalarType::String => "String".to_string(),
        ScalarType::Int => "i64".to_string(),
        ScalarType::Float => "f64".to_string(),
        ScalarType::Bool => "bool".to_string(),
        ScalarType::Object(class) => class.trim_start_matches("::").to_string(),
        ScalarType::Mixed => "cfgen_schema::Value".to_string(),
    }
}

fn slot_type(kind: &EntryKind) -> String {
    match kind {
        EntryKind::Scalar { ty, .. } => rust_type(ty),
        EntryKind::List { element, .. } => format!("Vec<{}>", rust_type(element)),
        EntryKind::Map { element, .. } => {
            format!("indexmap::IndexMap<String, {}>", rust_type(element))
        }
        EntryKind::Config { artifact } => format!("Box<{}>", short_name(artifact)),
    }
}

/// Rust expression for an entry's default, typed as the entry's slot.
fn default_literal(kind: &EntryKind) -> Option<String> {
    match kind {
        EntryKind::Scalar { ty, default } => typed_literal(ty, default.as_ref()?),
        EntryKind::List { element, default } => {
            let items = default
                .as_ref()?
                .iter()
                .map(|v| typed_literal(element, v))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("vec![{}]", items.join(", ")))
        }
        EntryKind::Map { element, default } => {
            let pairs = default
                .as_ref()?
                .iter()
                .map(|(k, v)| Some(format!("({k:?}.to_string(), {})", typed_literal(element, v)?)))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("indexmap::IndexMap::from([{}])", pairs.join(", ")))
        }
        EntryKind::Config { .. } => None,
    }
}

fn typed_literal(ty: &ScalarType, value: &Value) -> Option<String> {
    match (ty, value) {
        (ScalarType::Mixed, v) => Some(value_expr(v)),
        (ScalarType::String, Value::String(s)) => Some(format!("{s:?}.to_string()")),
        (ScalarType::Int, Value::Int(i)) => Some(i.to_string()),
        (ScalarType::Float, Value::Float(f)) => Some(float_literal(*f)),
        (ScalarType::Float, Value::Int(i)) => Some(format!("{i}.0")),
        (ScalarType::Bool, Value::Bool(b)) => Some(b.to_string()),
        // Object defaults have no literal form.
        _ => None,
    }
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "f64::NAN".to_string()
    } else if f == f64::INFINITY {
        "f64::INFINITY".to_string()
    } else if f == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_string()
    } else {
        format!("{f:?}")
    }
}

/// Expression constructing a `cfgen_schema::Value`.
fn value_expr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("cfgen_schema::Value::String({s:?}.to_string())"),
        Value::Int(i) => format!("cfgen_schema::Value::Int({i})"),
        Value::Float(f) => format!("cfgen_schema::Value::Float({})", float_literal(*f)),
        Value::Bool(b) => format!("cfgen_schema::Value::Bool({b})"),
        Value::Object(o) => {
            let mut expr = format!("cfgen_schema::ObjectValue::new({:?})", o.class);
            for (k, v) in &o.fields {
                let _ = write!(expr, ".with_field({k:?}, {})", value_expr(v));
            }
            format!("cfgen_schema::Value::Object({expr})")
        }
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(value_expr).collect();
            format!("cfgen_schema::Value::List(vec![{}])", items.join(", "))
        }
        Value::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("({k:?}.to_string(), {})", value_expr(v)))
                .collect();
            format!(
                "cfgen_schema::Value::Map(indexmap::IndexMap::from([{}]))",
                pairs.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use cfgen_schema::{Entry, Schema, SubjectName};

    fn rendered() -> Vec<String> {
        let schema = Schema::new()
            .with("count", Entry::scalar_with_default(ScalarType::Int, 0))
            .with("ratio", Entry::scalar_with_default(ScalarType::Float, f64::NAN))
            .with(
                "tags",
                Entry::list(ScalarType::String).with_default(vec![Value::from("a")]),
            )
            .with("labels", Entry::map(ScalarType::Mixed))
            .with(
                "inner",
                Entry::nested(Schema::new().with("flag", Entry::scalar(ScalarType::Bool))),
            );
        let subject = SubjectName::parse("app::Settings").unwrap();
        compile(&schema, &subject, "ns::app")
            .unwrap()
            .iter()
            .map(render_rust)
            .collect()
    }

    #[test]
    fn banner_and_header() {
        let src = &rendered()[0];
        assert!(src.starts_with("// THIS IS AN AUTOMATICALLY GENERATED FILE"));
        assert!(src.contains("// artifact: ns::app::Settings"));
        assert!(src.contains("pub struct Settings {"));
    }

    #[test]
    fn slots_and_accessors() {
        let src = &rendered()[0];
        assert!(src.contains("count: Option<i64>,"));
        assert!(src.contains("tags: Option<Vec<String>>,"));
        assert!(src.contains("labels: Option<indexmap::IndexMap<String, cfgen_schema::Value>>,"));
        assert!(src.contains("inner: Option<Box<Settings_1>>,"));
        assert!(src.contains("self.count.clone().or_else(|| Some(0))"));
        assert!(src.contains("Some(f64::NAN)"));
        assert!(src.contains("Some(vec![\"a\".to_string()])"));
        assert!(src.contains("pub fn push_tags(&mut self, value: String)"));
        assert!(src.contains("pub fn remove_labels_at(&mut self, key: &str)"));
        assert!(src.contains("pub fn get_inner(&mut self) -> &mut Settings_1"));
    }

    #[test]
    fn config_mutators_are_noops() {
        let src = &rendered()[0];
        let isset = src.find("pub fn isset_inner").unwrap();
        assert!(src[isset..].contains("// config is immutable"));
    }

    #[test]
    fn dispatch_covers_entries() {
        let src = &rendered()[0];
        assert!(src.contains(
            "matches!(key, \"count\" | \"ratio\" | \"tags\" | \"labels\" | \"inner\")"
        ));
        assert!(src.contains("\"tags\" => self.isset_tags(),"));
        assert!(src.contains("\"inner\" => self.unset_inner(),"));
        assert!(src.contains("_ => false,"));
    }

    #[test]
    fn nested_artifact_names_parent() {
        let src = &rendered()[1];
        assert!(src.contains("// parent:   ns::app::Settings"));
        assert!(src.contains("pub struct Settings_1 {"));
    }

    #[test]
    fn keyword_keys_become_raw_identifiers() {
        assert_eq!(field("type"), "r#type");
        assert_eq!(field("match"), "r#match");
        assert_eq!(field("self"), "self_");
        assert_eq!(field("max-conn"), "max_conn");
        assert_eq!(field("9lives"), "_9lives");

        let schema = Schema::new().with("type", Entry::scalar(ScalarType::String));
        let subject = SubjectName::parse("app::Kind").unwrap();
        let src = render_rust(&compile(&schema, &subject, "ns").unwrap()[0]);
        assert!(src.contains("    r#type: Option<String>,"));
        assert!(!src.contains("    type: Option"));
    }

    #[test]
    fn mixed_values_render_as_constructors() {
        let mut map = indexmap::IndexMap::new();
        map.insert("k".to_string(), Value::List(vec![Value::Int(1)]));
        assert_eq!(
            value_expr(&Value::Map(map)),
            "cfgen_schema::Value::Map(indexmap::IndexMap::from([(\"k\".to_string(), \
             cfgen_schema::Value::List(vec![cfgen_schema::Value::Int(1)]))]))"
        );
        assert_eq!(float_literal(1.5), "1.5");
        assert_eq!(float_literal(f64::NEG_INFINITY), "f64::NEG_INFINITY");
    }
}
