//! Perl module export of the database.
//!
//! The generated module exposes the database as a nested hash returned by
//! `db()`:
//!
//! ```perl
//! package CPANSA::DB;
//! our $VERSION = '20240101.001';
//! sub db {
//!   return {
//!     'dists' => { ... },
//!     'module2dist' => { ... },
//!   };
//! }
//! 1;
//! ```

use serde_json::Value;

use crate::error::Result;
use crate::model::Database;
use crate::stamp::VersionStamp;

const INDENT: &str = "  ";

pub fn render_perl(database: &Database, stamp: &VersionStamp, package: &str) -> Result<String> {
    let value = serde_json::to_value(database)?;

    let mut out = String::new();
    out.push_str("# Generated by cpansa-db. Do not edit.\n");
    out.push_str(&format!("package {};\n", package));
    out.push_str("\nuse strict;\nuse warnings;\nuse utf8;\n\n");
    out.push_str(&format!("our $VERSION = '{}';\n", stamp));
    out.push_str("\nsub db {\n");
    out.push_str(INDENT);
    out.push_str("return ");
    write_value(&mut out, &value, 1);
    out.push_str(";\n}\n\n1;\n");
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("undef"),
        Value::Bool(true) => out.push('1'),
        Value::Bool(false) => out.push('0'),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                push_indent(out, depth + 1);
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            push_indent(out, depth);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, item) in map {
                push_indent(out, depth + 1);
                write_string(out, key);
                out.push_str(" => ");
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}

/// Single-quoted Perl string; only `\` and `'` need escaping.
fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
