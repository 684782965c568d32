//! JSON export of the database.

use serde::Serialize;

use crate::error::Result;
use crate::model::Database;
use crate::stamp::VersionStamp;

#[derive(Serialize)]
struct JsonDocument<'a> {
    version: String,
    #[serde(flatten)]
    database: &'a Database,
}

pub fn render_json(database: &Database, stamp: &VersionStamp) -> Result<String> {
    let document = JsonDocument {
        version: stamp.to_string(),
        database,
    };
    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Advisory, DistributionEntry};

    #[test]
    fn test_render_json_document() {
        let mut database = Database::default();
        database.dists.insert(
            "Foo".to_string(),
            DistributionEntry {
                advisories: vec![Advisory::new().with_field("id", "A-1")],
                ..Default::default()
            },
        );
        database
            .module2dist
            .insert("Foo".to_string(), "Foo".to_string());

        let text = render_json(&database, &VersionStamp::new("20240101", 1)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["version"], "20240101.001");
        assert_eq!(value["dists"]["Foo"]["advisories"][0]["id"], "A-1");
        assert_eq!(value["module2dist"]["Foo"], "Foo");
        assert_eq!(
            VersionStamp::scan(&text),
            Some(VersionStamp::new("20240101", 1))
        );
    }
}
