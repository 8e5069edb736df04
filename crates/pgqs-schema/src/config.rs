//! Loading schema description documents from TOML or JSON.

use crate::description::SchemaDescription;
use crate::error::{SchemaError, SchemaResult};
use crate::graph::SchemaGraph;
use std::path::Path;

/// Document format, chosen from the file extension by [`SchemaDescription::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl SchemaDescription {
    pub fn from_toml_str(raw: &str) -> SchemaResult<Self> {
        toml::from_str(raw).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> SchemaResult<Self> {
        serde_json::from_str(raw).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn parse(raw: &str, format: Format) -> SchemaResult<Self> {
        match format {
            Format::Toml => Self::from_toml_str(raw),
            Format::Json => Self::from_json_str(raw),
        }
    }

    /// Read a description file; `.json` files are JSON, everything else TOML.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, Format::from_path(path))
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> SchemaResult<String> {
        toml::to_string_pretty(self).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Validate and resolve every table of the document.
    pub fn resolve(&self) -> SchemaResult<SchemaGraph> {
        SchemaGraph::resolve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::DomainType;

    const DOC: &str = r#"
[types]
datetime = "chrono::NaiveDateTime"

[[tables]]
name = "post"

[[tables.columns]]
name = "id"
type = "bigint"
primary_key = true
autogenerated = true

[[tables.columns]]
name = "tags"
type = "text[]"
"#;

    #[test]
    fn parses_toml_with_type_overrides() {
        let desc = SchemaDescription::from_toml_str(DOC).unwrap();
        assert_eq!(desc.types["datetime"], "chrono::NaiveDateTime");
        let post = desc.find_table("post").unwrap();
        assert_eq!(post.columns[0].domain_type, DomainType::Int64);
        assert_eq!(
            post.columns[1].domain_type,
            DomainType::array_of(DomainType::String)
        );
        assert!(!post.columns[1].nullable);
    }

    #[test]
    fn parses_json() {
        let raw = r#"{"tables":[{"name":"t","columns":[{"name":"id","type":"int32","primary_key":true}]}]}"#;
        let desc = SchemaDescription::from_json_str(raw).unwrap();
        assert_eq!(desc.tables[0].columns[0].domain_type, DomainType::Int32);
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        let raw = r#"
[[tables]]
name = "t"
[[tables.columns]]
name = "id"
type = "uuid"
"#;
        let err = SchemaDescription::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(msg) if msg.contains("uuid")));
    }

    #[test]
    fn toml_output_parses_back() {
        let desc = SchemaDescription::from_toml_str(DOC).unwrap();
        let out = desc.to_toml_string().unwrap();
        assert_eq!(SchemaDescription::from_toml_str(&out).unwrap(), desc);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("schema.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("schema.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("schema")), Format::Toml);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SchemaDescription::load("/nonexistent/schema.toml").unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }
}
