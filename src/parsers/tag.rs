//! Struct tag parsing: `json:"id,omitempty" db:"user_id"`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("malformed struct tag {tag:?} at byte {offset}")]
    Malformed { tag: String, offset: usize },
}

/// One `key:"name,opt1,opt2"` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub key: String,
    pub name: String,
    pub options: Vec<String>,
}

impl TagEntry {
    /// Raw quoted value, name and options rejoined.
    pub fn value(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        parts.extend(self.options.iter().map(String::as_str));
        parts.join(",")
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTag {
    entries: Vec<TagEntry>,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([^\s:"`]+):"((?:[^"\\]|\\.)*)""#).expect("struct tag pattern compiles")
    })
}

impl StructTag {
    pub fn parse(tag: &str) -> Result<Self, TagError> {
        let mut entries = Vec::new();
        let mut cursor = 0;

        for captures in tag_pattern().captures_iter(tag) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if !tag[cursor..whole.start()].trim().is_empty() {
                return Err(TagError::Malformed {
                    tag: tag.to_string(),
                    offset: cursor,
                });
            }
            cursor = whole.end();

            let key = captures[1].to_string();
            let value = captures[2].replace("\\\"", "\"").replace("\\\\", "\\");
            let mut parts = value.split(',').map(str::to_string);
            let name = parts.next().unwrap_or_default();
            entries.push(TagEntry {
                key,
                name,
                options: parts.collect(),
            });
        }

        if !tag[cursor..].trim().is_empty() {
            return Err(TagError::Malformed {
                tag: tag.to_string(),
                offset: cursor,
            });
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&TagEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }
}
