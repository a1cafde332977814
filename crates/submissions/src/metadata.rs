//! Plugin manifest decoding, loose and archived, and the comparison between
//! the two copies.

use std::io::{Cursor, Read};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    zip::ZipArchive,
};

use crate::{Error, Result};

/// A plugin manifest as bundled with a submission.
///
/// Absent or `null` fields decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetadataDocument {
    pub author: String,
    pub name: String,
    pub punchline: String,
    pub description: String,
    pub changelog: String,
    pub tags: Vec<String>,
    pub category_tags: Vec<String>,
    pub is_hide: bool,
    pub internal_name: String,
    pub assembly_version: String,
    pub testing_assembly_version: String,
    pub is_testing_exclusive: bool,
    pub repo_url: String,
    pub applicable_version: String,
    pub image_urls: Vec<String>,
    pub icon_url: String,
    pub dalamud_api_level: i64,
    pub load_priority: i64,
}

const FIELDS: &[&str] = &[
    "Author",
    "Name",
    "Punchline",
    "Description",
    "Changelog",
    "Tags",
    "CategoryTags",
    "IsHide",
    "InternalName",
    "AssemblyVersion",
    "TestingAssemblyVersion",
    "IsTestingExclusive",
    "RepoUrl",
    "ApplicableVersion",
    "ImageUrls",
    "IconUrl",
    "DalamudApiLevel",
    "LoadPriority",
];

/// Trim anything before the first `{` and after the last `}`.
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

/// Map keys onto the manifest's field names case-insensitively, dropping
/// unknown keys and nulls.
fn canonicalize(object: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        if let Some(field) = FIELDS.iter().find(|f| f.eq_ignore_ascii_case(&key)) {
            out.insert((*field).to_string(), value);
        }
    }
    out
}

/// Decode a manifest from raw file bytes.
///
/// Tolerates a byte-order mark or other junk around the object.
pub fn decode(bytes: &[u8]) -> Result<MetadataDocument> {
    let text = String::from_utf8_lossy(bytes);
    let span = object_span(&text).ok_or_else(|| Error::decode("no JSON object found"))?;
    let value: Value = serde_json::from_str(span).map_err(Error::decode)?;
    let Value::Object(object) = value else {
        return Err(Error::decode("manifest is not a JSON object"));
    };
    serde_json::from_value(Value::Object(canonicalize(object))).map_err(Error::decode)
}

/// Decode the manifest inside a package archive: the last entry whose name
/// ends in `.json`.
pub fn decode_archive(bytes: &[u8]) -> Result<MetadataDocument> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut chosen = None;
    for index in 0..archive.len() {
        if archive.by_index_raw(index)?.name().ends_with(".json") {
            chosen = Some(index);
        }
    }
    let index = chosen.ok_or(Error::MissingEntry)?;

    let mut entry = archive.by_index(index)?;
    let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
    entry.read_to_end(&mut buf)?;
    decode(&buf)
}

fn same_set(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Whether two manifests describe the same plugin.
///
/// Every field listed on [`MetadataDocument`] is compared; list fields are
/// compared as multisets so reordering does not count as a difference.
#[must_use]
pub fn matches(loose: &MetadataDocument, archived: &MetadataDocument) -> bool {
    loose.author == archived.author
        && loose.name == archived.name
        && loose.punchline == archived.punchline
        && loose.description == archived.description
        && loose.changelog == archived.changelog
        && same_set(&loose.tags, &archived.tags)
        && same_set(&loose.category_tags, &archived.category_tags)
        && loose.is_hide == archived.is_hide
        && loose.internal_name == archived.internal_name
        && loose.assembly_version == archived.assembly_version
        && loose.testing_assembly_version == archived.testing_assembly_version
        && loose.is_testing_exclusive == archived.is_testing_exclusive
        && loose.repo_url == archived.repo_url
        && loose.applicable_version == archived.applicable_version
        && same_set(&loose.image_urls, &archived.image_urls)
        && loose.icon_url == archived.icon_url
        && loose.dalamud_api_level == archived.dalamud_api_level
        && loose.load_priority == archived.load_priority
}
