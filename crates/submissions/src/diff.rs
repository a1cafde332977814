//! Git-format unified diff parsing and candidate selection.

use url::Url;

use crate::{Error, Result, types::BranchRef};

const FILE_HEADER: &str = "diff --git ";

/// One changed file: its post-image path (still carrying the `b/` prefix) and
/// the header lines that precede its first hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub preamble: String,
}

impl ChangedFile {
    /// Path relative to the repository root.
    #[must_use]
    pub fn repo_path(&self) -> &str {
        self.path.strip_prefix("b/").unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    /// Text before the first file header.
    pub preamble: String,
    /// Changed files in diff order.
    pub files: Vec<ChangedFile>,
}

impl ParsedDiff {
    /// Whether `needle` occurs anywhere in the diff's header text: the
    /// preamble before the first file, or any per-file header. Per-file
    /// headers start with the `diff --git a/<path> b/<path>` line, so a
    /// needle that appears only in a changed file's path matches too.
    #[must_use]
    pub fn headers_mention(&self, needle: &str) -> bool {
        self.preamble.contains(needle) || self.files.iter().any(|f| f.preamble.contains(needle))
    }
}

enum State {
    Preamble,
    Header,
    Body,
}

/// Parse a git-format diff into its preamble and changed files.
pub fn parse_diff(text: &str) -> Result<ParsedDiff> {
    let mut diff = ParsedDiff::default();
    let mut preamble = Vec::new();
    let mut header: Vec<&str> = Vec::new();
    let mut current: Option<String> = None;
    let mut state = State::Preamble;

    for (index, line) in text.lines().enumerate() {
        if let Some(names) = line.strip_prefix(FILE_HEADER) {
            if let Some(path) = current.take() {
                diff.files.push(ChangedFile {
                    path,
                    preamble: header.join("\n"),
                });
            }
            header.clear();
            header.push(line);
            current = Some(post_image_name(names).ok_or_else(|| Error::Diff {
                line: index + 1,
                message: "file header has no b/ path".into(),
            })?);
            state = State::Header;
            continue;
        }

        match state {
            State::Preamble => preamble.push(line),
            State::Header => {
                if line.starts_with("@@") || line.starts_with("Binary files ") {
                    state = State::Body;
                } else if line == "GIT binary patch" {
                    header.push(line);
                    state = State::Body;
                } else {
                    if let Some(name) = line.strip_prefix("+++ ")
                        && name != "/dev/null"
                    {
                        current = Some(unquote(name).to_string());
                    }
                    header.push(line);
                }
            },
            State::Body => {},
        }
    }

    if let Some(path) = current {
        diff.files.push(ChangedFile {
            path,
            preamble: header.join("\n"),
        });
    }
    diff.preamble = preamble.join("\n");
    Ok(diff)
}

/// The `b/...` name from the remainder of a `diff --git a/x b/x` line.
fn post_image_name(names: &str) -> Option<String> {
    let names = names.trim_end();
    let index = names.rfind(" b/").or_else(|| names.rfind(" \"b/"))?;
    Some(unquote(&names[index + 1..]).to_string())
}

fn unquote(name: &str) -> &str {
    name.strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name)
}

/// Last-wins selection: the last file in diff order whose path ends with
/// `suffix`. Earlier matches are overridden, never reported.
#[must_use]
pub fn select_last<'a>(files: &'a [ChangedFile], suffix: &str) -> Option<&'a ChangedFile> {
    files.iter().rev().find(|f| f.path.ends_with(suffix))
}

/// Where a changed file's content can be fetched on the base branch:
/// `{raw_base}/{owner}/{repo}/{ref}/{path}`.
pub fn base_file_url(raw_base: &Url, base: &BranchRef, file: &ChangedFile) -> Result<Url> {
    let mut url = raw_base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::message(format!("{raw_base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(base.repo_full_name.split('/'))
        .extend(base.git_ref.split('/'))
        .extend(file.repo_path().split('/'));
    Ok(url)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const TWO_JSON: &str = "\
diff --git a/plugins/Foo/a.json b/plugins/Foo/a.json
new file mode 100644
index 0000000..1111111
--- /dev/null
+++ b/plugins/Foo/a.json
@@ -0,0 +1 @@
+{}
diff --git a/plugins/Foo/latest.zip b/plugins/Foo/latest.zip
new file mode 100644
index 0000000..2222222
Binary files /dev/null and b/plugins/Foo/latest.zip differ
diff --git a/plugins/Foo/b.json b/plugins/Foo/b.json
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/plugins/Foo/b.json
@@ -0,0 +1 @@
+{}
";

    #[test]
    fn parses_files_in_order() {
        let diff = parse_diff(TWO_JSON).unwrap();
        let paths: Vec<_> = diff.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, [
            "b/plugins/Foo/a.json",
            "b/plugins/Foo/latest.zip",
            "b/plugins/Foo/b.json"
        ]);
        assert!(diff.preamble.is_empty());
    }

    #[test]
    fn last_json_wins() {
        let diff = parse_diff(TWO_JSON).unwrap();
        let chosen = select_last(&diff.files, ".json").unwrap();
        assert_eq!(chosen.repo_path(), "plugins/Foo/b.json");
        assert_eq!(
            select_last(&diff.files, ".zip").unwrap().repo_path(),
            "plugins/Foo/latest.zip"
        );
        assert!(select_last(&diff.files, ".dll").is_none());
    }

    #[test]
    fn header_stops_at_first_hunk() {
        let diff = parse_diff(TWO_JSON).unwrap();
        let first = &diff.files[0].preamble;
        assert!(first.starts_with("diff --git a/plugins/Foo/a.json"));
        assert!(first.ends_with("+++ b/plugins/Foo/a.json"));
        assert!(!first.contains("@@"));
    }

    #[test]
    fn hunk_lines_do_not_start_files() {
        let text = "\
diff --git a/x.json b/x.json
--- a/x.json
+++ b/x.json
@@ -1,2 +1,2 @@
--- not a header
+++ b/y.json
";
        let diff = parse_diff(text).unwrap();
        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].path, "b/x.json");
    }

    #[test]
    fn keeps_text_before_first_file_as_preamble() {
        let text = "From 1234 Mon Sep 17 00:00:00 2001\nSubject: move Foo to testing\n\ndiff --git a/x b/x\n";
        let diff = parse_diff(text).unwrap();
        assert!(diff.preamble.contains("move Foo to testing"));
        assert!(diff.headers_mention("testing"));
    }

    #[test]
    fn headers_mention_matches_file_paths() {
        let text = "diff --git a/testing/Foo/Foo.json b/testing/Foo/Foo.json\n";
        let diff = parse_diff(text).unwrap();
        assert!(!diff.preamble.contains("testing"));
        assert!(diff.headers_mention("testing"));
        assert!(!parse_diff(TWO_JSON).unwrap().headers_mention("testing"));
    }

    #[test]
    fn deleted_file_keeps_header_path() {
        let text = "\
diff --git a/old.json b/old.json
deleted file mode 100644
--- a/old.json
+++ /dev/null
";
        let diff = parse_diff(text).unwrap();
        assert_eq!(diff.files[0].path, "b/old.json");
    }

    #[test]
    fn quoted_names_are_unquoted() {
        let text = "diff --git \"a/my plugin.json\" \"b/my plugin.json\"\n";
        let diff = parse_diff(text).unwrap();
        assert_eq!(diff.files[0].repo_path(), "my plugin.json");
    }

    #[test]
    fn header_without_post_image_is_malformed() {
        let err = parse_diff("intro\ndiff --git garbage\n").unwrap_err();
        assert!(matches!(err, Error::Diff { line: 2, .. }));
    }

    #[test]
    fn base_url_joins_repo_ref_and_path() {
        let base = BranchRef {
            repo_full_name: "goatcorp/DalamudPlugins".into(),
            git_ref: "api6".into(),
        };
        let file = ChangedFile {
            path: "b/plugins/Foo/Foo.json".into(),
            preamble: String::new(),
        };
        let raw = Url::parse("https://raw.githubusercontent.com").unwrap();
        assert_eq!(
            base_file_url(&raw, &base, &file).unwrap().as_str(),
            "https://raw.githubusercontent.com/goatcorp/DalamudPlugins/api6/plugins/Foo/Foo.json"
        );
    }

    #[test]
    fn base_url_keeps_slashes_in_ref() {
        let base = BranchRef {
            repo_full_name: "goatcorp/DalamudPlugins".into(),
            git_ref: "release/v2".into(),
        };
        let file = ChangedFile {
            path: "b/beta.json".into(),
            preamble: String::new(),
        };
        let raw = Url::parse("http://127.0.0.1:8080/raw/").unwrap();
        assert_eq!(
            base_file_url(&raw, &base, &file).unwrap().as_str(),
            "http://127.0.0.1:8080/raw/goatcorp/DalamudPlugins/release/v2/beta.json"
        );
    }
}
