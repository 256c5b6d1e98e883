use crate::model::{ChangeKind, CommitRecord, FileChange};
use chrono::{DateTime, Utc};

pub(crate) const RECORD_SEP: char = '\u{1e}';
pub(crate) const FIELD_SEP: char = '\u{1f}';
pub(crate) const HEADER_END: char = '\u{1d}';

/// `--format` argument matching [`parse_log`].
pub(crate) const LOG_FORMAT: &str = "--format=%x1e%H%x1f%P%x1f%an <%ae>%x1f%aI%x1f%B%x1d";

/// Parse `git log --patch` output produced with [`LOG_FORMAT`].
///
/// Records that do not carry the expected header fields are skipped.
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    split_records(output)
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .filter_map(parse_record)
        .collect()
}

/// Split on record separators that open a commit header.
///
/// File content may contain the separator byte, but diff lines always begin
/// with a prefix character, so only a separator at the start of a line and
/// followed by a hash and [`FIELD_SEP`] starts a new record.
fn split_records(output: &str) -> Vec<&str> {
    let sep_len = RECORD_SEP.len_utf8();
    let starts: Vec<usize> = output
        .match_indices(RECORD_SEP)
        .map(|(i, _)| i)
        .filter(|&i| (i == 0 || output[..i].ends_with('\n')) && opens_header(&output[i + sep_len..]))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).map_or(output.len(), |&next| next);
            &output[start + sep_len..end]
        })
        .collect()
}

fn opens_header(rest: &str) -> bool {
    let hash_len = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
    hash_len > 0 && rest[hash_len..].starts_with(FIELD_SEP)
}

fn parse_record(chunk: &str) -> Option<CommitRecord> {
    let (header, patch) = chunk.split_once(HEADER_END).unwrap_or((chunk, ""));
    let mut fields = header.splitn(5, FIELD_SEP);

    let hash = fields.next()?.trim().to_string();
    let parents = fields
        .next()?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let author = fields.next()?.trim().to_string();
    let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim())
        .ok()?
        .with_timezone(&Utc);
    let message = fields.next().unwrap_or("").trim().to_string();

    if hash.is_empty() {
        return None;
    }

    Some(CommitRecord {
        hash,
        parents,
        author,
        timestamp,
        message,
        files_changed: parse_patch(patch),
    })
}

/// Split a multi-file patch into one [`FileChange`] per `diff --git` section.
pub fn parse_patch(patch: &str) -> Vec<FileChange> {
    let mut sections: Vec<Vec<&str>> = Vec::new();
    for line in patch.lines() {
        if line.starts_with("diff --git ") {
            sections.push(vec![line]);
        } else if let Some(section) = sections.last_mut() {
            section.push(line);
        }
    }

    sections.iter().map(|lines| parse_section(lines)).collect()
}

fn parse_section(lines: &[&str]) -> FileChange {
    let (header_old, header_new) = split_header_paths(lines[0]);
    let mut old_path = header_old;
    let mut new_path = header_new;
    let mut status = ChangeKind::Modified;
    let mut renamed = false;
    let mut binary = false;

    for line in lines.iter().skip(1) {
        if line.starts_with("@@") {
            break;
        }
        if line.starts_with("new file mode") {
            status = ChangeKind::Added;
        } else if line.starts_with("deleted file mode") {
            status = ChangeKind::Deleted;
        } else if let Some(p) = line.strip_prefix("rename from ") {
            old_path = unquote(p);
            renamed = true;
        } else if let Some(p) = line.strip_prefix("rename to ") {
            new_path = unquote(p);
            renamed = true;
        } else if let Some(p) = line.strip_prefix("--- a/") {
            old_path = unquote(p);
        } else if let Some(p) = line.strip_prefix("+++ b/") {
            new_path = unquote(p);
        } else if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            binary = true;
        }
    }

    let path = if status == ChangeKind::Deleted { old_path.clone() } else { new_path };
    let diff_text = if binary {
        None
    } else {
        Some(lines.join("\n"))
    };

    FileChange {
        path,
        status,
        previous_path: renamed.then_some(old_path),
        binary,
        diff_text,
    }
}

/// Best-effort split of `diff --git a/<old> b/<new>`; the `---`/`+++` and
/// `rename` lines take precedence when present.
fn split_header_paths(header: &str) -> (String, String) {
    let rest = header.trim_start_matches("diff --git ");

    if rest.starts_with('"') {
        let mut parts = rest.splitn(2, "\" ");
        let old = parts.next().unwrap_or("");
        let new = parts.next().unwrap_or(old);
        return (strip_side(&unquote(old), "a/"), strip_side(&unquote(new), "b/"));
    }

    // For unrenamed files both halves are equal, which disambiguates paths
    // containing " b/".
    let body = rest.strip_prefix("a/").unwrap_or(rest);
    if body.len() >= 3 && body.len() % 2 == 1 {
        let half = (body.len() - 3) / 2;
        if body.is_char_boundary(half) && body[half..].starts_with(" b/") {
            let old = &body[..half];
            if &body[half + 3..] == old {
                return (old.to_string(), old.to_string());
            }
        }
    }

    match rest.rsplit_once(" b/") {
        Some((old, new)) => (strip_side(old, "a/"), new.to_string()),
        None => (rest.to_string(), rest.to_string()),
    }
}

fn strip_side(path: &str, side: &str) -> String {
    path.strip_prefix(side).unwrap_or(path).to_string()
}

fn unquote(path: &str) -> String {
    path.trim().trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(hash: &str, parents: &str, author: &str, date: &str, message: &str) -> String {
        format!("{RECORD_SEP}{hash}{FIELD_SEP}{parents}{FIELD_SEP}{author}{FIELD_SEP}{date}{FIELD_SEP}{message}{HEADER_END}")
    }

    #[test]
    fn parses_multi_file_commit() {
        let mut out = header(
            "1111111111111111111111111111111111111111",
            "0000000000000000000000000000000000000000",
            "Ada <ada@example.com>",
            "2024-03-10T09:30:00+01:00",
            "Add parser\n\nLonger body.\n",
        );
        out.push_str(
            "\n\ndiff --git a/src/lib.rs b/src/lib.rs\n\
             index 111..222 100644\n\
             --- a/src/lib.rs\n\
             +++ b/src/lib.rs\n\
             @@ -1 +1,2 @@\n\
             -old\n\
             +new\n\
             +more\n\
             diff --git a/src/new.rs b/src/new.rs\n\
             new file mode 100644\n\
             index 000..333\n\
             --- /dev/null\n\
             +++ b/src/new.rs\n\
             @@ -0,0 +1 @@\n\
             +fn x() {}\n\
             diff --git a/old.txt b/old.txt\n\
             deleted file mode 100644\n\
             index 444..000\n\
             --- a/old.txt\n\
             +++ /dev/null\n\
             @@ -1 +0,0 @@\n\
             -bye\n",
        );

        let commits = parse_log(&out);
        assert_eq!(commits.len(), 1);
        let c = &commits[0];
        assert_eq!(c.author, "Ada <ada@example.com>");
        assert_eq!(c.subject(), "Add parser");
        assert_eq!(c.timestamp.to_rfc3339(), "2024-03-10T08:30:00+00:00");
        assert!(!c.is_merge());

        let summary: Vec<(&str, ChangeKind)> =
            c.files_changed.iter().map(|f| (f.path.as_str(), f.status)).collect();
        assert_eq!(
            summary,
            vec![
                ("src/lib.rs", ChangeKind::Modified),
                ("src/new.rs", ChangeKind::Added),
                ("old.txt", ChangeKind::Deleted),
            ]
        );
        let diff = c.files_changed[0].diff_text.as_deref().unwrap();
        assert!(diff.starts_with("diff --git a/src/lib.rs b/src/lib.rs"));
        assert!(diff.ends_with("+more"));
        assert!(!diff.contains("src/new.rs"));
    }

    #[test]
    fn binary_change_has_no_diff_text() {
        let mut out = header("2222222", "1111111", "Bob <bob@example.com>", "2024-03-11T10:00:00Z", "Logo");
        out.push_str(
            "\n\ndiff --git a/logo.png b/logo.png\n\
             new file mode 100644\n\
             index 0000000..e69de29\n\
             Binary files /dev/null and b/logo.png differ\n",
        );

        let commits = parse_log(&out);
        let file = &commits[0].files_changed[0];
        assert_eq!(file.path, "logo.png");
        assert_eq!(file.status, ChangeKind::Added);
        assert!(file.binary);
        assert_eq!(file.diff_text, None);
    }

    #[test]
    fn merge_commit_has_no_files() {
        let mut out = header("3333333", "1111111 2222222", "Cy <cy@example.com>", "2024-03-12T10:00:00Z", "Merge branch 'feat'");
        out.push('\n');
        out.push_str(&header("2222222", "1111111", "Cy <cy@example.com>", "2024-03-11T10:00:00Z", "feat"));
        out.push_str("\n\ndiff --git a/a b/a\n--- a/a\n+++ b/a\n@@ -1 +1 @@\n-x\n+y\n");

        let commits = parse_log(&out);
        assert_eq!(commits.len(), 2);
        assert!(commits[0].is_merge());
        assert!(commits[0].files_changed.is_empty());
        assert_eq!(commits[1].files_changed.len(), 1);
    }

    #[test]
    fn rename_is_modified_with_previous_path() {
        let patch = "diff --git a/docs/old name.md b/docs/new name.md\n\
                     similarity index 90%\n\
                     rename from docs/old name.md\n\
                     rename to docs/new name.md\n";
        let files = parse_patch(patch);
        assert_eq!(files[0].path, "docs/new name.md");
        assert_eq!(files[0].status, ChangeKind::Modified);
        assert_eq!(files[0].previous_path.as_deref(), Some("docs/old name.md"));
    }

    #[test]
    fn separator_byte_inside_file_content_keeps_later_files() {
        let mut out = header("4444444", "3333333", "Di <di@example.com>", "2024-03-13T10:00:00Z", "Data");
        out.push_str(&format!(
            "\n\ndiff --git a/data.csv b/data.csv\n\
             new file mode 100644\n\
             --- /dev/null\n\
             +++ b/data.csv\n\
             @@ -0,0 +1,2 @@\n\
             +a{RECORD_SEP}b\n\
             +c\n\
             diff --git a/z.txt b/z.txt\n\
             new file mode 100644\n\
             --- /dev/null\n\
             +++ b/z.txt\n\
             @@ -0,0 +1 @@\n\
             +z\n"
        ));
        out.push_str(&header("3333333", "", "Di <di@example.com>", "2024-03-12T10:00:00Z", "Root"));
        out.push('\n');

        let commits = parse_log(&out);
        assert_eq!(commits.len(), 2);
        let paths: Vec<&str> = commits[0].files_changed.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["data.csv", "z.txt"]);
        assert!(commits[0].files_changed[0]
            .diff_text
            .as_deref()
            .unwrap()
            .contains(&format!("+a{RECORD_SEP}b")));
        assert_eq!(commits[1].subject(), "Root");
    }

    #[test]
    fn header_paths_with_spaces() {
        assert_eq!(
            split_header_paths("diff --git a/dir b/x.txt b/dir b/x.txt"),
            ("dir b/x.txt".to_string(), "dir b/x.txt".to_string())
        );
    }

    #[test]
    fn empty_output_yields_no_commits() {
        assert!(parse_log("").is_empty());
        assert!(parse_log("\n").is_empty());
    }
}
