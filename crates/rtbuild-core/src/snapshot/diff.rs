//! Line-level diff between a reference snapshot and captured output.

use similar::{capture_diff_slices, Algorithm, DiffTag as OpTag};
use std::hash::Hash;

/// Marker for one diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    /// Present in both.
    Equal,
    /// Only in the reference snapshot.
    Removed,
    /// Only in the captured output.
    Added,
}

impl DiffTag {
    pub fn marker(&self) -> char {
        match self {
            DiffTag::Equal => ' ',
            DiffTag::Removed => '-',
            DiffTag::Added => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: DiffTag,

    /// Line text without its terminator, lossily decoded for display.
    pub text: String,

    /// Whether the line ended with a newline.
    pub terminated: bool,
}

impl DiffLine {
    fn new(tag: DiffTag, line: impl AsRef<[u8]>) -> Self {
        let line = line.as_ref();
        let body = line
            .strip_suffix(b"\r\n")
            .or_else(|| line.strip_suffix(b"\n"));
        Self {
            tag,
            text: String::from_utf8_lossy(body.unwrap_or(line)).into_owned(),
            terminated: body.is_some(),
        }
    }
}

/// Ordered diff of two line sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub lines: Vec<DiffLine>,
}

impl LineDiff {
    /// Diff `reference` against `captured`, both already normalized.
    ///
    /// Lines are matched on their exact bytes, terminators included.
    pub fn compute<L>(reference: &[L], captured: &[L]) -> Self
    where
        L: AsRef<[u8]> + Hash + Ord,
    {
        let mut lines = Vec::new();
        for op in capture_diff_slices(Algorithm::Myers, reference, captured) {
            let (tag, old, new) = op.as_tag_tuple();
            match tag {
                OpTag::Equal => push_lines(&mut lines, DiffTag::Equal, &reference[old]),
                OpTag::Delete => push_lines(&mut lines, DiffTag::Removed, &reference[old]),
                OpTag::Insert => push_lines(&mut lines, DiffTag::Added, &captured[new]),
                OpTag::Replace => {
                    push_lines(&mut lines, DiffTag::Removed, &reference[old]);
                    push_lines(&mut lines, DiffTag::Added, &captured[new]);
                }
            }
        }
        Self { lines }
    }

    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|l| l.tag != DiffTag::Equal)
    }

    /// Lines with the given tag, text only.
    pub fn texts(&self, tag: DiffTag) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.tag == tag)
            .map(|l| l.text.as_str())
            .collect()
    }

    /// One line per entry: marker followed by text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push(line.tag.marker());
            out.push_str(&line.text);
            out.push('\n');
            if !line.terminated {
                out.push_str("\\ no newline at end of output\n");
            }
        }
        out
    }
}

fn push_lines<L: AsRef<[u8]>>(out: &mut Vec<DiffLine>, tag: DiffTag, lines: &[L]) {
    out.extend(lines.iter().map(|l| DiffLine::new(tag, l)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.split_inclusive('\n').map(str::to_string).collect()
    }

    #[test]
    fn test_changed_line_marked_both_ways() {
        let diff = LineDiff::compute(&lines(": start\nresult=42\n"), &lines(": start\nresult=43\n"));
        assert!(diff.has_changes());
        assert_eq!(diff.texts(DiffTag::Removed), vec!["result=42"]);
        assert_eq!(diff.texts(DiffTag::Added), vec!["result=43"]);
        assert_eq!(diff.texts(DiffTag::Equal), vec![": start"]);
        assert_eq!(diff.render(), " : start\n-result=42\n+result=43\n");
    }

    #[test]
    fn test_surrounding_lines_unmarked() {
        let reference = lines("a\nb\nc\nd\ne\n");
        let captured = lines("a\nb\nX\nd\ne\n");
        let diff = LineDiff::compute(&reference, &captured);
        let marked: Vec<_> = diff
            .lines
            .iter()
            .filter(|l| l.tag != DiffTag::Equal)
            .map(|l| (l.tag, l.text.as_str()))
            .collect();
        assert_eq!(marked, vec![(DiffTag::Removed, "c"), (DiffTag::Added, "X")]);
        assert_eq!(diff.texts(DiffTag::Equal), vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn test_identical_sequences_have_no_changes() {
        let same = lines("x\ny\n");
        assert!(!LineDiff::compute(&same, &same).has_changes());
    }

    #[test]
    fn test_missing_final_newline_is_a_change() {
        let diff = LineDiff::compute(&lines("done\n"), &lines("done"));
        assert!(diff.has_changes());
        assert!(diff.render().contains("\\ no newline at end of output"));
    }

    #[test]
    fn test_invalid_utf8_lines_differ_by_bytes() {
        let reference = vec![b"value=\xff\n".to_vec()];
        let captured = vec![b"value=\xfe\n".to_vec()];
        let diff = LineDiff::compute(&reference, &captured);
        assert!(diff.has_changes());
        assert_eq!(diff.texts(DiffTag::Removed), vec!["value=\u{fffd}"]);
        assert_eq!(diff.texts(DiffTag::Added), vec!["value=\u{fffd}"]);
    }

    #[test]
    fn test_truncated_output_shows_removed_tail() {
        let diff = LineDiff::compute(&lines("a\nb\nc\n"), &lines("a\n"));
        assert_eq!(diff.texts(DiffTag::Removed), vec!["b", "c"]);
        assert!(diff.texts(DiffTag::Added).is_empty());
    }
}
