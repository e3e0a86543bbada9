//! Small scanners over regex source text.
//!
//! Route regexes are built from escaped literal text and one capturing group
//! per placeholder. The helpers here never parse a full regex grammar; they
//! only know enough to skip escapes and character classes, which is all that
//! is needed to find capturing groups and to cut a route regex without
//! splitting inside a group.

use std::collections::HashMap;
use std::rc::Rc;

/// Returns true if `pattern` contains a capturing group.
///
/// Conservative scan: escapes and character classes are skipped, `(?:...)`,
/// flag groups and look-arounds are non-capturing, `(?P<name>...)`,
/// `(?<name>...)` and `(?'name'...)` are capturing.
#[must_use]
pub fn has_capturing_group(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    if !bytes.contains(&b'(') {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => i = skip_class(bytes, i),
            b'(' => {
                match bytes.get(i + 1) {
                    Some(b'?') => match (bytes.get(i + 2), bytes.get(i + 3)) {
                        (Some(b'P'), Some(b'<')) => return true,
                        (Some(b'<'), Some(b'=' | b'!')) => {}
                        (Some(b'<'), _) => return true,
                        (Some(b'\''), _) => return true,
                        _ => {}
                    },
                    Some(b'*') => {}
                    _ => return true,
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    false
}

/// Index just past the character class opening at `start`.
fn skip_class(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    if bytes.get(i) == Some(&b'^') {
        i += 1;
    }
    // A leading ']' is a literal member of the class.
    if bytes.get(i) == Some(&b']') {
        i += 1;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => i = skip_class(bytes, i),
            b']' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past the group opening at `start`.
fn skip_group(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => i = skip_class(bytes, i),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// One indivisible unit of a route regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    /// Byte offset where the atom starts.
    pub start: usize,
    /// Byte offset just past the atom.
    pub end: usize,
    /// True for a top-level capturing group, i.e. a placeholder.
    pub group: bool,
}

/// Splits a route regex into atoms: an escape sequence, a whole group, or
/// a single character.
#[must_use]
pub fn split_atoms(regex: &str) -> Vec<Atom> {
    let bytes = regex.as_bytes();
    let mut atoms = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let (end, group) = match bytes[i] {
            b'\\' => {
                let next = regex[i + 1..].chars().next().map_or(0, char::len_utf8);
                (i + 1 + next, false)
            }
            b'(' => (skip_group(bytes, i), true),
            b'[' => (skip_class(bytes, i), false),
            _ => {
                let len = regex[i..].chars().next().map_or(1, char::len_utf8);
                (i + len, false)
            }
        };
        let end = end.min(bytes.len());
        atoms.push(Atom {
            start: i,
            end,
            group,
        });
        i = end;
    }
    atoms
}

/// Memo of atom splits, owned by a single compilation pass.
///
/// The trie compares the same route regexes against each other many times
/// while it is being built; splitting each one once keeps that linear.
#[derive(Debug, Default)]
pub struct AtomMemo {
    splits: HashMap<String, Rc<[Atom]>>,
}

impl AtomMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atoms of `regex`, computed on first use.
    pub fn atoms(&mut self, regex: &str) -> Rc<[Atom]> {
        if let Some(atoms) = self.splits.get(regex) {
            return Rc::clone(atoms);
        }
        let atoms: Rc<[Atom]> = split_atoms(regex).into();
        self.splits.insert(regex.to_string(), Rc::clone(&atoms));
        atoms
    }

    /// Byte length of the longest common prefix of `a` and `b` made of
    /// literal atoms only; it stops at the first capturing group.
    ///
    /// A literal prefix matches exactly one way, so `p(?:x|y)` tries its
    /// alternatives in the same order as `px|py`. A shared group would not:
    /// its longest split is tried against every later tail first.
    pub fn common_literal_prefix_len(&mut self, a: &str, b: &str) -> usize {
        let left = self.atoms(a);
        let right = self.atoms(b);
        let mut len = 0;
        for (x, y) in left.iter().zip(right.iter()) {
            if x.group || y.group || a[x.start..x.end] != b[y.start..y.end] {
                break;
            }
            len = x.end;
        }
        len
    }

    /// Number of capturing groups of `regex` that lie within `from..to`.
    pub fn groups_between(&mut self, regex: &str, from: usize, to: usize) -> usize {
        self.atoms(regex)
            .iter()
            .filter(|atom| atom.group && atom.start >= from && atom.end <= to)
            .count()
    }
}

/// Spreads `count` routes over the fewest chunks of roughly `approx` routes.
#[must_use]
pub fn chunk_size(count: usize, approx: usize) -> usize {
    if count == 0 {
        return 1;
    }
    let approx = approx.max(1);
    let parts = ((count as f64) / (approx as f64)).round().max(1.0);
    ((count as f64) / parts).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capturing_groups_detected() {
        assert!(has_capturing_group("(en|de)"));
        assert!(has_capturing_group("a(b)c"));
        assert!(has_capturing_group("(?P<lang>en)"));
        assert!(has_capturing_group("(?<lang>en)"));
    }

    #[test]
    fn test_non_capturing_constructs_ignored() {
        assert!(!has_capturing_group("[0-9]+"));
        assert!(!has_capturing_group("(?:en|de)"));
        assert!(!has_capturing_group("(?i)abc"));
        assert!(!has_capturing_group(r"\(literal\)"));
        assert!(!has_capturing_group("[()]+"));
        assert!(!has_capturing_group("[^]()]"));
        assert!(!has_capturing_group("[[:alpha:](]+"));
    }

    #[test]
    fn test_split_atoms_keeps_groups_whole() {
        let regex = r"/user/([^/]+)/post\-(\d+(?:\.\d+)?)";
        let atoms = split_atoms(regex);
        let texts: Vec<&str> = atoms.iter().map(|a| &regex[a.start..a.end]).collect();
        assert_eq!(texts[6], "([^/]+)");
        assert!(atoms[6].group);
        assert!(texts.contains(&r"\-"));
        assert_eq!(*texts.last().unwrap(), r"(\d+(?:\.\d+)?)");
        assert_eq!(atoms.iter().filter(|a| a.group).count(), 2);
    }

    #[test]
    fn test_common_prefix_stops_before_groups() {
        let mut memo = AtomMemo::new();
        let a = "/user/([0-9]+)/edit";
        let b = "/user/([0-9]+x)/edit";
        assert_eq!(memo.common_literal_prefix_len(a, b), "/user/".len());
        let c = "/user/([0-9]+)/show";
        assert_eq!(memo.common_literal_prefix_len(a, c), "/user/".len());
        assert_eq!(memo.common_literal_prefix_len(r"/a\.b/c", r"/a\.b/d"), r"/a\.b/".len());
        assert_eq!(memo.groups_between(a, 0, "/user/([0-9]+)/".len()), 1);
        assert_eq!(memo.groups_between(a, 6, a.len()), 1);
        assert_eq!(memo.groups_between(a, 14, a.len()), 0);
    }

    #[test]
    fn test_chunk_size() {
        assert_eq!(chunk_size(0, 30), 1);
        assert_eq!(chunk_size(10, 30), 10);
        assert_eq!(chunk_size(45, 30), 23);
        assert_eq!(chunk_size(100, 10), 10);
        assert_eq!(chunk_size(104, 10), 11);
    }
}
