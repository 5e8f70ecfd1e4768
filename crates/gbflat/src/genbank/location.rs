// Feature location expressions
//
// Covers the forms found in nucleotide feature tables: `a..b` ranges with
// optional `<`/`>` partial markers, single bases, `a^b` sites, and the
// `complement`, `join` and `order` operators. Remote references
// (`J00194.1:100..202`) are rejected.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LocationError(String);

impl LocationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

/// A 1-based, inclusive feature location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Range {
        start: usize,
        end: usize,
        /// `<start`: the feature begins before `start`
        before_start: bool,
        /// `>end`: the feature continues past `end`
        after_end: bool,
    },
    Single(usize),
    /// Site between two adjacent bases, `a^b`
    Between(usize, usize),
    Complement(Box<Location>),
    Join(Vec<Location>),
    Order(Vec<Location>),
}

impl Location {
    /// Closed range shorthand
    pub fn range(start: usize, end: usize) -> Self {
        Location::Range {
            start,
            end,
            before_start: false,
            after_end: false,
        }
    }

    /// Lowest position covered
    pub fn start(&self) -> usize {
        match self {
            Location::Range { start, .. } => *start,
            Location::Single(pos) => *pos,
            Location::Between(before, _) => *before,
            Location::Complement(inner) => inner.start(),
            Location::Join(parts) | Location::Order(parts) => {
                parts.iter().map(Location::start).min().unwrap_or(0)
            },
        }
    }

    /// Highest position covered
    pub fn end(&self) -> usize {
        match self {
            Location::Range { end, .. } => *end,
            Location::Single(pos) => *pos,
            Location::Between(_, after) => *after,
            Location::Complement(inner) => inner.end(),
            Location::Join(parts) | Location::Order(parts) => {
                parts.iter().map(Location::end).max().unwrap_or(0)
            },
        }
    }

    /// Strand; a join is on the reverse strand only if every part is
    pub fn strand(&self) -> Strand {
        match self {
            Location::Complement(inner) => inner.strand().flip(),
            Location::Join(parts) | Location::Order(parts) => {
                if !parts.is_empty() && parts.iter().all(|p| p.strand() == Strand::Reverse) {
                    Strand::Reverse
                } else {
                    Strand::Forward
                }
            },
            _ => Strand::Forward,
        }
    }

    /// Number of residues covered
    pub fn len(&self) -> usize {
        match self {
            Location::Range { start, end, .. } => end + 1 - start,
            Location::Single(_) => 1,
            Location::Between(..) => 0,
            Location::Complement(inner) => inner.len(),
            Location::Join(parts) | Location::Order(parts) => parts.iter().map(Location::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any part carries a `<` or `>` marker
    pub fn is_partial(&self) -> bool {
        match self {
            Location::Range {
                before_start,
                after_end,
                ..
            } => *before_start || *after_end,
            Location::Complement(inner) => inner.is_partial(),
            Location::Join(parts) | Location::Order(parts) => parts.iter().any(Location::is_partial),
            _ => false,
        }
    }

    /// Residues covered by this location, reverse-complemented where the
    /// location says so. `None` when the location runs past the sequence.
    pub fn extract(&self, sequence: &str) -> Option<String> {
        match self {
            Location::Range { start, end, .. } => {
                sequence.get(start.checked_sub(1)?..*end).map(str::to_string)
            },
            Location::Single(pos) => sequence.get(pos.checked_sub(1)?..*pos).map(str::to_string),
            Location::Between(..) => Some(String::new()),
            Location::Complement(inner) => inner.extract(sequence).map(|s| reverse_complement(&s)),
            Location::Join(parts) | Location::Order(parts) => {
                parts.iter().map(|p| p.extract(sequence)).collect()
            },
        }
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(LocationError::new("empty location"));
        }
        parse_expr(&compact)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_list(f: &mut fmt::Formatter<'_>, name: &str, parts: &[Location]) -> fmt::Result {
            write!(f, "{}(", name)?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", part)?;
            }
            f.write_str(")")
        }

        match self {
            Location::Range {
                start,
                end,
                before_start,
                after_end,
            } => write!(
                f,
                "{}{}..{}{}",
                if *before_start { "<" } else { "" },
                start,
                if *after_end { ">" } else { "" },
                end
            ),
            Location::Single(pos) => write!(f, "{}", pos),
            Location::Between(before, after) => write!(f, "{}^{}", before, after),
            Location::Complement(inner) => write!(f, "complement({})", inner),
            Location::Join(parts) => write_list(f, "join", parts),
            Location::Order(parts) => write_list(f, "order", parts),
        }
    }
}

fn parse_expr(s: &str) -> Result<Location, LocationError> {
    if let Some(inner) = strip_call(s, "complement") {
        return Ok(Location::Complement(Box::new(parse_expr(inner)?)));
    }
    if let Some(inner) = strip_call(s, "join") {
        return Ok(Location::Join(parse_list(inner)?));
    }
    if let Some(inner) = strip_call(s, "order") {
        return Ok(Location::Order(parse_list(inner)?));
    }
    parse_simple(s)
}

fn parse_list(s: &str) -> Result<Vec<Location>, LocationError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| LocationError::new("unbalanced parentheses"))?
            },
            ',' if depth == 0 => {
                parts.push(parse_expr(&s[begin..i])?);
                begin = i + 1;
            },
            _ => {},
        }
    }
    parts.push(parse_expr(&s[begin..])?);

    Ok(parts)
}

/// `name(...)` where the opening parenthesis closes at the final character
fn strip_call<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(name)?.strip_prefix('(')?;
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return (i == rest.len() - 1).then(|| &rest[..i]);
                }
            },
            _ => {},
        }
    }
    None
}

fn parse_simple(s: &str) -> Result<Location, LocationError> {
    if s.contains(':') {
        return Err(LocationError::new("references to other records are not supported"));
    }
    if s.contains('(') || s.contains(')') {
        return Err(LocationError::new(format!("unsupported operator in '{}'", s)));
    }

    if let Some((start, end)) = s.split_once("..") {
        let (before_start, start) = match start.strip_prefix('<') {
            Some(rest) => (true, rest),
            None => (false, start),
        };
        let (after_end, end) = match end.strip_prefix('>') {
            Some(rest) => (true, rest),
            None => (false, end),
        };
        let start = parse_position(start)?;
        let end = parse_position(end)?;
        if start > end {
            return Err(LocationError::new(format!("range start {} is after end {}", start, end)));
        }
        return Ok(Location::Range {
            start,
            end,
            before_start,
            after_end,
        });
    }

    if let Some((before, after)) = s.split_once('^') {
        return Ok(Location::Between(parse_position(before)?, parse_position(after)?));
    }

    Ok(Location::Single(parse_position(s.trim_start_matches(['<', '>']))?))
}

fn parse_position(s: &str) -> Result<usize, LocationError> {
    match s.parse::<usize>() {
        Ok(0) => Err(LocationError::new("positions are 1-based")),
        Ok(pos) => Ok(pos),
        Err(_) => Err(LocationError::new(format!("invalid position '{}'", s))),
    }
}

/// Reverse complement of a nucleotide string, IUPAC-aware and case-preserving
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| {
            let comp = match c.to_ascii_lowercase() {
                'a' => 't',
                't' | 'u' => 'a',
                'g' => 'c',
                'c' => 'g',
                'r' => 'y',
                'y' => 'r',
                'k' => 'm',
                'm' => 'k',
                'b' => 'v',
                'v' => 'b',
                'd' => 'h',
                'h' => 'd',
                other => other,
            };
            if c.is_ascii_uppercase() {
                comp.to_ascii_uppercase()
            } else {
                comp
            }
        })
        .collect()
}
