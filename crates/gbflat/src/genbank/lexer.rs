// GenBank line classifier
//
// Turns record text into a lazy stream of classified lines. Column positions
// are never hard-coded: the content column of each header is measured when
// the header opens and later lines are judged relative to it.

use super::error::{ParseError, Result};
use std::iter::Enumerate;
use std::str::Lines;

/// Content column assumed when a header carries no text to measure
const DEFAULT_CONTENT_COLUMN: usize = 12;

/// Qualifier column assumed when FEATURES carries no "Location/Qualifiers"
const DEFAULT_QUALIFIER_COLUMN: usize = 21;

/// How far a continuation may sit left of the measured content column
const COLUMN_DRIFT: usize = 2;

const RECORD_START: &str = "start of record";

/// Top-level sections, declared in the order they must appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Locus,
    Definition,
    Accession,
    Version,
    Dblink,
    Keywords,
    Source,
    Reference,
    Comment,
    Features,
    Origin,
}

impl Section {
    pub const ALL: [Section; 11] = [
        Section::Locus,
        Section::Definition,
        Section::Accession,
        Section::Version,
        Section::Dblink,
        Section::Keywords,
        Section::Source,
        Section::Reference,
        Section::Comment,
        Section::Features,
        Section::Origin,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Section::Locus => "LOCUS",
            Section::Definition => "DEFINITION",
            Section::Accession => "ACCESSION",
            Section::Version => "VERSION",
            Section::Dblink => "DBLINK",
            Section::Keywords => "KEYWORDS",
            Section::Source => "SOURCE",
            Section::Reference => "REFERENCE",
            Section::Comment => "COMMENT",
            Section::Features => "FEATURES",
            Section::Origin => "ORIGIN",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.keyword() == word)
    }

    pub fn is_repeatable(self) -> bool {
        matches!(self, Section::Reference)
    }

    pub fn is_required(self) -> bool {
        !matches!(
            self,
            Section::Dblink | Section::Keywords | Section::Reference | Section::Comment
        )
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Indented sub-field keywords under SOURCE and REFERENCE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKeyword {
    Organism,
    Authors,
    Consortium,
    Title,
    Journal,
    Medline,
    Pubmed,
    Remark,
}

impl SubKeyword {
    const ALL: [SubKeyword; 8] = [
        SubKeyword::Organism,
        SubKeyword::Authors,
        SubKeyword::Consortium,
        SubKeyword::Title,
        SubKeyword::Journal,
        SubKeyword::Medline,
        SubKeyword::Pubmed,
        SubKeyword::Remark,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            SubKeyword::Organism => "ORGANISM",
            SubKeyword::Authors => "AUTHORS",
            SubKeyword::Consortium => "CONSRTM",
            SubKeyword::Title => "TITLE",
            SubKeyword::Journal => "JOURNAL",
            SubKeyword::Medline => "MEDLINE",
            SubKeyword::Pubmed => "PUBMED",
            SubKeyword::Remark => "REMARK",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == word)
    }

    /// Section this sub-field may appear under
    pub fn parent(self) -> Section {
        match self {
            SubKeyword::Organism => Section::Source,
            _ => Section::Reference,
        }
    }
}

/// What a physical line turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Header { section: Section, content: &'a str },
    SubHeader { field: SubKeyword, content: &'a str },
    Continuation { content: &'a str },
    FeatureKey { key: &'a str, location: &'a str },
    /// Qualifier text with the leading `/` removed
    Qualifier { text: &'a str },
    QualifierContinuation { content: &'a str },
    Sequence { offset: usize, residues: &'a str },
    Terminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// 1-based line number within the text handed to the classifier
    pub number: usize,
    pub kind: LineKind<'a>,
}

/// Lazy classifier over the lines of one record
///
/// Stops after the `//` terminator or the first error. Building a new
/// classifier over the same text replays the same sequence.
pub struct LineClassifier<'a> {
    lines: Enumerate<Lines<'a>>,
    section: Option<Section>,
    content_column: usize,
    last_line: usize,
    finished: bool,
}

impl<'a> LineClassifier<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            section: None,
            content_column: DEFAULT_CONTENT_COLUMN,
            last_line: 0,
            finished: false,
        }
    }

    /// Section opened by the most recent header
    pub fn section(&self) -> Option<Section> {
        self.section
    }

    /// Number of the last line consumed
    pub fn last_line(&self) -> usize {
        self.last_line
    }

    /// First non-blank line left after the classifier stopped
    pub fn trailing_content(&mut self) -> Option<(usize, &'a str)> {
        self.lines
            .by_ref()
            .map(|(idx, line)| (idx + 1, line))
            .find(|(_, line)| !line.trim().is_empty())
    }

    fn section_name(&self) -> &'static str {
        self.section.map_or(RECORD_START, Section::keyword)
    }

    fn classify(&mut self, number: usize, line: &'a str) -> Result<Option<LineKind<'a>>> {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();

        if trimmed.is_empty() {
            return match self.section {
                None => Ok(None),
                Some(Section::Features) | Some(Section::Origin) => {
                    Err(ParseError::malformed(number, self.section_name(), line))
                },
                Some(_) => Ok(Some(LineKind::Continuation { content: "" })),
            };
        }

        if self.section == Some(Section::Origin)
            && trimmed.starts_with(|c: char| c.is_ascii_digit())
        {
            return self.classify_sequence(number, line, trimmed).map(Some);
        }

        if indent == 0 {
            return self.classify_header(number, line).map(Some);
        }

        match self.section {
            None => Err(ParseError::malformed(number, RECORD_START, line)),
            Some(Section::Features) => Ok(Some(self.classify_feature_line(number, line, indent)?)),
            Some(Section::Origin) => Err(ParseError::malformed(number, "ORIGIN", line)),
            Some(section) => Ok(Some(self.classify_text_line(number, line, indent, section)?)),
        }
    }

    fn classify_header(&mut self, number: usize, line: &'a str) -> Result<LineKind<'a>> {
        if line.trim_end() == "//" {
            return Ok(LineKind::Terminator);
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        let section = Section::from_keyword(keyword)
            .ok_or_else(|| ParseError::malformed(number, self.section_name(), line))?;

        let after_keyword = &line[keyword.len()..];
        let content = after_keyword.trim();
        let default_column = if section == Section::Features {
            DEFAULT_QUALIFIER_COLUMN
        } else {
            DEFAULT_CONTENT_COLUMN
        };
        self.content_column = if content.is_empty() {
            default_column
        } else {
            keyword.len() + (after_keyword.len() - after_keyword.trim_start().len())
        };
        self.section = Some(section);

        Ok(LineKind::Header { section, content })
    }

    fn classify_text_line(
        &mut self,
        number: usize,
        line: &'a str,
        indent: usize,
        section: Section,
    ) -> Result<LineKind<'a>> {
        let trimmed = line.trim();
        let first = trimmed.split_whitespace().next().unwrap_or_default();

        if indent < self.content_column {
            if let Some(field) = SubKeyword::from_keyword(first) {
                if field.parent() != section {
                    return Err(ParseError::malformed(number, section.keyword(), line));
                }
                let after_keyword = &line[indent + first.len()..];
                let content = after_keyword.trim();
                if !content.is_empty() {
                    self.content_column =
                        indent + first.len() + (after_keyword.len() - after_keyword.trim_start().len());
                }
                return Ok(LineKind::SubHeader { field, content });
            }
        }

        if indent + COLUMN_DRIFT >= self.content_column {
            Ok(LineKind::Continuation { content: trimmed })
        } else {
            Err(ParseError::malformed(number, section.keyword(), line))
        }
    }

    fn classify_feature_line(
        &self,
        number: usize,
        line: &'a str,
        indent: usize,
    ) -> Result<LineKind<'a>> {
        let trimmed = line.trim();

        if let Some(text) = trimmed.strip_prefix('/') {
            return Ok(LineKind::Qualifier { text });
        }

        if indent + COLUMN_DRIFT < self.content_column {
            let mut parts = trimmed.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default();
            let location = parts.next().map(str::trim).unwrap_or_default();
            if key.is_empty() || location.is_empty() {
                return Err(ParseError::malformed(number, "FEATURES", line));
            }
            return Ok(LineKind::FeatureKey { key, location });
        }

        Ok(LineKind::QualifierContinuation { content: trimmed })
    }

    fn classify_sequence(
        &self,
        number: usize,
        line: &'a str,
        trimmed: &'a str,
    ) -> Result<LineKind<'a>> {
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let offset = trimmed[..digits_end]
            .parse::<usize>()
            .map_err(|_| ParseError::malformed(number, "ORIGIN", line))?;
        let residues = trimmed[digits_end..].trim();

        Ok(LineKind::Sequence { offset, residues })
    }
}

impl<'a> Iterator for LineClassifier<'a> {
    type Item = Result<ClassifiedLine<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some((idx, line)) = self.lines.next() {
            let number = idx + 1;
            self.last_line = number;

            match self.classify(number, line) {
                Ok(None) => continue,
                Ok(Some(kind)) => {
                    if kind == LineKind::Terminator {
                        self.finished = true;
                    }
                    return Some(Ok(ClassifiedLine { number, kind }));
                },
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                },
            }
        }

        self.finished = true;
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LineKind<'_>> {
        LineClassifier::new(text)
            .map(|line| line.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_section_keywords_round_trip() {
        for section in Section::ALL {
            assert_eq!(Section::from_keyword(section.keyword()), Some(section));
        }
        assert_eq!(Section::from_keyword("BASE"), None);
        assert!(Section::Reference.is_repeatable());
        assert!(!Section::Comment.is_required());
        assert!(Section::Origin.is_required());
    }

    #[test]
    fn test_headers_and_continuations() {
        let text = "DEFINITION  Bluetongue virus 1 segment 10\n            gene, complete cds.\n";
        assert_eq!(
            kinds(text),
            vec![
                LineKind::Header {
                    section: Section::Definition,
                    content: "Bluetongue virus 1 segment 10"
                },
                LineKind::Continuation {
                    content: "gene, complete cds."
                },
            ]
        );
    }

    #[test]
    fn test_sub_headers_follow_their_parent() {
        let text = "SOURCE      Bluetongue virus 1 (BTV-1)\n  ORGANISM  Bluetongue virus 1\n            Viruses; Orbivirus.\n";
        let got = kinds(text);
        assert_eq!(
            got[1],
            LineKind::SubHeader {
                field: SubKeyword::Organism,
                content: "Bluetongue virus 1"
            }
        );
        assert_eq!(
            got[2],
            LineKind::Continuation {
                content: "Viruses; Orbivirus."
            }
        );
    }

    #[test]
    fn test_sub_header_under_wrong_section_is_malformed() {
        let text = "SOURCE      x\n  AUTHORS   Someone,A.\n";
        let err = LineClassifier::new(text)
            .find_map(|line| line.err())
            .unwrap();
        assert!(matches!(err, ParseError::MalformedLine { line: 2, section: "SOURCE", .. }));
    }

    #[test]
    fn test_feature_lines() {
        let text = concat!(
            "FEATURES             Location/Qualifiers\n",
            "     CDS             20..703\n",
            "                     /product=\"NS3\"\n",
            "                     /translation=\"MLSG\n",
            "                     LKQ\"\n",
        );
        assert_eq!(
            kinds(text)[1..],
            [
                LineKind::FeatureKey {
                    key: "CDS",
                    location: "20..703"
                },
                LineKind::Qualifier {
                    text: "product=\"NS3\""
                },
                LineKind::Qualifier {
                    text: "translation=\"MLSG"
                },
                LineKind::QualifierContinuation { content: "LKQ\"" },
            ]
        );
    }

    #[test]
    fn test_tolerates_column_drift() {
        // qualifier column shifted two to the left of the header measurement
        let text = "FEATURES             Location/Qualifiers\n     CDS             1..9\n                   LKQ\n";
        assert_eq!(
            kinds(text)[2],
            LineKind::QualifierContinuation { content: "LKQ" }
        );
    }

    #[test]
    fn test_sequence_lines_and_terminator() {
        let text = "ORIGIN      \n        1 gtataaaatt acgc\n//\nLOCUS       NEXT\n";
        let mut classifier = LineClassifier::new(text);
        let got: Vec<_> = classifier.by_ref().map(|l| l.unwrap().kind).collect();
        assert_eq!(
            got,
            vec![
                LineKind::Header {
                    section: Section::Origin,
                    content: ""
                },
                LineKind::Sequence {
                    offset: 1,
                    residues: "gtataaaatt acgc"
                },
                LineKind::Terminator,
            ]
        );
        assert_eq!(classifier.trailing_content(), Some((4, "LOCUS       NEXT")));
    }

    #[test]
    fn test_unknown_keyword_is_malformed() {
        let text = "LOCUS       X 1 bp DNA\nBASE COUNT  1 a\n";
        let results: Vec<_> = LineClassifier::new(text).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1],
            Err(ParseError::MalformedLine { line: 2, section: "LOCUS", .. })
        ));
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let got = kinds("\n   \nLOCUS       X\n");
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn test_restartable() {
        let text = "LOCUS       X 10 bp DNA\nDEFINITION  y.\n//\n";
        let first: Vec<_> = LineClassifier::new(text).collect();
        let second: Vec<_> = LineClassifier::new(text).collect();
        assert_eq!(first, second);
    }
}
