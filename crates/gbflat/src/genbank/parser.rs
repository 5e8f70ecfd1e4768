// GenBank flat file parser
//
// Drives the line classifier through the section state machine and builds a
// validated Record. Format documentation:
// https://www.ncbi.nlm.nih.gov/Sitemap/samplerecord.html

use super::error::{ParseError, ReadError, Result};
use super::fields;
use super::lexer::{ClassifiedLine, LineClassifier, LineKind, Section, SubKeyword};
use super::location::Location;
use super::models::{
    AccessionVersion, BaseRange, Comment, FeatureEntry, Locus, Organism, Qualifiers, Record, Reference,
};
use super::sequence::SequenceAssembler;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Stateless entry point; one value can parse any number of records
#[derive(Debug, Clone, Copy, Default)]
pub struct GenbankParser;

impl GenbankParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse exactly one record. Anything but blank lines after `//` is an error.
    pub fn parse(&self, text: &str) -> Result<Record> {
        let mut classifier = LineClassifier::new(text);
        let record = RecordBuilder::default().run(&mut classifier)?;

        if let Some((line, content)) = classifier.trailing_content() {
            return Err(ParseError::malformed(line, "end of record", content));
        }

        tracing::debug!(
            accession = %record.accession_version(),
            length = record.len(),
            features = record.features().len(),
            references = record.references().len(),
            "Parsed GenBank record"
        );
        Ok(record)
    }

    /// Parse all records from a reader, skipping records that fail to parse
    pub fn parse_all<R: Read>(&self, reader: R) -> std::io::Result<Vec<Record>> {
        self.collect_records(GenbankReader::new(BufReader::new(reader)), usize::MAX)
    }

    /// Parse at most `limit` records from a reader
    pub fn parse_with_limit<R: Read>(&self, reader: R, limit: usize) -> std::io::Result<Vec<Record>> {
        self.collect_records(GenbankReader::new(BufReader::new(reader)), limit)
    }

    /// Open a flat file, gunzipping it when the name ends in `.gz`
    pub fn read_path(&self, path: impl AsRef<Path>) -> std::io::Result<GenbankReader<Box<dyn BufRead>>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        tracing::debug!(path = %path.display(), "Opened GenBank file");
        Ok(GenbankReader::new(reader))
    }

    fn collect_records<R: BufRead>(&self, reader: GenbankReader<R>, limit: usize) -> std::io::Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for result in reader {
            if records.len() >= limit {
                break;
            }
            match result {
                Ok(record) => records.push(record),
                Err(ReadError::Io(e)) => return Err(e),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, "Failed to parse record");
                },
            }
        }

        if skipped > 0 {
            tracing::info!(parsed = records.len(), skipped, "Finished reading GenBank records");
        }
        Ok(records)
    }
}

/// Shorthand for `GenbankParser::new().parse(text)`
pub fn parse_record(text: &str) -> Result<Record> {
    GenbankParser::new().parse(text)
}

/// Iterator over the records of a multi-record stream
///
/// Lines are buffered until a `//` terminator and each buffered record is
/// parsed on its own, so one bad record does not stop the stream.
pub struct GenbankReader<R> {
    reader: R,
    buffer: String,
    line: usize,
    done: bool,
}

impl<R: BufRead> GenbankReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
            done: false,
        }
    }

    fn parse_buffer(&mut self, start_line: usize) -> std::result::Result<Record, ReadError> {
        let text = std::mem::take(&mut self.buffer);
        parse_record(&text).map_err(|source| ReadError::Parse { start_line, source })
    }
}

impl<R: BufRead> Iterator for GenbankReader<R> {
    type Item = std::result::Result<Record, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut start_line = None;
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    // unterminated tail still gets parsed so it reports MissingTerminator
                    return start_line.map(|start| self.parse_buffer(start));
                },
                Ok(_) => {
                    self.line += 1;
                    if start_line.is_none() {
                        if line.trim().is_empty() {
                            continue;
                        }
                        start_line = Some(self.line);
                    }
                    self.buffer.push_str(&line);
                    if line.trim_end() == "//" {
                        return start_line.map(|start| self.parse_buffer(start));
                    }
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(ReadError::Io(e)));
                },
            }
        }
    }
}

/// Field whose lines are still being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Section(Section),
    Sub(SubKeyword),
}

impl Field {
    fn keyword(self) -> &'static str {
        match self {
            Field::Section(section) => section.keyword(),
            Field::Sub(sub) => sub.keyword(),
        }
    }

    fn accepts_continuation(self) -> bool {
        !matches!(
            self,
            Field::Section(Section::Locus)
                | Field::Section(Section::Version)
                | Field::Section(Section::Features)
                | Field::Section(Section::Origin)
                | Field::Sub(SubKeyword::Pubmed)
                | Field::Sub(SubKeyword::Medline)
        )
    }
}

struct PendingField<'a> {
    field: Field,
    line: usize,
    lines: Vec<&'a str>,
}

#[derive(Default)]
struct ReferenceBuilder {
    line: usize,
    number: u32,
    ranges: Vec<BaseRange>,
    authors: Option<String>,
    consortium: Option<String>,
    title: Option<String>,
    journal: Option<String>,
    pubmed: Option<String>,
    medline: Option<String>,
    remark: Option<String>,
}

impl ReferenceBuilder {
    fn slot(&mut self, field: SubKeyword) -> Option<&mut Option<String>> {
        match field {
            SubKeyword::Authors => Some(&mut self.authors),
            SubKeyword::Consortium => Some(&mut self.consortium),
            SubKeyword::Title => Some(&mut self.title),
            SubKeyword::Journal => Some(&mut self.journal),
            SubKeyword::Pubmed => Some(&mut self.pubmed),
            SubKeyword::Medline => Some(&mut self.medline),
            SubKeyword::Remark => Some(&mut self.remark),
            SubKeyword::Organism => None,
        }
    }

    fn build(self) -> Result<Reference> {
        let journal = self.journal.ok_or_else(|| {
            ParseError::invalid_field(self.line, "REFERENCE", "JOURNAL", "reference has no JOURNAL")
        })?;
        Ok(Reference {
            number: self.number,
            ranges: self.ranges,
            authors: self.authors.as_deref().map(fields::split_authors).unwrap_or_default(),
            consortium: self.consortium,
            title: self.title,
            journal,
            pubmed: self.pubmed,
            medline: self.medline,
            remark: self.remark,
        })
    }
}

struct FeatureBuilder<'a> {
    line: usize,
    key: &'a str,
    location: String,
    qualifiers: Vec<(String, Option<String>)>,
    /// Last qualifier opened a quote that has not closed yet
    open_quote: bool,
}

impl<'a> FeatureBuilder<'a> {
    fn new(line: usize, key: &'a str, location: &str) -> Self {
        Self {
            line,
            key,
            location: location.to_string(),
            qualifiers: Vec::new(),
            open_quote: false,
        }
    }

    fn start_qualifier(&mut self, line: usize, text: &str) -> Result<()> {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (text, None),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || "_-'*".contains(c)) {
            return Err(ParseError::malformed(line, "FEATURES", text));
        }
        self.open_quote = value.as_deref().is_some_and(is_open_quote);
        self.qualifiers.push((name.to_string(), value));
        Ok(())
    }

    /// Wrapped qualifier text, or wrapped location before any qualifier
    fn continue_line(&mut self, line: usize, content: &str) -> Result<()> {
        match self.qualifiers.last_mut() {
            None => self.location.push_str(content),
            Some((_, Some(value))) => {
                value.push_str(content);
                self.open_quote = is_open_quote(value);
            },
            Some((_, None)) => return Err(ParseError::malformed(line, "FEATURES", content)),
        }
        Ok(())
    }

    fn build(self) -> Result<(usize, FeatureEntry)> {
        if self.open_quote {
            let name = self.qualifiers.last().map(|(n, _)| n.clone()).unwrap_or_default();
            return Err(ParseError::invalid_field(
                self.line,
                "FEATURES",
                "qualifier",
                format!("unterminated quoted value for /{}", name),
            ));
        }

        let location = self
            .location
            .parse::<Location>()
            .map_err(|e| ParseError::InvalidLocation {
                line: self.line,
                location: self.location.clone(),
                message: e.to_string(),
            })?;

        let mut qualifiers = Qualifiers::default();
        for (name, value) in self.qualifiers {
            qualifiers.push(name, value.map(dequote));
        }

        Ok((
            self.line,
            FeatureEntry {
                key: self.key.to_string(),
                location,
                qualifiers,
            },
        ))
    }
}

/// A quoted value is complete once its quote count is even (`""` escapes a quote)
fn is_open_quote(value: &str) -> bool {
    value.starts_with('"') && value.matches('"').count() % 2 == 1
}

fn dequote(value: String) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => value,
    }
}

/// Mutable state for one record; consumed by `run`
#[derive(Default)]
struct RecordBuilder<'a> {
    current: Option<Section>,
    seen: Vec<Section>,
    pending: Option<PendingField<'a>>,

    locus: Option<Locus>,
    definition: Option<String>,
    accession: Option<(String, Vec<String>)>,
    version: Option<(usize, AccessionVersion, Option<String>)>,
    dblinks: Vec<String>,
    keywords: Vec<String>,
    source: Option<(usize, String)>,
    organism: Option<Organism>,
    references: Vec<Reference>,
    reference: Option<ReferenceBuilder>,
    comment: Option<Comment>,
    features: Vec<(usize, FeatureEntry)>,
    feature: Option<FeatureBuilder<'a>>,
    sequence: SequenceAssembler,
}

impl<'a> RecordBuilder<'a> {
    fn run(mut self, classifier: &mut LineClassifier<'a>) -> Result<Record> {
        let mut classified_any = false;

        for line in classifier.by_ref() {
            let ClassifiedLine { number, kind } = line?;
            classified_any = true;

            if kind == LineKind::Terminator {
                return self.finish(number);
            }
            self.accept(number, kind)?;
        }

        if classified_any {
            Err(ParseError::MissingTerminator {
                line: classifier.last_line(),
            })
        } else {
            Err(ParseError::EmptyInput)
        }
    }

    fn section_name(&self) -> &'static str {
        self.current.map_or("start of record", Section::keyword)
    }

    fn accept(&mut self, line: usize, kind: LineKind<'a>) -> Result<()> {
        match kind {
            LineKind::Header { section, content } => {
                self.flush()?;
                self.close_section()?;
                self.open_section(line, section)?;
                if section != Section::Features && section != Section::Origin {
                    self.pending = Some(PendingField {
                        field: Field::Section(section),
                        line,
                        lines: vec![content],
                    });
                }
                if section == Section::Reference {
                    self.reference = Some(ReferenceBuilder {
                        line,
                        ..ReferenceBuilder::default()
                    });
                }
            },
            LineKind::SubHeader { field, content } => {
                self.flush()?;
                let duplicate = match field {
                    SubKeyword::Organism => self.organism.is_some(),
                    _ => self
                        .reference
                        .as_mut()
                        .and_then(|reference| reference.slot(field))
                        .is_some_and(|slot| slot.is_some()),
                };
                if duplicate {
                    return Err(ParseError::DuplicateSection {
                        line,
                        section: field.keyword(),
                    });
                }
                self.pending = Some(PendingField {
                    field: Field::Sub(field),
                    line,
                    lines: vec![content],
                });
            },
            LineKind::Continuation { content } => {
                let section = self.section_name();
                match self.pending.as_mut() {
                    Some(pending) if pending.field.accepts_continuation() => pending.lines.push(content),
                    _ if content.is_empty() => {},
                    _ => return Err(ParseError::malformed(line, section, content)),
                }
            },
            LineKind::FeatureKey { key, location } => {
                self.finish_feature()?;
                self.feature = Some(FeatureBuilder::new(line, key, location));
            },
            LineKind::Qualifier { text } => {
                let feature = self
                    .feature
                    .as_mut()
                    .ok_or_else(|| ParseError::malformed(line, "FEATURES", text))?;
                if feature.open_quote {
                    // a quoted value that wraps onto a line starting with '/'
                    feature.continue_line(line, &format!("/{}", text))?;
                } else {
                    feature.start_qualifier(line, text)?;
                }
            },
            LineKind::QualifierContinuation { content } => {
                self.feature
                    .as_mut()
                    .ok_or_else(|| ParseError::malformed(line, "FEATURES", content))?
                    .continue_line(line, content)?;
            },
            LineKind::Sequence { offset, residues } => {
                self.sequence.push_line(line, offset, residues)?;
            },
            LineKind::Terminator => {},
        }
        Ok(())
    }

    fn open_section(&mut self, line: usize, section: Section) -> Result<()> {
        let after = self.section_name();

        if self.seen.contains(&section) && !(section.is_repeatable() && self.current == Some(section)) {
            if section.is_repeatable() {
                return Err(ParseError::SectionOrder {
                    line,
                    after,
                    found: section.keyword(),
                    expected: self.next_required(),
                });
            }
            return Err(ParseError::DuplicateSection {
                line,
                section: section.keyword(),
            });
        }

        let backwards = match self.current {
            None => section != Section::Locus,
            Some(current) => section < current,
        };
        let skipped = Section::ALL.into_iter().find(|s| {
            s.is_required() && !self.seen.contains(s) && *s < section && self.current.map_or(true, |c| *s > c)
        });

        if backwards || skipped.is_some() {
            return Err(ParseError::SectionOrder {
                line,
                after,
                found: section.keyword(),
                expected: skipped.map_or_else(|| self.next_required(), Section::keyword),
            });
        }

        tracing::trace!(line, section = section.keyword(), "Entering section");
        if !self.seen.contains(&section) {
            self.seen.push(section);
        }
        self.current = Some(section);
        Ok(())
    }

    /// First mandatory section still missing, or the terminator
    fn next_required(&self) -> &'static str {
        Section::ALL
            .into_iter()
            .find(|s| s.is_required() && !self.seen.contains(s))
            .map_or("//", Section::keyword)
    }

    fn close_section(&mut self) -> Result<()> {
        match self.current {
            Some(Section::Source) => {
                if self.organism.is_none() {
                    let line = self.source.as_ref().map_or(0, |(line, _)| *line);
                    return Err(ParseError::invalid_field(line, "SOURCE", "ORGANISM", "SOURCE has no ORGANISM"));
                }
            },
            Some(Section::Reference) => {
                if let Some(builder) = self.reference.take() {
                    let reference = builder.build()?;
                    let expected = self.references.len() + 1;
                    if reference.number as usize != expected {
                        tracing::warn!(
                            number = reference.number,
                            expected,
                            "Reference numbers are not consecutive"
                        );
                    }
                    self.references.push(reference);
                }
            },
            Some(Section::Features) => self.finish_feature()?,
            _ => {},
        }
        Ok(())
    }

    fn finish_feature(&mut self) -> Result<()> {
        if let Some(builder) = self.feature.take() {
            self.features.push(builder.build()?);
        }
        Ok(())
    }

    /// Turn the collected lines of the open field into typed values
    fn flush(&mut self) -> Result<()> {
        let Some(PendingField { field, line, lines }) = self.pending.take() else {
            return Ok(());
        };
        let text = fields::join_text(&lines);

        match field {
            Field::Section(Section::Locus) => self.locus = Some(fields::parse_locus(line, &text)?),
            Field::Section(Section::Definition) => self.definition = Some(text),
            Field::Section(Section::Accession) => self.accession = Some(fields::parse_accession(line, &text)?),
            Field::Section(Section::Version) => {
                let (accession, gi) = fields::parse_version(line, &text)?;
                self.version = Some((line, accession, gi));
            },
            Field::Section(Section::Dblink) => {
                self.dblinks = lines
                    .iter()
                    .map(|l| l.trim())
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
            },
            Field::Section(Section::Keywords) => self.keywords = fields::parse_keywords(&text),
            Field::Section(Section::Source) => self.source = Some((line, text)),
            Field::Section(Section::Reference) => {
                let (number, ranges) = fields::parse_reference_header(line, &text)?;
                if let Some(reference) = self.reference.as_mut() {
                    reference.number = number;
                    reference.ranges = ranges;
                }
            },
            Field::Section(Section::Comment) => self.comment = Some(fields::parse_comment(line, &lines)?),
            Field::Section(Section::Features) | Field::Section(Section::Origin) => {},
            Field::Sub(SubKeyword::Organism) => {
                let source = self.source.as_ref().map_or("", |(_, text)| text.as_str());
                self.organism = Some(fields::parse_organism(line, source, &lines)?);
            },
            Field::Sub(sub) => {
                if let Some(slot) = self.reference.as_mut().and_then(|r| r.slot(sub)) {
                    *slot = Some(text);
                }
            },
        }

        tracing::trace!(line, field = field.keyword(), "Collected field");
        Ok(())
    }

    fn finish(mut self, line: usize) -> Result<Record> {
        self.flush()?;
        self.close_section()?;

        if let Some(missing) = Section::ALL
            .into_iter()
            .find(|s| s.is_required() && !self.seen.contains(s))
        {
            return Err(ParseError::SectionOrder {
                line,
                after: self.section_name(),
                found: "//",
                expected: missing.keyword(),
            });
        }

        let missing = |section: Section| ParseError::invalid_field(line, section.keyword(), "content", "section is empty");
        let locus = self.locus.ok_or_else(|| missing(Section::Locus))?;
        let (primary, secondary_accessions) = self.accession.ok_or_else(|| missing(Section::Accession))?;
        let (version_line, accession, gi) = self.version.ok_or_else(|| missing(Section::Version))?;
        let organism = self.organism.ok_or_else(|| missing(Section::Source))?;

        if accession.accession != primary {
            return Err(ParseError::invalid_field(
                version_line,
                "VERSION",
                "accession",
                format!("{} does not match ACCESSION {}", accession, primary),
            ));
        }

        for (feature_line, feature) in &self.features {
            if feature.location.end() > locus.length {
                return Err(ParseError::InvalidLocation {
                    line: *feature_line,
                    location: feature.location.to_string(),
                    message: format!("extends past the {} declared residues", locus.length),
                });
            }
        }

        let sequence = self.sequence.finish(locus.length)?;

        Ok(Record {
            definition: self.definition.unwrap_or_default(),
            accession,
            secondary_accessions,
            gi,
            dblinks: self.dblinks,
            keywords: self.keywords,
            organism,
            references: self.references,
            comment: self.comment,
            features: self.features.into_iter().map(|(_, feature)| feature).collect(),
            sequence,
            locus,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
LOCUS       TEST1                     20 bp    DNA     linear   SYN 01-JAN-2020
DEFINITION  Synthetic test construct.
ACCESSION   TEST1
VERSION     TEST1.1
KEYWORDS    .
SOURCE      synthetic construct
  ORGANISM  synthetic construct
            other sequences; artificial sequences.
FEATURES             Location/Qualifiers
     source          1..20
                     /organism=\"synthetic construct\"
                     /mol_type=\"other DNA\"
ORIGIN
        1 acgtacgtac gtacgtacgt
//
";

    fn replace(text: &str, from: &str, to: &str) -> String {
        assert!(text.contains(from), "fixture does not contain {:?}", from);
        text.replacen(from, to, 1)
    }

    #[test]
    fn test_parse_minimal_record() {
        let record = parse_record(MINIMAL).unwrap();
        assert_eq!(record.accession(), "TEST1");
        assert_eq!(record.version(), 1);
        assert_eq!(record.len(), 20);
        assert!(record.keywords().is_empty());
        assert!(record.references().is_empty());
        assert_eq!(record.organism().lineage, vec!["other sequences", "artificial sequences"]);
        assert_eq!(record.features().len(), 1);
        assert_eq!(record.source_feature().unwrap().qualifier("mol_type"), Some("other DNA"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_record(""), Err(ParseError::EmptyInput));
        assert_eq!(parse_record("\n  \n"), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_missing_terminator() {
        let text = MINIMAL.trim_end().trim_end_matches("//");
        assert!(matches!(parse_record(text), Err(ParseError::MissingTerminator { .. })));
    }

    #[test]
    fn test_duplicate_section() {
        let text = replace(MINIMAL, "VERSION     TEST1.1\n", "VERSION     TEST1.1\nVERSION     TEST1.1\n");
        assert_eq!(
            parse_record(&text),
            Err(ParseError::DuplicateSection {
                line: 5,
                section: "VERSION"
            })
        );
    }

    #[test]
    fn test_skipped_mandatory_section() {
        let text = replace(MINIMAL, "ACCESSION   TEST1\n", "");
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::SectionOrder {
                found: "VERSION",
                expected: "ACCESSION",
                ..
            })
        ));
    }

    #[test]
    fn test_section_out_of_order() {
        let text = replace(MINIMAL, "KEYWORDS    .\n", "").replacen(
            "FEATURES ",
            "KEYWORDS    .\nFEATURES ",
            1,
        );
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::SectionOrder {
                after: "SOURCE",
                found: "KEYWORDS",
                ..
            })
        ));
    }

    #[test]
    fn test_version_must_match_accession() {
        let text = replace(MINIMAL, "VERSION     TEST1.1", "VERSION     OTHER.1");
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::InvalidField {
                section: "VERSION",
                ..
            })
        ));
    }

    #[test]
    fn test_trailing_content_after_terminator() {
        let text = format!("{}\nLOCUS       NEXT\n", MINIMAL);
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::MalformedLine { line: 17, .. })
        ));
        // blank lines after the terminator are fine
        assert!(parse_record(&format!("{}\n\n", MINIMAL)).is_ok());
    }

    #[test]
    fn test_location_past_sequence_end() {
        let text = replace(MINIMAL, "source          1..20", "source          1..21");
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::InvalidLocation { line: 10, .. })
        ));
    }

    #[test]
    fn test_sequence_length_mismatch() {
        let text = replace(MINIMAL, "20 bp", "30 bp").replacen("1..20", "1..30", 1);
        assert_eq!(
            parse_record(&text),
            Err(ParseError::SequenceLengthMismatch {
                declared: 30,
                assembled: 20
            })
        );
    }

    #[test]
    fn test_wrapped_location_and_quoted_slash() {
        let text = replace(
            MINIMAL,
            "     source          1..20\n",
            concat!(
                "     source          1..20\n",
                "     misc_feature    join(1..4,\n",
                "                     9..12)\n",
                "                     /note=\"see \"\"A\"\" and\n",
                "                     /or B\"\n",
                "                     /pseudo\n",
            ),
        );
        let record = parse_record(&text).unwrap();
        let feature = record.features_by_key("misc_feature").next().unwrap();
        assert_eq!(feature.location.to_string(), "join(1..4,9..12)");
        assert_eq!(feature.qualifier("note"), Some("see \"A\" and/or B"));
        assert!(feature.qualifiers.contains("pseudo"));
    }

    #[test]
    fn test_unterminated_quote() {
        let text = replace(MINIMAL, "/mol_type=\"other DNA\"", "/mol_type=\"other DNA");
        assert!(matches!(
            parse_record(&text),
            Err(ParseError::InvalidField { field: "qualifier", .. })
        ));
    }

    #[test]
    fn test_reader_skips_bad_records() {
        let bad = replace(MINIMAL, "20 bp", "21 bp");
        let stream = format!("{}{}\n{}", MINIMAL, bad, MINIMAL);

        let results: Vec<_> = GenbankReader::new(stream.as_bytes()).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ReadError::Parse { start_line: 16, .. })
        ));

        let records = GenbankParser::new().parse_all(stream.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        let limited = GenbankParser::new().parse_with_limit(stream.as_bytes(), 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_reader_reports_unterminated_tail() {
        let stream = format!("{}LOCUS       TAIL 4 bp DNA\n", MINIMAL);
        let results: Vec<_> = GenbankReader::new(stream.as_bytes()).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1],
            Err(ReadError::Parse {
                source: ParseError::MissingTerminator { .. },
                ..
            })
        ));
    }
}
