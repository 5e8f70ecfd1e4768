// Field-level parsers for header sections
//
// Each function takes the already-joined text of one field plus the line it
// started on, and returns the typed value or an InvalidField error.

use super::error::{ParseError, Result};
use super::models::{
    AccessionVersion, BaseRange, Comment, LengthUnit, Locus, Organism, StructuredComment, Topology,
};
use chrono::NaiveDate;

/// Join free-text lines with a single space, dropping blank lines
pub(crate) fn join_text(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `JQ610684  761 bp  RNA  linear  VRL 13-MAR-2012`
pub(crate) fn parse_locus(line: usize, content: &str) -> Result<Locus> {
    let invalid = |field: &'static str, msg: String| ParseError::invalid_field(line, "LOCUS", field, msg);

    let mut tokens = content.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| invalid("name", "LOCUS line is empty".to_string()))?;
    let length_token = tokens
        .next()
        .ok_or_else(|| invalid("length", "missing sequence length".to_string()))?;
    let length = length_token
        .parse::<usize>()
        .map_err(|_| invalid("length", format!("{:?} is not a residue count", length_token)))?;
    let unit = match tokens.next() {
        Some("bp") => LengthUnit::Bp,
        Some("aa") => LengthUnit::Aa,
        other => {
            return Err(invalid(
                "unit",
                format!("expected 'bp' or 'aa', found {:?}", other.unwrap_or_default()),
            ))
        },
    };

    let mut locus = Locus {
        name: name.to_string(),
        length,
        unit,
        molecule_type: None,
        topology: Topology::default(),
        division_code: None,
        date: None,
    };

    for token in tokens {
        match token {
            "linear" => locus.topology = Topology::Linear,
            "circular" => locus.topology = Topology::Circular,
            _ if looks_like_date(token) => {
                let date = NaiveDate::parse_from_str(token, "%d-%b-%Y")
                    .map_err(|e| invalid("date", format!("{:?}: {}", token, e)))?;
                locus.date = Some(date);
            },
            _ if locus.molecule_type.is_none() && locus.division_code.is_none() && !is_division_code(token) => {
                locus.molecule_type = Some(token.to_string());
            },
            _ if locus.division_code.is_none() && is_division_code(token) => {
                locus.division_code = Some(token.to_string());
            },
            _ => return Err(invalid("token", format!("unexpected {:?}", token))),
        }
    }

    Ok(locus)
}

fn looks_like_date(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 11 && bytes[2] == b'-' && bytes[6] == b'-' && bytes[0].is_ascii_digit()
}

/// Three upper-case letters; unknown codes are kept as written
fn is_division_code(token: &str) -> bool {
    token.len() == 3 && token.bytes().all(|b| b.is_ascii_uppercase()) && !matches!(token, "DNA" | "RNA")
}

/// Primary accession followed by any secondary accessions
pub(crate) fn parse_accession(line: usize, text: &str) -> Result<(String, Vec<String>)> {
    let mut tokens = text.split_whitespace();
    let primary = tokens
        .next()
        .ok_or_else(|| ParseError::invalid_field(line, "ACCESSION", "accession", "no accession given"))?;
    Ok((primary.to_string(), tokens.map(str::to_string).collect()))
}

/// `JQ610684.1` optionally followed by `GI:123456`
pub(crate) fn parse_version(line: usize, content: &str) -> Result<(AccessionVersion, Option<String>)> {
    let mut tokens = content.split_whitespace();
    let token = tokens
        .next()
        .ok_or_else(|| ParseError::invalid_field(line, "VERSION", "version", "no version given"))?;
    let accession = token
        .parse::<AccessionVersion>()
        .map_err(|e| ParseError::invalid_field(line, "VERSION", "version", e.to_string()))?;

    let gi = match tokens.next() {
        None => None,
        Some(token) => match token.strip_prefix("GI:") {
            Some(gi) if !gi.is_empty() && gi.bytes().all(|b| b.is_ascii_digit()) => Some(gi.to_string()),
            _ => {
                return Err(ParseError::invalid_field(
                    line,
                    "VERSION",
                    "gi",
                    format!("unexpected {:?}", token),
                ))
            },
        },
    };

    Ok((accession, gi))
}

/// `.` alone means no keywords
pub(crate) fn parse_keywords(text: &str) -> Vec<String> {
    text.trim()
        .trim_end_matches('.')
        .split(';')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the organism from the SOURCE text and the ORGANISM lines. The first
/// ORGANISM line is the scientific name; a wrapped name continues until the
/// lineage starts at the first line with a `;` separator. Without any `;` only
/// a final line closed by a period is lineage.
pub(crate) fn parse_organism(line: usize, source: &str, organism_lines: &[&str]) -> Result<Organism> {
    let common_name = source.trim().trim_end_matches('.').to_string();
    let acronym = common_name
        .strip_suffix(')')
        .and_then(|s| s.rsplit_once('('))
        .map(|(_, acronym)| acronym.trim().to_string())
        .filter(|a| !a.is_empty());

    let lines: Vec<&str> = organism_lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    let (first, rest) = lines
        .split_first()
        .ok_or_else(|| ParseError::invalid_field(line, "SOURCE", "ORGANISM", "missing scientific name"))?;

    let lineage_start = rest
        .iter()
        .position(|text| text.contains(';'))
        .or_else(|| rest.last().filter(|text| text.ends_with('.')).map(|_| rest.len() - 1))
        .unwrap_or(rest.len());

    let scientific_name = std::iter::once(*first)
        .chain(rest[..lineage_start].iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    let lineage_text = rest[lineage_start..].join(" ");

    let lineage = lineage_text
        .trim_end_matches('.')
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Organism {
        scientific_name,
        common_name,
        acronym,
        lineage,
    })
}

/// `1  (bases 1 to 761)`; ranges may be several (`;`-separated) or absent
pub(crate) fn parse_reference_header(line: usize, text: &str) -> Result<(u32, Vec<BaseRange>)> {
    let invalid = |field: &'static str, msg: String| ParseError::invalid_field(line, "REFERENCE", field, msg);

    let text = text.trim();
    let (number, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let number = number
        .parse::<u32>()
        .map_err(|_| invalid("number", format!("{:?} is not a reference number", number)))?;

    let rest = rest.trim();
    if rest.is_empty() {
        return Ok((number, Vec::new()));
    }

    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid("bases", format!("unexpected {:?}", rest)))?
        .trim();
    if inner == "sites" {
        return Ok((number, Vec::new()));
    }

    let spans = inner
        .strip_prefix("bases")
        .or_else(|| inner.strip_prefix("residues"))
        .ok_or_else(|| invalid("bases", format!("unexpected {:?}", inner)))?;

    let mut ranges = Vec::new();
    for span in spans.split(';') {
        let bounds = span
            .split_once(" to ")
            .and_then(|(start, end)| Some((start.trim().parse::<usize>().ok()?, end.trim().parse::<usize>().ok()?)));
        match bounds {
            Some((start, end)) if start >= 1 && start <= end => ranges.push(BaseRange { start, end }),
            _ => return Err(invalid("bases", format!("bad range {:?}", span.trim()))),
        }
    }

    Ok((number, ranges))
}

/// `A,B., C,D. and E,F.` → `["A,B.", "C,D.", "E,F."]`
pub(crate) fn split_authors(text: &str) -> Vec<String> {
    let (head, last) = match text.rfind(" and ") {
        Some(idx) => (&text[..idx], Some(&text[idx + 5..])),
        None => (text, None),
    };
    head.split(", ")
        .chain(last)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split COMMENT lines into free text and the first structured block.
/// Later blocks stay in the free text.
pub(crate) fn parse_comment(line: usize, lines: &[&str]) -> Result<Comment> {
    let mut text_lines: Vec<&str> = Vec::new();
    let mut structured: Option<StructuredComment> = None;
    let mut open: Option<StructuredComment> = None;

    for raw in lines {
        let trimmed = raw.trim();

        if let Some(block) = open.as_mut() {
            if trimmed == format!("##{}-END##", block.name) {
                structured = open.take();
                continue;
            }
            match trimmed.split_once("::") {
                Some((key, value)) => block
                    .entries
                    .push((key.trim().to_string(), value.trim().to_string())),
                None => match block.entries.last_mut() {
                    Some((_, value)) if !trimmed.is_empty() => {
                        value.push(' ');
                        value.push_str(trimmed);
                    },
                    Some(_) => {},
                    None => {
                        return Err(ParseError::invalid_field(
                            line,
                            "COMMENT",
                            "structured comment",
                            format!("expected 'key :: value', found {:?}", trimmed),
                        ))
                    },
                },
            }
            continue;
        }

        let start = trimmed
            .strip_prefix("##")
            .and_then(|s| s.strip_suffix("-START##"));
        match start {
            Some(name) if structured.is_none() => {
                open = Some(StructuredComment {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
            },
            Some(name) => {
                tracing::warn!(block = name, "Keeping additional structured comment block as text");
                text_lines.push(trimmed);
            },
            None => text_lines.push(trimmed),
        }
    }

    if let Some(block) = open {
        return Err(ParseError::invalid_field(
            line,
            "COMMENT",
            "structured comment",
            format!("block {:?} has no END marker", block.name),
        ));
    }

    Ok(Comment {
        text: join_text(&text_lines),
        structured,
    })
}
