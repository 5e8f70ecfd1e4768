// Data models for parsed GenBank records

use super::location::Location;
use chrono::NaiveDate;
use gbflat_common::checksum::sha256_hex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Source database, inferred from the accession prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDatabase {
    Genbank,
    Refseq,
}

impl SourceDatabase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDatabase::Genbank => "genbank",
            SourceDatabase::Refseq => "refseq",
        }
    }

    /// RefSeq accessions carry a two-letter prefix and an underscore (`NC_`, `XM_`)
    pub fn from_accession(accession: &str) -> Self {
        let bytes = accession.as_bytes();
        if bytes.len() > 3
            && bytes[..2].iter().all(u8::is_ascii_uppercase)
            && bytes[2] == b'_'
        {
            SourceDatabase::Refseq
        } else {
            SourceDatabase::Genbank
        }
    }
}

/// GenBank division, from the three-letter LOCUS code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Viral,         // VRL
    Bacterial,     // BCT
    Plant,         // PLN
    Mammalian,     // MAM
    Primate,       // PRI
    Rodent,        // ROD
    Vertebrate,    // VRT
    Invertebrate,  // INV
    Phage,         // PHG
    Synthetic,     // SYN
    Unannotated,   // UNA
    Environmental, // ENV
    Patent,        // PAT
    Est,           // EST
    Sts,           // STS
    Gss,           // GSS
    Htg,           // HTG
    Htc,           // HTC
    Con,           // CON
    Tsa,           // TSA
}

impl Division {
    pub fn from_code(code: &str) -> Option<Self> {
        let division = match code {
            "VRL" => Division::Viral,
            "BCT" => Division::Bacterial,
            "PLN" => Division::Plant,
            "MAM" => Division::Mammalian,
            "PRI" => Division::Primate,
            "ROD" => Division::Rodent,
            "VRT" => Division::Vertebrate,
            "INV" => Division::Invertebrate,
            "PHG" => Division::Phage,
            "SYN" => Division::Synthetic,
            "UNA" => Division::Unannotated,
            "ENV" => Division::Environmental,
            "PAT" => Division::Patent,
            "EST" => Division::Est,
            "STS" => Division::Sts,
            "GSS" => Division::Gss,
            "HTG" => Division::Htg,
            "HTC" => Division::Htc,
            "CON" => Division::Con,
            "TSA" => Division::Tsa,
            _ => return None,
        };
        Some(division)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Division::Viral => "VRL",
            Division::Bacterial => "BCT",
            Division::Plant => "PLN",
            Division::Mammalian => "MAM",
            Division::Primate => "PRI",
            Division::Rodent => "ROD",
            Division::Vertebrate => "VRT",
            Division::Invertebrate => "INV",
            Division::Phage => "PHG",
            Division::Synthetic => "SYN",
            Division::Unannotated => "UNA",
            Division::Environmental => "ENV",
            Division::Patent => "PAT",
            Division::Est => "EST",
            Division::Sts => "STS",
            Division::Gss => "GSS",
            Division::Htg => "HTG",
            Division::Htc => "HTC",
            Division::Con => "CON",
            Division::Tsa => "TSA",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Viral => "viral",
            Division::Bacterial => "bacterial",
            Division::Plant => "plant",
            Division::Mammalian => "mammalian",
            Division::Primate => "primate",
            Division::Rodent => "rodent",
            Division::Vertebrate => "vertebrate",
            Division::Invertebrate => "invertebrate",
            Division::Phage => "phage",
            Division::Synthetic => "synthetic",
            Division::Unannotated => "unannotated",
            Division::Environmental => "environmental",
            Division::Patent => "patent",
            Division::Est => "est",
            Division::Sts => "sts",
            Division::Gss => "gss",
            Division::Htg => "htg",
            Division::Htc => "htc",
            Division::Con => "con",
            Division::Tsa => "tsa",
        }
    }
}

/// Molecule topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

/// Unit of the LOCUS length: base pairs or amino acids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Bp,
    Aa,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Bp => "bp",
            LengthUnit::Aa => "aa",
        }
    }
}

/// LOCUS line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locus {
    pub name: String,
    pub length: usize,
    pub unit: LengthUnit,
    /// Molecule type as written (`DNA`, `mRNA`, `ss-RNA`, ...)
    pub molecule_type: Option<String>,
    pub topology: Topology,
    pub division_code: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Locus {
    pub fn division(&self) -> Option<Division> {
        self.division_code.as_deref().and_then(Division::from_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessionVersionError {
    #[error("missing '.VERSION' suffix in {0:?}")]
    MissingVersion(String),
    #[error("invalid accession {0:?}")]
    InvalidAccession(String),
    #[error("invalid version {0:?}: must be an integer of at least 1")]
    InvalidVersion(String),
}

/// `ACCESSION.VERSION` pair, e.g. `JQ610684.1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessionVersion {
    pub accession: String,
    pub version: u32,
}

impl AccessionVersion {
    pub fn new(accession: impl Into<String>, version: u32) -> Self {
        Self {
            accession: accession.into(),
            version,
        }
    }

    pub fn source_database(&self) -> SourceDatabase {
        SourceDatabase::from_accession(&self.accession)
    }
}

/// Accession characters: ASCII letters, digits and underscore
pub fn is_valid_accession(accession: &str) -> bool {
    !accession.is_empty()
        && accession
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for AccessionVersion {
    type Err = AccessionVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (accession, version) = s
            .rsplit_once('.')
            .ok_or_else(|| AccessionVersionError::MissingVersion(s.to_string()))?;

        if !is_valid_accession(accession) {
            return Err(AccessionVersionError::InvalidAccession(accession.to_string()));
        }

        let version = version
            .parse::<u32>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| AccessionVersionError::InvalidVersion(version.to_string()))?;

        Ok(Self::new(accession, version))
    }
}

impl fmt::Display for AccessionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.accession, self.version)
    }
}

/// SOURCE and ORGANISM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organism {
    pub scientific_name: String,
    /// SOURCE line text, trailing period removed
    pub common_name: String,
    /// Parenthesised abbreviation closing the SOURCE line, e.g. `BTV-1`
    pub acronym: Option<String>,
    /// Ordered lineage, root first
    pub lineage: Vec<String>,
}

/// Span of bases a reference covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseRange {
    pub start: usize,
    pub end: usize,
}

/// One REFERENCE block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub number: u32,
    pub ranges: Vec<BaseRange>,
    pub authors: Vec<String>,
    pub consortium: Option<String>,
    pub title: Option<String>,
    pub journal: String,
    pub pubmed: Option<String>,
    pub medline: Option<String>,
    pub remark: Option<String>,
}

/// `##Name-START##` ... `##Name-END##` block of `key :: value` lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredComment {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl StructuredComment {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// Free text outside the structured block, lines joined with a space
    pub text: String,
    pub structured: Option<StructuredComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Qualifier {
    pub name: String,
    /// `None` for flag qualifiers such as `/pseudo`
    pub value: Option<String>,
}

/// Ordered qualifiers of one feature; names may repeat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Qualifiers(Vec<Qualifier>);

impl Qualifiers {
    pub(crate) fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.push(Qualifier {
            name: name.into(),
            value,
        });
    }

    /// First value recorded under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|q| q.name == name)
            .find_map(|q| q.value.as_deref())
    }

    /// Every value recorded under `name`, in file order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |q| q.name == name)
            .filter_map(|q| q.value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|q| q.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureEntry {
    pub key: String,
    pub location: Location,
    pub qualifiers: Qualifiers,
}

impl FeatureEntry {
    pub fn qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers.get(name)
    }
}

/// A validated GenBank record
///
/// Only produced by a successful parse, so every invariant of the format
/// (section order, sequence length, location bounds) holds for any value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub(crate) locus: Locus,
    pub(crate) definition: String,
    pub(crate) accession: AccessionVersion,
    pub(crate) secondary_accessions: Vec<String>,
    pub(crate) gi: Option<String>,
    pub(crate) dblinks: Vec<String>,
    pub(crate) keywords: Vec<String>,
    pub(crate) organism: Organism,
    pub(crate) references: Vec<Reference>,
    pub(crate) comment: Option<Comment>,
    pub(crate) features: Vec<FeatureEntry>,
    pub(crate) sequence: String,
}

impl Record {
    pub fn locus(&self) -> &Locus {
        &self.locus
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn accession(&self) -> &str {
        &self.accession.accession
    }

    pub fn version(&self) -> u32 {
        self.accession.version
    }

    pub fn accession_version(&self) -> &AccessionVersion {
        &self.accession
    }

    pub fn secondary_accessions(&self) -> &[String] {
        &self.secondary_accessions
    }

    pub fn gi(&self) -> Option<&str> {
        self.gi.as_deref()
    }

    pub fn dblinks(&self) -> &[String] {
        &self.dblinks
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn organism(&self) -> &Organism {
        &self.organism
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn features(&self) -> &[FeatureEntry] {
        &self.features
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn division(&self) -> Option<Division> {
        self.locus.division()
    }

    pub fn source_database(&self) -> SourceDatabase {
        self.accession.source_database()
    }

    pub fn features_by_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FeatureEntry> + 'a {
        self.features.iter().filter(move |f| f.key == key)
    }

    pub fn source_feature(&self) -> Option<&FeatureEntry> {
        self.features_by_key("source").next()
    }

    pub fn cds_features(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.features_by_key("CDS")
    }

    /// NCBI taxonomy id from `/db_xref="taxon:N"` on the source feature
    pub fn taxonomy_id(&self) -> Option<u32> {
        self.source_feature()?
            .qualifiers
            .get_all("db_xref")
            .find_map(|xref| xref.strip_prefix("taxon:")?.parse().ok())
    }

    /// Fraction of G and C among the residues, 0.0 for an empty sequence
    pub fn gc_content(&self) -> f64 {
        if self.sequence.is_empty() {
            return 0.0;
        }
        let gc = self
            .sequence
            .bytes()
            .filter(|b| matches!(b.to_ascii_uppercase(), b'G' | b'C'))
            .count();
        gc as f64 / self.sequence.len() as f64
    }

    /// SHA-256 of the upper-cased sequence, hex encoded
    pub fn sequence_hash(&self) -> String {
        sha256_hex(self.sequence.to_ascii_uppercase())
    }

    /// FASTA with 60 residues per line
    pub fn to_fasta(&self) -> String {
        let mut fasta = format!(">{} {}\n", self.accession, self.definition);
        for chunk in self.sequence.as_bytes().chunks(60) {
            // residues are ASCII, checked during assembly
            fasta.push_str(&String::from_utf8_lossy(chunk));
            fasta.push('\n');
        }
        fasta
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accession_version_parse_and_display() {
        let av: AccessionVersion = "JQ610684.1".parse().unwrap();
        assert_eq!(av, AccessionVersion::new("JQ610684", 1));
        assert_eq!(av.to_string(), "JQ610684.1");
        assert_eq!(av.source_database(), SourceDatabase::Genbank);
    }

    #[test]
    fn test_accession_version_errors() {
        assert!(matches!(
            "JQ610684".parse::<AccessionVersion>(),
            Err(AccessionVersionError::MissingVersion(_))
        ));
        assert!(matches!(
            "JQ610684.0".parse::<AccessionVersion>(),
            Err(AccessionVersionError::InvalidVersion(_))
        ));
        assert!(matches!(
            "JQ-1.2".parse::<AccessionVersion>(),
            Err(AccessionVersionError::InvalidAccession(_))
        ));
    }

    #[test]
    fn test_refseq_inference() {
        assert_eq!(SourceDatabase::from_accession("NC_000913"), SourceDatabase::Refseq);
        assert_eq!(SourceDatabase::from_accession("XM_123"), SourceDatabase::Refseq);
        assert_eq!(SourceDatabase::from_accession("U00096"), SourceDatabase::Genbank);
    }

    #[test]
    fn test_division_codes() {
        assert_eq!(Division::from_code("VRL"), Some(Division::Viral));
        assert_eq!(Division::Viral.code(), "VRL");
        assert_eq!(Division::from_code("RNA"), None);
    }

    #[test]
    fn test_qualifiers_multi_value() {
        let mut qualifiers = Qualifiers::default();
        qualifiers.push("db_xref", Some("GeneID:1".to_string()));
        qualifiers.push("pseudo", None);
        qualifiers.push("db_xref", Some("taxon:9".to_string()));

        assert_eq!(qualifiers.len(), 3);
        assert_eq!(qualifiers.get("db_xref"), Some("GeneID:1"));
        assert_eq!(
            qualifiers.get_all("db_xref").collect::<Vec<_>>(),
            vec!["GeneID:1", "taxon:9"]
        );
        assert!(qualifiers.contains("pseudo"));
        assert_eq!(qualifiers.get("pseudo"), None);
    }

    #[test]
    fn test_structured_comment_lookup() {
        let block = StructuredComment {
            name: "Assembly-Data".to_string(),
            entries: vec![("Assembly Method".to_string(), "Lasergene v. 8.0".to_string())],
        };
        assert_eq!(block.get("Assembly Method"), Some("Lasergene v. 8.0"));
        assert_eq!(block.get("Coverage"), None);
    }
}
