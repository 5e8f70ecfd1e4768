// GenBank flat file parsing
//
// Text flows through three layers: the line classifier (lexer), the section
// state machine (parser, with field-level helpers in fields) and the ORIGIN
// sequence assembler. The result is an immutable Record.

pub mod error;
mod fields;
pub mod lexer;
pub mod location;
pub mod models;
pub mod parser;
pub mod sequence;

pub use error::{ParseError, ReadError};
pub use lexer::{ClassifiedLine, LineClassifier, LineKind, Section, SubKeyword};
pub use location::{reverse_complement, Location, LocationError, Strand};
pub use models::{
    AccessionVersion, AccessionVersionError, BaseRange, Comment, Division, FeatureEntry, LengthUnit, Locus,
    Organism, Qualifier, Qualifiers, Record, Reference, SourceDatabase, StructuredComment, Topology,
};
pub use parser::{parse_record, GenbankParser, GenbankReader};
pub use sequence::SequenceAssembler;
