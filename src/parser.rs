//! Pull parser for PIT `mutations.xml` reports.
//!
//! The report is read event by event. Each `<mutation>` element becomes one
//! [`Mutant`]; its child elements may come in any order and unknown ones are
//! skipped. A child whose text cannot be converted keeps its default value and
//! is logged, while a stream that is not well-formed XML fails the whole parse.

use crate::error::{ReportError, Result};
use crate::location::MutantLocation;
use crate::mutant::Mutant;
use crate::mutator::MutatorCatalog;
use crate::status;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

const ENTRY_TAG: &[u8] = b"mutation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SourceFile,
    MutatedClass,
    MutatedMethod,
    MethodDescription,
    LineNumber,
    Mutator,
    Index,
    Description,
    KillingTest,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"sourceFile" => Some(Field::SourceFile),
            b"mutatedClass" => Some(Field::MutatedClass),
            b"mutatedMethod" => Some(Field::MutatedMethod),
            b"methodDescription" => Some(Field::MethodDescription),
            b"lineNumber" => Some(Field::LineNumber),
            b"mutator" => Some(Field::Mutator),
            b"index" => Some(Field::Index),
            b"description" => Some(Field::Description),
            b"killingTest" => Some(Field::KillingTest),
            _ => None,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Field::SourceFile => "sourceFile",
            Field::MutatedClass => "mutatedClass",
            Field::MutatedMethod => "mutatedMethod",
            Field::MethodDescription => "methodDescription",
            Field::LineNumber => "lineNumber",
            Field::Mutator => "mutator",
            Field::Index => "index",
            Field::Description => "description",
            Field::KillingTest => "killingTest",
        }
    }
}

/// Values collected for the entry being read. A fresh one is created for
/// every `<mutation>` so nothing carries over between entries.
#[derive(Debug, Default)]
struct EntryFields {
    detected: bool,
    status: Option<String>,
    source_file: String,
    mutated_class: String,
    mutated_method: String,
    method_descriptor: String,
    line_number: u32,
    mutator: String,
    index: u32,
    description: Option<String>,
    killing_test: Option<String>,
}

impl EntryFields {
    fn from_attributes(element: &BytesStart<'_>) -> Result<Self> {
        let mut fields = EntryFields::default();

        for attribute in element.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = attribute.key.local_name();
            let value = match attribute.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(e) => {
                    warn!(
                        "caught {} processing attribute {}.. ignoring",
                        e,
                        String::from_utf8_lossy(key.as_ref())
                    );
                    continue;
                }
            };

            match key.as_ref() {
                b"detected" => fields.detected = parse_flag(&value),
                b"status" => fields.status = Some(value),
                other => trace!("Ignoring attribute {}", String::from_utf8_lossy(other)),
            }
        }

        Ok(fields)
    }

    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::SourceFile => self.source_file = text,
            Field::MutatedClass => self.mutated_class = text,
            Field::MutatedMethod => self.mutated_method = text,
            Field::MethodDescription => self.method_descriptor = text,
            Field::LineNumber => self.line_number = parse_number(field, &text),
            Field::Mutator => self.mutator = text,
            Field::Index => self.index = parse_number(field, &text),
            Field::Description => self.description = Some(text),
            Field::KillingTest => self.killing_test = Some(text),
        }
    }
}

fn parse_number(field: Field, text: &str) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "caught {} processing tag {} (value {:?}).. ignoring",
                e,
                field.tag(),
                text
            );
            0
        }
    }
}

fn parse_flag(text: &str) -> bool {
    match text.trim() {
        flag if flag.eq_ignore_ascii_case("true") => true,
        flag if flag.eq_ignore_ascii_case("false") => false,
        other => {
            warn!(
                "caught invalid boolean processing attribute detected (value {:?}).. ignoring",
                other
            );
            false
        }
    }
}

/// Text being collected for one child element of an entry.
#[derive(Debug)]
struct Capture {
    field: Field,
    text: String,
    nested: usize,
    failure: Option<String>,
}

impl Capture {
    fn new(field: Field) -> Self {
        Capture {
            field,
            text: String::new(),
            nested: 0,
            failure: None,
        }
    }

    fn fail(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    fn commit(self, fields: &mut EntryFields) {
        match self.failure {
            Some(reason) => warn!(
                "caught {} processing tag {}.. ignoring",
                reason,
                self.field.tag()
            ),
            None => fields.set(self.field, self.text.trim().to_string()),
        }
    }
}

#[derive(Debug)]
enum ParserState {
    OutsideEntry,
    InsideEntry {
        fields: EntryFields,
        capture: Option<Capture>,
    },
}

/// State for a single pass over one report.
struct Session<'c> {
    catalog: &'c MutatorCatalog,
    state: ParserState,
    depth: usize,
    saw_root: bool,
    root_closed: bool,
    mutants: Vec<Mutant>,
}

impl<'c> Session<'c> {
    fn new(catalog: &'c MutatorCatalog) -> Self {
        Session {
            catalog,
            state: ParserState::OutsideEntry,
            depth: 0,
            saw_root: false,
            root_closed: false,
            mutants: Vec::new(),
        }
    }

    /// A document has exactly one root element.
    fn open_element(&mut self) -> Result<()> {
        if self.root_closed {
            return Err(ReportError::Malformed(
                "element after the end of the root element".to_string(),
            ));
        }
        self.saw_root = true;
        Ok(())
    }

    fn close_element(&mut self) {
        if self.depth == 0 {
            self.root_closed = true;
        }
    }

    fn check_outside_root(&self, content: &[u8]) -> Result<()> {
        if self.depth == 0 && !content.iter().all(u8::is_ascii_whitespace) {
            return Err(ReportError::Malformed(
                "text outside the root element".to_string(),
            ));
        }
        Ok(())
    }

    fn start_element(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = element.local_name();
        let tag = name.as_ref();

        if tag == ENTRY_TAG {
            if matches!(self.state, ParserState::InsideEntry { .. }) {
                warn!("Nested mutation element, discarding the enclosing entry");
            }
            self.state = ParserState::InsideEntry {
                fields: EntryFields::from_attributes(element)?,
                capture: None,
            };
            return Ok(());
        }

        match &mut self.state {
            ParserState::OutsideEntry => {
                trace!("Skipping tag {} outside of a mutation", String::from_utf8_lossy(tag));
            }
            ParserState::InsideEntry {
                capture: Some(active),
                ..
            } => {
                active.nested += 1;
                active.fail(format!(
                    "unexpected child element {}",
                    String::from_utf8_lossy(tag)
                ));
            }
            ParserState::InsideEntry { capture, .. } => match Field::from_tag(tag) {
                Some(field) => *capture = Some(Capture::new(field)),
                None => debug!("Ignoring tag {}", String::from_utf8_lossy(tag)),
            },
        }
        Ok(())
    }

    fn empty_element(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = element.local_name();
        let tag = name.as_ref();

        if tag == ENTRY_TAG {
            self.start_element(element)?;
            return self.end_element(ENTRY_TAG);
        }

        match &mut self.state {
            ParserState::OutsideEntry => {}
            ParserState::InsideEntry {
                capture: Some(active),
                ..
            } => active.fail(format!(
                "unexpected child element {}",
                String::from_utf8_lossy(tag)
            )),
            ParserState::InsideEntry {
                fields,
                capture: None,
            } => match Field::from_tag(tag) {
                Some(field) => fields.set(field, String::new()),
                None => debug!("Ignoring tag {}", String::from_utf8_lossy(tag)),
            },
        }
        Ok(())
    }

    fn end_element(&mut self, tag: &[u8]) -> Result<()> {
        let ParserState::InsideEntry { fields, capture } = &mut self.state else {
            return Ok(());
        };

        if let Some(active) = capture.as_mut() {
            if active.nested > 0 {
                active.nested -= 1;
                return Ok(());
            }
        }
        if let Some(active) = capture.take() {
            active.commit(fields);
            return Ok(());
        }

        if tag == ENTRY_TAG {
            if let ParserState::InsideEntry { fields, .. } =
                std::mem::replace(&mut self.state, ParserState::OutsideEntry)
            {
                let mutant = self.materialize(fields)?;
                self.mutants.push(mutant);
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let ParserState::InsideEntry {
            capture: Some(active),
            ..
        } = &mut self.state
        {
            if active.nested == 0 {
                active.text.push_str(text);
            }
        }
    }

    fn text_failed(&mut self, reason: String) {
        if let ParserState::InsideEntry {
            capture: Some(active),
            ..
        } = &mut self.state
        {
            active.fail(reason);
        }
    }

    fn materialize(&self, fields: EntryFields) -> Result<Mutant> {
        let location = MutantLocation::new(
            fields.mutated_class,
            fields.source_file,
            fields.mutated_method,
            fields.method_descriptor,
            fields.line_number,
        )?;

        Ok(Mutant::new(
            fields.detected,
            status::classify(fields.status.as_deref()),
            location,
            self.catalog.lookup(&fields.mutator),
            fields.index,
            fields.description,
            fields.killing_test,
        ))
    }

    fn finish(self) -> Result<Vec<Mutant>> {
        if self.depth > 0 {
            return Err(ReportError::Malformed(format!(
                "unexpected end of document with {} open element(s)",
                self.depth
            )));
        }
        if !self.saw_root {
            return Err(ReportError::Malformed(
                "document has no root element".to_string(),
            ));
        }
        Ok(self.mutants)
    }
}

/// Parses PIT XML reports, resolving mutators against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct ReportParser<'c> {
    catalog: &'c MutatorCatalog,
}

impl Default for ReportParser<'static> {
    fn default() -> Self {
        ReportParser::new(MutatorCatalog::builtin())
    }
}

impl<'c> ReportParser<'c> {
    pub fn new(catalog: &'c MutatorCatalog) -> Self {
        ReportParser { catalog }
    }

    /// Reads a whole report from `input`.
    ///
    /// Returns no mutants at all when the stream fails structurally.
    pub fn parse<R: BufRead>(&self, input: R) -> Result<Vec<Mutant>> {
        let mut reader = Reader::from_reader(input);

        let mut session = Session::new(self.catalog);
        let mut buf = Vec::new();

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    error!(
                        "XML is not valid at position {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    return Err(e.into());
                }
            };

            match event {
                Event::Start(element) => {
                    session.open_element()?;
                    session.depth += 1;
                    session.start_element(&element)?;
                }
                Event::Empty(element) => {
                    session.open_element()?;
                    session.empty_element(&element)?;
                    session.close_element();
                }
                Event::End(element) => {
                    session.depth = session.depth.saturating_sub(1);
                    session.end_element(element.local_name().as_ref())?;
                    session.close_element();
                }
                Event::Text(text) => {
                    session.check_outside_root(&text)?;
                    match text.unescape() {
                        Ok(text) => session.text(&text),
                        Err(e) => session.text_failed(e.to_string()),
                    }
                }
                Event::CData(data) => {
                    session.check_outside_root(&data)?;
                    match std::str::from_utf8(&data) {
                        Ok(text) => session.text(text),
                        Err(e) => session.text_failed(e.to_string()),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        session.finish()
    }

    /// Parses the report at `path`. A missing file is not an error: it is
    /// logged and yields no mutants.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Mutant>> {
        if !path.exists() {
            warn!("No XML PIT report found at {}", path.display());
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mutants = self.parse(BufReader::new(file))?;
        info!("Parsed {} mutants from {}", mutants.len(), path.display());
        Ok(mutants)
    }
}

/// Parses a report with the built-in mutator catalog.
pub fn parse_report<R: BufRead>(input: R) -> Result<Vec<Mutant>> {
    ReportParser::default().parse(input)
}

/// Parses the report file at `path` with the built-in mutator catalog.
pub fn parse_report_file(path: &Path) -> Result<Vec<Mutant>> {
    ReportParser::default().parse_file(path)
}
