//! Breakpoint records and the parser for `info breakpoints` listings.
//!
//! The listing is loosely structured: a label line, then one row per
//! breakpoint with five whitespace-separated columns
//! (`number enabled address file line`). The parser is lenient: a malformed
//! numeric column becomes `0` instead of failing the whole listing.

/// Target address as reported by the debugger.
pub type Address = u64;

/// Keyword that ends the label line of a breakpoint listing.
pub const HEADER_TERMINATOR: &str = "what";

/// One row of a breakpoint listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Debugger-assigned number (unique within one listing).
    pub number: u32,
    /// Enabled flag exactly as printed (usually `y` or `n`).
    pub enabled: char,
    /// Code address of the breakpoint.
    pub address: Address,
    /// Source file name.
    pub filename: String,
    /// Source line number.
    pub line: u32,
}

impl Breakpoint {
    /// Whether the enabled column reads as "yes".
    pub fn is_enabled(&self) -> bool {
        matches!(self.enabled, 'y' | 'Y')
    }
}

/// Column the parser expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Skipping the command echo and label line.
    Header,
    /// Expecting the breakpoint number.
    Number,
    /// Expecting the enabled flag.
    Enabled,
    /// Expecting the address.
    Address,
    /// Expecting the file name.
    Filename,
    /// Expecting the line number; consuming it commits the record.
    Line,
}

impl ParseState {
    /// Transition table for a non-header token.
    ///
    /// `Header` is left only through [`BreakpointParser::feed`] when the
    /// terminator keyword is seen, so it maps to itself here.
    pub const fn next(self) -> Self {
        match self {
            ParseState::Header => ParseState::Header,
            ParseState::Number => ParseState::Enabled,
            ParseState::Enabled => ParseState::Address,
            ParseState::Address => ParseState::Filename,
            ParseState::Filename => ParseState::Line,
            ParseState::Line => ParseState::Number,
        }
    }
}

/// Fields collected for the row currently being read.
#[derive(Debug, Default)]
struct PartialRecord {
    number: u32,
    enabled: char,
    address: Address,
    filename: String,
}

/// Incremental state machine over listing tokens.
#[derive(Debug)]
pub struct BreakpointParser {
    state: ParseState,
    terminator: String,
    current: PartialRecord,
    records: Vec<Breakpoint>,
}

impl BreakpointParser {
    /// Create a parser using the default header terminator.
    pub fn new() -> Self {
        Self::with_header_terminator(HEADER_TERMINATOR)
    }

    /// Create a parser that leaves the header on a custom keyword
    /// (compared ASCII case-insensitively).
    pub fn with_header_terminator(terminator: impl Into<String>) -> Self {
        Self {
            state: ParseState::Header,
            terminator: terminator.into(),
            current: PartialRecord::default(),
            records: Vec::new(),
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Feed one whitespace-free token. Empty tokens are ignored.
    pub fn feed(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        match self.state {
            ParseState::Header => {
                if token.eq_ignore_ascii_case(&self.terminator) {
                    self.state = ParseState::Number;
                }
                return;
            }
            ParseState::Number => {
                self.current = PartialRecord {
                    number: parse_column(token),
                    ..PartialRecord::default()
                };
            }
            ParseState::Enabled => {
                self.current.enabled = token.chars().next().unwrap_or_default();
            }
            ParseState::Address => {
                self.current.address = parse_address(token);
            }
            ParseState::Filename => {
                self.current.filename = token.to_string();
            }
            ParseState::Line => {
                let current = std::mem::take(&mut self.current);
                self.records.push(Breakpoint {
                    number: current.number,
                    enabled: current.enabled,
                    address: current.address,
                    filename: current.filename,
                    line: parse_column(token),
                });
            }
        }
        self.state = self.state.next();
    }

    /// Finish parsing. An incomplete trailing row is dropped.
    pub fn finish(self) -> Vec<Breakpoint> {
        if self.state != ParseState::Number && self.state != ParseState::Header {
            tracing::trace!(state = ?self.state, "discarding incomplete breakpoint row");
        }
        self.records
    }
}

impl Default for BreakpointParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the full response of an `info breakpoints` command.
pub fn parse_breakpoints(text: &str) -> Vec<Breakpoint> {
    let mut parser = BreakpointParser::new();
    for token in text.split_whitespace() {
        parser.feed(token);
    }
    parser.finish()
}

/// Leading decimal digits of `token`, or 0 when there are none.
fn parse_decimal(token: &str) -> u64 {
    let digits = token
        .find(|c: char| !c.is_ascii_digit())
        .map_or(token, |end| &token[..end]);
    digits.parse().unwrap_or(0)
}

fn parse_column(token: &str) -> u32 {
    u32::try_from(parse_decimal(token)).unwrap_or(0)
}

/// Addresses are decimal unless prefixed with `0x`.
fn parse_address(token: &str) -> Address {
    match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => {
            let digits = hex
                .find(|c: char| !c.is_ascii_hexdigit())
                .map_or(hex, |end| &hex[..end]);
            Address::from_str_radix(digits, 16).unwrap_or(0)
        }
        None => parse_decimal(token),
    }
}
