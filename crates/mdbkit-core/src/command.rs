//! Typed debugger commands and their wire rendering.
//!
//! `Display` produces the command line without its terminator; the session
//! adds the newline when sending.

use std::fmt;

use crate::breakpoint::Address;

/// What a watchpoint observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A raw data address.
    Address(Address),
    /// A named variable or SFR.
    Name(String),
}

/// Range selection for the `list` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    /// Continue listing from the current position.
    Current,
    /// Lines around `n`.
    Around(u32),
    /// From `n` onwards.
    From(u32),
    /// Up to `n`.
    Until(u32),
    /// Lines `first` through `last`.
    Range {
        /// First line.
        first: u32,
        /// Last line.
        last: u32,
    },
    /// The lines before the last listing.
    Previous,
    /// The lines after the last listing.
    Next,
    /// Around the start of a function.
    Function(String),
    /// Around a line in a specific file.
    FileLine {
        /// Source file.
        file: String,
        /// Line number.
        line: u32,
    },
    /// Around a function in a specific file.
    FileFunction {
        /// Source file.
        file: String,
        /// Function name.
        function: String,
    },
}

/// A single debugger command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `break <file>:<line> [<pass>]`
    BreakLine {
        /// Source file.
        file: String,
        /// Line number.
        line: u32,
        /// Hits to ignore before stopping; 0 stops on the first hit.
        pass_count: u32,
    },
    /// `break *<ADDR> [<pass>]`
    BreakAddress {
        /// Code address.
        address: Address,
        /// Hits to ignore before stopping.
        pass_count: u32,
    },
    /// `break <function> [<pass>]`
    BreakFunction {
        /// Function name.
        function: String,
        /// Hits to ignore before stopping.
        pass_count: u32,
    },
    /// `delete [<n>]`; `None` deletes every breakpoint.
    Delete(Option<u32>),
    /// `watch <target> <break_on>[:<value>] [<pass>]`
    Watch {
        /// Watched location.
        target: WatchTarget,
        /// Access type, e.g. `R`, `W`, `RW`.
        break_on: String,
        /// Only stop when this value is written/read.
        value: Option<u32>,
        /// Hits to ignore before stopping.
        pass_count: u32,
    },
    /// `print /<f> [/datasize:<n>] <variable>`
    Print {
        /// Format letter (`x`, `d`, `a`, ...).
        format: char,
        /// Explicit data size in bytes.
        datasize: Option<usize>,
        /// Variable name.
        variable: String,
    },
    /// `print pin <pin>`
    PrintPin(String),
    /// `stim`
    Stim,
    /// `write /<kind> 0x<addr> <words...>`
    WriteMemory {
        /// Memory type letter (`r`, `p`, `e`, ...).
        kind: char,
        /// Start address.
        address: Address,
        /// Words to write.
        words: Vec<u32>,
    },
    /// `write pin <pin> high|low`
    WritePin {
        /// Pin name.
        pin: String,
        /// Drive high when true.
        high: bool,
    },
    /// `write pin <pin> <voltage>`
    WritePinVoltage {
        /// Pin name.
        pin: String,
        /// Analog voltage.
        volts: f32,
    },
    /// `x /<kind><count><format><unit> <addr>`
    Examine {
        /// Memory type letter.
        kind: char,
        /// Number of units.
        count: u32,
        /// Output format letter.
        format: char,
        /// Unit size letter.
        unit: char,
        /// Start address.
        address: Address,
    },
    /// `Device <name>`
    Device(String),
    /// `Hwtool <tool> [-p] <index>`
    Hwtool {
        /// Tool type, e.g. `SIM`, `ICD4`.
        tool: String,
        /// Use the tool as a programmer.
        program: bool,
        /// Tool index as printed by `Hwtool`.
        index: usize,
    },
    /// `Hwtool` with no arguments lists attached tools.
    HwtoolList,
    /// `echo <text>`
    Echo(String),
    /// `help [<topic>]`
    Help(Option<String>),
    /// `quit`
    Quit,
    /// `set <name> <value>`
    Set {
        /// Tool property name.
        name: String,
        /// Property value.
        value: String,
    },
    /// `set system.listsize <n>`
    SetListSize(u32),
    /// `Sleep <ms>`
    Sleep(u32),
    /// `Stopwatch`
    Stopwatch,
    /// `Stopwatch <property>`
    StopwatchProperty(String),
    /// `Wait [<ms>]`
    Wait(Option<u32>),
    /// `cd <dir>`
    Cd(String),
    /// `pwd`
    Pwd,
    /// `info breakpoints [<n>]`
    InfoBreakpoints(Option<u32>),
    /// `list ...`
    List(ListTarget),
    /// `Dump -<memory> <file>`
    Dump {
        /// Memory region flag (`p`, `r`, `e`, ...).
        memory: String,
        /// Output file.
        file: String,
    },
    /// `Program <image>`
    Program(String),
    /// `Upload`
    Upload,
    /// `Continue`
    Continue,
    /// `halt`
    Halt,
    /// `Next`
    Next,
    /// `Run`
    Run,
    /// `Step`
    Step,
    /// `Stepi [<count>]`
    Stepi(Option<u32>),
    /// `backtrace [full] [<n>]`
    Backtrace {
        /// Include local variables.
        full: bool,
        /// Limit to the innermost `n` frames.
        frames: Option<u32>,
    },
}

impl Command {
    /// Whether the target starts executing when this command is issued.
    pub fn resumes_target(&self) -> bool {
        matches!(self, Command::Continue | Command::Run)
    }
}

/// Append ` <pass>` when a pass count is set.
struct PassCount(u32);

impl fmt::Display for PassCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, " {}", self.0)?;
        }
        Ok(())
    }
}

impl fmt::Display for ListTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListTarget::Current => write!(f, "list"),
            ListTarget::Around(n) => write!(f, "list {n}"),
            ListTarget::From(n) => write!(f, "list {n},"),
            ListTarget::Until(n) => write!(f, "list ,{n}"),
            ListTarget::Range { first, last } => write!(f, "list {first},{last}"),
            ListTarget::Previous => write!(f, "list -"),
            ListTarget::Next => write!(f, "list +"),
            ListTarget::Function(name) => write!(f, "list {name}"),
            ListTarget::FileLine { file, line } => write!(f, "list {file}:{line}"),
            ListTarget::FileFunction { file, function } => write!(f, "list {file}:{function}"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::BreakLine {
                file,
                line,
                pass_count,
            } => write!(f, "break {file}:{line}{}", PassCount(*pass_count)),
            Command::BreakAddress {
                address,
                pass_count,
            } => write!(f, "break *{address:X}{}", PassCount(*pass_count)),
            Command::BreakFunction {
                function,
                pass_count,
            } => write!(f, "break {function}{}", PassCount(*pass_count)),
            Command::Delete(Some(n)) => write!(f, "delete {n}"),
            Command::Delete(None) => write!(f, "delete"),
            Command::Watch {
                target,
                break_on,
                value,
                pass_count,
            } => {
                match target {
                    WatchTarget::Address(address) => write!(f, "watch 0x{address:X} {break_on}")?,
                    WatchTarget::Name(name) => write!(f, "watch {name} {break_on}")?,
                }
                if let Some(value) = value {
                    write!(f, ":{value:x}")?;
                }
                write!(f, "{}", PassCount(*pass_count))
            }
            Command::Print {
                format,
                datasize,
                variable,
            } => match datasize {
                Some(size) => write!(f, "print /{format} /datasize:{size} {variable}"),
                None => write!(f, "print /{format} {variable}"),
            },
            Command::PrintPin(pin) => write!(f, "print pin {pin}"),
            Command::Stim => write!(f, "stim"),
            Command::WriteMemory {
                kind,
                address,
                words,
            } => {
                write!(f, "write /{kind} 0x{address:x}")?;
                for word in words {
                    write!(f, " {word}")?;
                }
                Ok(())
            }
            Command::WritePin { pin, high } => {
                write!(f, "write pin {pin} {}", if *high { "high" } else { "low" })
            }
            Command::WritePinVoltage { pin, volts } => write!(f, "write pin {pin} {volts}"),
            Command::Examine {
                kind,
                count,
                format,
                unit,
                address,
            } => write!(f, "x /{kind}{count}{format}{unit} {address:x}"),
            Command::Device(name) => write!(f, "Device {name}"),
            Command::Hwtool {
                tool,
                program,
                index,
            } => {
                if *program {
                    write!(f, "Hwtool {tool} -p {index}")
                } else {
                    write!(f, "Hwtool {tool} {index}")
                }
            }
            Command::HwtoolList => write!(f, "Hwtool"),
            Command::Echo(text) => write!(f, "echo {text}"),
            Command::Help(Some(topic)) => write!(f, "help {topic}"),
            Command::Help(None) => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
            Command::Set { name, value } => write!(f, "set {name} {value}"),
            Command::SetListSize(n) => write!(f, "set system.listsize {n}"),
            Command::Sleep(ms) => write!(f, "Sleep {ms}"),
            Command::Stopwatch => write!(f, "Stopwatch"),
            Command::StopwatchProperty(property) => write!(f, "Stopwatch {property}"),
            Command::Wait(Some(ms)) => write!(f, "Wait {ms}"),
            Command::Wait(None) => write!(f, "Wait"),
            Command::Cd(dir) => write!(f, "cd {dir}"),
            Command::Pwd => write!(f, "pwd"),
            Command::InfoBreakpoints(Some(n)) => write!(f, "info breakpoints {n}"),
            Command::InfoBreakpoints(None) => write!(f, "info breakpoints"),
            Command::List(target) => write!(f, "{target}"),
            Command::Dump { memory, file } => write!(f, "Dump -{memory} {file}"),
            Command::Program(image) => write!(f, "Program {image}"),
            Command::Upload => write!(f, "Upload"),
            Command::Continue => write!(f, "Continue"),
            Command::Halt => write!(f, "halt"),
            Command::Next => write!(f, "Next"),
            Command::Run => write!(f, "Run"),
            Command::Step => write!(f, "Step"),
            Command::Stepi(Some(count)) => write!(f, "Stepi {count}"),
            Command::Stepi(None) => write!(f, "Stepi"),
            Command::Backtrace { full, frames } => {
                write!(f, "backtrace")?;
                if *full {
                    write!(f, " full")?;
                }
                if let Some(n) = frames {
                    write!(f, " {n}")?;
                }
                Ok(())
            }
        }
    }
}
