//! High-level debugger client.
//!
//! Every method renders a [`Command`], runs it through
//! [`Session::transact`], and pulls the interesting value out of the
//! response. Methods returning `&str` borrow the session's response buffer.

use crate::breakpoint::{parse_breakpoints, Address, Breakpoint};
use crate::command::{Command, ListTarget, WatchTarget};
use crate::error::{MdbError, MdbResult};
use crate::response::{address_value, id_after, print_value, BREAKPOINT_PREFIX, WATCHPOINT_PREFIX};
use crate::session::{Session, SessionConfig, SessionState};

/// A debugger client that owns its session.
#[derive(Debug)]
pub struct Debugger {
    session: Session,
}

impl Debugger {
    /// Launch a debugger process.
    pub async fn launch(config: &SessionConfig) -> MdbResult<Self> {
        Ok(Self::new(Session::spawn(config).await?))
    }

    /// Wrap an already-constructed session.
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Return a reference to the underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Return a mutable reference to the underlying session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Give up the client and keep the session.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Issue a typed command and return its raw response.
    pub async fn execute(&mut self, command: &Command) -> MdbResult<&str> {
        let line = command.to_string();
        if command.resumes_target() {
            self.session.transition(SessionState::Running);
        }
        self.session.transact(&line).await
    }

    /// Issue a command whose response carries `<prefix><id>`.
    async fn execute_for_id(&mut self, command: Command, prefix: &str) -> MdbResult<u32> {
        let response = self.execute(&command).await?;
        id_after(response, prefix).ok_or_else(|| MdbError::UnexpectedResponse {
            command: command.to_string(),
            response: response.to_string(),
        })
    }

    /// Transact an empty line; useful to resynchronize with the prompt.
    pub async fn noop(&mut self) -> MdbResult<&str> {
        self.session.transact("").await
    }

    // ── breakpoints ──────────────────────────────────────────────────────

    /// Break at a source line. Returns the breakpoint number.
    pub async fn break_line(&mut self, file: &str, line: u32, pass_count: u32) -> MdbResult<u32> {
        let command = Command::BreakLine {
            file: file.to_string(),
            line,
            pass_count,
        };
        self.execute_for_id(command, BREAKPOINT_PREFIX).await
    }

    /// Break at a code address. Returns the breakpoint number.
    pub async fn break_address(&mut self, address: Address, pass_count: u32) -> MdbResult<u32> {
        let command = Command::BreakAddress {
            address,
            pass_count,
        };
        self.execute_for_id(command, BREAKPOINT_PREFIX).await
    }

    /// Break on entry to a function. Returns the breakpoint number.
    pub async fn break_function(&mut self, function: &str, pass_count: u32) -> MdbResult<u32> {
        let command = Command::BreakFunction {
            function: function.to_string(),
            pass_count,
        };
        self.execute_for_id(command, BREAKPOINT_PREFIX).await
    }

    /// Delete one breakpoint.
    pub async fn delete(&mut self, number: u32) -> MdbResult<()> {
        self.execute(&Command::Delete(Some(number))).await?;
        Ok(())
    }

    /// Delete every breakpoint.
    pub async fn delete_all(&mut self) -> MdbResult<()> {
        self.execute(&Command::Delete(None)).await?;
        Ok(())
    }

    /// Set a watchpoint. Returns the watchpoint number.
    pub async fn watch(
        &mut self,
        target: WatchTarget,
        break_on: &str,
        value: Option<u32>,
        pass_count: u32,
    ) -> MdbResult<u32> {
        let command = Command::Watch {
            target,
            break_on: break_on.to_string(),
            value,
            pass_count,
        };
        self.execute_for_id(command, WATCHPOINT_PREFIX).await
    }

    /// List all breakpoints.
    pub async fn info_breakpoints(&mut self) -> MdbResult<Vec<Breakpoint>> {
        let response = self.execute(&Command::InfoBreakpoints(None)).await?;
        Ok(parse_breakpoints(response))
    }

    /// Look up a single breakpoint by number.
    pub async fn info_breakpoint(&mut self, number: u32) -> MdbResult<Option<Breakpoint>> {
        let response = self.execute(&Command::InfoBreakpoints(Some(number))).await?;
        Ok(parse_breakpoints(response).into_iter().next())
    }

    // ── data ─────────────────────────────────────────────────────────────

    /// Print a variable in format `format` and return its integer value.
    ///
    /// Format `a` answers with the variable's address instead of `<var>=`.
    pub async fn print_var(
        &mut self,
        format: char,
        datasize: Option<usize>,
        variable: &str,
    ) -> MdbResult<i64> {
        let command = Command::Print {
            format,
            datasize,
            variable: variable.to_string(),
        };
        let response = self.execute(&command).await?;
        let value = if format == 'a' {
            address_value(response, variable).and_then(|address| i64::try_from(address).ok())
        } else {
            print_value(response, variable)
        };
        value.ok_or_else(|| MdbError::UnexpectedResponse {
            command: command.to_string(),
            response: response.to_string(),
        })
    }

    /// Return the address of a variable.
    pub async fn print_var_address(&mut self, variable: &str) -> MdbResult<Address> {
        let command = Command::Print {
            format: 'a',
            datasize: None,
            variable: variable.to_string(),
        };
        let response = self.execute(&command).await?;
        address_value(response, variable).ok_or_else(|| {
            MdbError::UnexpectedResponse {
                command: command.to_string(),
                response: response.to_string(),
            }
        })
    }

    /// Read a pin state.
    pub async fn print_pin(&mut self, pin: &str) -> MdbResult<&str> {
        self.execute(&Command::PrintPin(pin.to_string())).await
    }

    /// Apply the configured stimulus.
    pub async fn stim(&mut self) -> MdbResult<()> {
        self.execute(&Command::Stim).await?;
        Ok(())
    }

    /// Write words to memory.
    pub async fn write_memory(&mut self, kind: char, address: Address, words: &[u32]) -> MdbResult<()> {
        let command = Command::WriteMemory {
            kind,
            address,
            words: words.to_vec(),
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// Drive a digital pin.
    pub async fn write_pin(&mut self, pin: &str, high: bool) -> MdbResult<()> {
        let command = Command::WritePin {
            pin: pin.to_string(),
            high,
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// Set an analog pin voltage.
    pub async fn write_pin_voltage(&mut self, pin: &str, volts: f32) -> MdbResult<()> {
        let command = Command::WritePinVoltage {
            pin: pin.to_string(),
            volts,
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// Examine memory.
    pub async fn examine(
        &mut self,
        kind: char,
        count: u32,
        format: char,
        unit: char,
        address: Address,
    ) -> MdbResult<&str> {
        let command = Command::Examine {
            kind,
            count,
            format,
            unit,
            address,
        };
        self.execute(&command).await
    }

    // ── device and tool ──────────────────────────────────────────────────

    /// Select the target device.
    pub async fn device(&mut self, name: &str) -> MdbResult<()> {
        self.execute(&Command::Device(name.to_string())).await?;
        Ok(())
    }

    /// Select the hardware tool.
    pub async fn hwtool(&mut self, tool: &str, program: bool, index: usize) -> MdbResult<()> {
        let command = Command::Hwtool {
            tool: tool.to_string(),
            program,
            index,
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// List attached hardware tools.
    pub async fn hwtool_list(&mut self) -> MdbResult<&str> {
        self.execute(&Command::HwtoolList).await
    }

    // ── session utilities ────────────────────────────────────────────────

    /// Echo text through the debugger.
    pub async fn echo(&mut self, text: &str) -> MdbResult<&str> {
        self.execute(&Command::Echo(text.to_string())).await
    }

    /// Show help, optionally for a topic.
    pub async fn help(&mut self, topic: Option<&str>) -> MdbResult<&str> {
        self.execute(&Command::Help(topic.map(str::to_string))).await
    }

    /// Set a tool property.
    pub async fn set(&mut self, name: &str, value: &str) -> MdbResult<()> {
        let command = Command::Set {
            name: name.to_string(),
            value: value.to_string(),
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// Pause the debugger's script processing for `ms` milliseconds.
    pub async fn sleep(&mut self, ms: u32) -> MdbResult<()> {
        self.sleeping(Command::Sleep(ms)).await
    }

    /// Wait for the target to halt, optionally bounded by `ms`.
    pub async fn wait(&mut self, ms: Option<u32>) -> MdbResult<()> {
        self.sleeping(Command::Wait(ms)).await
    }

    /// Run `command` in the `Sleeping` state, restoring the prior state
    /// once the debugger answers.
    async fn sleeping(&mut self, command: Command) -> MdbResult<()> {
        let before = self.session.state();
        self.session.transition(SessionState::Sleeping);
        self.execute(&command).await?;
        if self.session.state() == SessionState::Sleeping {
            self.session.transition(before);
        }
        Ok(())
    }

    /// Read the stopwatch.
    pub async fn stopwatch(&mut self) -> MdbResult<&str> {
        self.execute(&Command::Stopwatch).await
    }

    /// Read or change a stopwatch property.
    pub async fn stopwatch_property(&mut self, property: &str) -> MdbResult<&str> {
        self.execute(&Command::StopwatchProperty(property.to_string()))
            .await
    }

    /// Change the debugger's working directory.
    pub async fn cd(&mut self, dir: &str) -> MdbResult<()> {
        self.execute(&Command::Cd(dir.to_string())).await?;
        Ok(())
    }

    /// The debugger's working directory response.
    pub async fn pwd(&mut self) -> MdbResult<&str> {
        self.execute(&Command::Pwd).await
    }

    /// List source.
    pub async fn list(&mut self, target: ListTarget) -> MdbResult<&str> {
        self.execute(&Command::List(target)).await
    }

    /// Set how many lines `list` prints.
    pub async fn set_list_size(&mut self, lines: u32) -> MdbResult<()> {
        self.execute(&Command::SetListSize(lines)).await?;
        Ok(())
    }

    /// Ask the debugger to exit, then close the session.
    pub async fn quit(&mut self) -> MdbResult<()> {
        // The debugger may exit before printing another prompt.
        match self.execute(&Command::Quit).await {
            Ok(_) | Err(MdbError::Receive { .. }) => {}
            Err(e) => return Err(e),
        }
        self.session.close().await
    }

    // ── programming ──────────────────────────────────────────────────────

    /// Dump device memory to a file.
    pub async fn dump(&mut self, memory: &str, file: &str) -> MdbResult<()> {
        let command = Command::Dump {
            memory: memory.to_string(),
            file: file.to_string(),
        };
        self.execute(&command).await?;
        Ok(())
    }

    /// Program an image into the device.
    pub async fn program(&mut self, image: &str) -> MdbResult<()> {
        self.execute(&Command::Program(image.to_string())).await?;
        Ok(())
    }

    /// Upload device memory.
    pub async fn upload(&mut self) -> MdbResult<()> {
        self.execute(&Command::Upload).await?;
        Ok(())
    }

    // ── execution ────────────────────────────────────────────────────────

    /// Resume the target.
    pub async fn continue_execution(&mut self) -> MdbResult<()> {
        self.execute(&Command::Continue).await?;
        Ok(())
    }

    /// Start the program from reset.
    pub async fn run(&mut self) -> MdbResult<()> {
        self.execute(&Command::Run).await?;
        Ok(())
    }

    /// Halt the target.
    pub async fn halt(&mut self) -> MdbResult<()> {
        self.execute(&Command::Halt).await?;
        self.session.transition(SessionState::Stopped);
        Ok(())
    }

    /// Step over one source line.
    pub async fn next(&mut self) -> MdbResult<()> {
        self.execute(&Command::Next).await?;
        Ok(())
    }

    /// Step into one source line.
    pub async fn step(&mut self) -> MdbResult<()> {
        self.execute(&Command::Step).await?;
        Ok(())
    }

    /// Step `count` instructions (one when `None`).
    pub async fn stepi(&mut self, count: Option<u32>) -> MdbResult<()> {
        self.execute(&Command::Stepi(count)).await?;
        Ok(())
    }

    // ── stack ────────────────────────────────────────────────────────────

    /// Print the call stack.
    pub async fn backtrace(&mut self, full: bool, frames: Option<u32>) -> MdbResult<&str> {
        self.execute(&Command::Backtrace { full, frames }).await
    }
}
