use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::{
    error::{Error, Result},
    pipeline::CancelFlag,
};

// chunks of command output waiting for the line producer
const PIPE_CAPACITY: usize = 16;
const PIPE_CHUNK_SIZE: usize = 64 * 1024;
// how often a reader waiting on a silent command looks at its stop flags
const PIPE_POLL_INTERVAL: Duration = Duration::from_millis(50);

// `| prog arg "arg with spaces"` runs a command and reads its stdout,
// `*.gz` goes through a gzip decoder, anything else is a plain file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Gzip(PathBuf),
    Command { program: String, args: Vec<String> },
}

impl InputSource {
    pub fn parse(locator: &str) -> Result<Self> {
        let locator = locator.trim();
        if let Some(cmd) = locator.strip_prefix('|') {
            let mut items = split_command(cmd)?.into_iter();
            let program = items.next().ok_or_else(|| {
                Error::Config(format!("missing command in input source {:?}", locator))
            })?;
            return Ok(InputSource::Command {
                program,
                args: items.collect(),
            });
        }
        if locator.is_empty() {
            return Err(Error::Config("input file path is not set".to_owned()));
        }
        if locator.ends_with(".gz") {
            Ok(InputSource::Gzip(PathBuf::from(locator)))
        } else {
            Ok(InputSource::File(PathBuf::from(locator)))
        }
    }

    pub fn open(&self) -> Result<OpenedSource> {
        self.open_with_cancel(&CancelFlag::new())
    }

    // reading from a command ends early (as if the output was complete) once
    // `cancel` is set, even when the command itself writes nothing more
    pub fn open_with_cancel(&self, cancel: &CancelFlag) -> Result<OpenedSource> {
        match self {
            InputSource::File(path) => {
                let file = open_file(path)?;
                Ok(OpenedSource {
                    reader: Box::new(BufReader::new(file)),
                    child: None,
                })
            }
            InputSource::Gzip(path) => {
                let file = open_file(path)?;
                Ok(OpenedSource {
                    reader: Box::new(BufReader::new(MultiGzDecoder::new(file))),
                    child: None,
                })
            }
            InputSource::Command { program, args } => {
                let spawn_error = |source| Error::Spawn {
                    command: self.to_string(),
                    source,
                };
                let mut child = Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .map_err(spawn_error)?;
                debug!(command = %self, pid = child.id(), "spawned input command");

                let chunks = match child.stdout.take() {
                    Some(stdout) => spawn_pipe_reader(stdout),
                    None => Err(io::Error::other("stdout not captured")),
                };
                let chunks = match chunks {
                    Ok(chunks) => chunks,
                    Err(err) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(spawn_error(err));
                    }
                };

                let interrupt = CancelFlag::new();
                let reader = PipeReader {
                    chunks,
                    chunk: Vec::new(),
                    pos: 0,
                    stop: [cancel.clone(), interrupt.clone()],
                };
                Ok(OpenedSource {
                    reader: Box::new(BufReader::new(reader)),
                    child: Some(ChildProcess {
                        command: self.to_string(),
                        child,
                        interrupt,
                    }),
                })
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::File(path) | InputSource::Gzip(path) => write!(f, "{}", path.display()),
            InputSource::Command { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, " {:?}", arg)?;
                    } else {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
        }
    }
}

// Splits a command line on whitespace. Single quotes keep everything up to
// the next single quote, double quotes do the same but allow `\"` and `\\`
// inside. No variables, globs or other shell syntax.
fn split_command(cmd: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut item = String::new();
    let mut in_item = false;
    let mut chars = cmd.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_item = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => item.push(c),
                        None => return Err(unterminated_quote(cmd)),
                    }
                }
            }
            '"' => {
                in_item = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => item.push(c),
                            Some(c) => {
                                item.push('\\');
                                item.push(c);
                            }
                            None => return Err(unterminated_quote(cmd)),
                        },
                        Some(c) => item.push(c),
                        None => return Err(unterminated_quote(cmd)),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_item {
                    items.push(std::mem::take(&mut item));
                    in_item = false;
                }
            }
            c => {
                in_item = true;
                item.push(c);
            }
        }
    }
    if in_item {
        items.push(item);
    }
    Ok(items)
}

fn unterminated_quote(cmd: &str) -> Error {
    Error::Config(format!("unterminated quote in input command {:?}", cmd.trim()))
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub struct OpenedSource {
    pub reader: Box<dyn BufRead + Send>,
    pub child: Option<ChildProcess>,
}

// The command's stdout is drained by a detached thread so that the line
// producer never blocks in a read it cannot leave. The thread ends with the
// pipe, i.e. when the command (and whatever it started) exits.
fn spawn_pipe_reader(mut stdout: ChildStdout) -> io::Result<Receiver<io::Result<Vec<u8>>>> {
    let (tx, rx) = mpsc::sync_channel(PIPE_CAPACITY);
    thread::Builder::new()
        .name("vertigo-pipe".to_owned())
        .spawn(move || loop {
            let mut chunk = vec![0; PIPE_CHUNK_SIZE];
            match stdout.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => {
                    chunk.truncate(read);
                    if tx.send(Ok(chunk)).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    let _ = tx.send(Err(err));
                    break;
                }
            }
        })?;
    Ok(rx)
}

struct PipeReader {
    chunks: Receiver<io::Result<Vec<u8>>>,
    chunk: Vec<u8>,
    pos: usize,
    stop: [CancelFlag; 2],
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.chunk.len() {
            // a stopped reader looks like the end of the output
            if self.stop.iter().any(CancelFlag::is_cancelled) {
                return Ok(0);
            }
            match self.chunks.recv_timeout(PIPE_POLL_INTERVAL) {
                Ok(chunk) => {
                    self.chunk = chunk?;
                    self.pos = 0;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let read = out.len().min(self.chunk.len() - self.pos);
        out[..read].copy_from_slice(&self.chunk[self.pos..self.pos + read]);
        self.pos += read;
        Ok(read)
    }
}

// Must be finished with either `wait` or `abort`.
#[derive(Debug)]
pub struct ChildProcess {
    command: String,
    child: Child,
    interrupt: CancelFlag,
}

impl ChildProcess {
    // Stops the reader of the command's output and kills the command. The
    // process still has to be reaped by `abort`.
    pub fn kill(&mut self) {
        self.interrupt.cancel();
        // the process may have exited already
        let _ = self.child.kill();
        debug!(command = %self.command, "input command killed");
    }

    pub fn wait(mut self) -> Result<()> {
        let status = self.child.wait()?;
        debug!(command = %self.command, %status, "input command finished");
        if status.success() {
            Ok(())
        } else {
            Err(Error::Process {
                command: self.command,
                status,
            })
        }
    }

    pub fn abort(mut self) {
        self.kill();
        let _ = self.child.wait();
        debug!(command = %self.command, "input command aborted");
    }
}
