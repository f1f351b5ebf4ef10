use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_summary(result: &RunResult) {
        let green = "\x1b[32m";
        let yellow = "\x1b[33m";
        let cyan = "\x1b[36m";
        let reset = "\x1b[0m";

        let requested: usize = result.bibs.iter().map(|bib| bib.requested).sum();
        let downloaded: usize = result.bibs.iter().map(|bib| bib.downloaded).sum();
        println!("{cyan}bibphotos {} pass: {}{reset}", result.pass, result.event);
        println!("{green}bibs processed: {}{reset}", result.bibs.len());
        println!("{green}downloaded: {downloaded} of {requested} requested{reset}");
        let pending = result.entries - result.resolved;
        if pending > 0 {
            println!("{yellow}still unresolved: {pending} (retried on next run){reset}");
        }
        println!("{cyan}cache: {}{reset}", result.cache_path);
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
