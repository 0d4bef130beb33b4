//! Interactive console REPL

use anyhow::{anyhow, bail, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tokio::runtime::Handle;

use v96_remote::{FaderRange, FaderResolution, Mixer, Target, Transport};

const HELP: &str = "\
Commands:
  on <cat> <n> <on|off>          switch a strip
  level <cat> <n> <percent>      move a fader
  solo <cat> <n> <on|off>        set a solo switch
  get <on|level|solo> <cat> <n>  request a value
  recall <scene>                 recall a scene (0-99)
  store <scene>                  store current settings (0-99)
  clear-solo                     clear every solo
  resolution <low|high>          fader resolution
  range <absolute|relative>      channel fader range
  help, quit
Categories: ch, aux, bus, in-group, out-group, master (solo only)";

/// Value a `get` asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    On,
    Level,
    Solo,
}

/// One parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    On(Target, bool),
    Level(Target, f64),
    Solo(Target, bool),
    Get(Query, Target),
    Recall(u16),
    Store(u16),
    ClearSolo,
    Resolution(FaderResolution),
    Range(FaderRange),
    Help,
    Quit,
}

fn parse_target(category: &str, index: &str) -> Result<Target> {
    let n: u8 = index
        .parse()
        .map_err(|_| anyhow!("Invalid index: {}", index))?;

    Ok(match category {
        "ch" | "channel" => Target::Channel(n),
        "aux" => Target::Aux(n),
        "bus" => Target::Bus(n),
        "in-group" => Target::InGroup(n),
        "out-group" => Target::OutGroup(n),
        "master" => Target::Master(n),
        other => bail!("Unknown category: {}", other),
    })
}

fn parse_switch(word: &str) -> Result<bool> {
    match word {
        "on" | "1" => Ok(true),
        "off" | "0" => Ok(false),
        other => bail!("Expected on or off, got: {}", other),
    }
}

fn parse_scene(word: &str) -> Result<u16> {
    word.parse()
        .map_err(|_| anyhow!("Invalid scene number: {}", word))
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>> {
    let words: Vec<&str> = line.split_whitespace().collect();

    let command = match words.as_slice() {
        [] => return Ok(None),
        ["on", cat, n, state] => ReplCommand::On(parse_target(cat, n)?, parse_switch(state)?),
        ["level", cat, n, percent] => {
            let percent: f64 = percent
                .parse()
                .map_err(|_| anyhow!("Invalid level: {}", percent))?;
            ReplCommand::Level(parse_target(cat, n)?, percent)
        }
        ["solo", cat, n, state] => ReplCommand::Solo(parse_target(cat, n)?, parse_switch(state)?),
        ["get", what, cat, n] => {
            let query = match *what {
                "on" => Query::On,
                "level" => Query::Level,
                "solo" => Query::Solo,
                other => bail!("Cannot get: {}", other),
            };
            ReplCommand::Get(query, parse_target(cat, n)?)
        }
        ["recall", scene] => ReplCommand::Recall(parse_scene(scene)?),
        ["store", scene] => ReplCommand::Store(parse_scene(scene)?),
        ["clear-solo"] => ReplCommand::ClearSolo,
        ["resolution", value] => ReplCommand::Resolution(value.parse().map_err(|e| anyhow!("{}", e))?),
        ["range", value] => ReplCommand::Range(value.parse().map_err(|e| anyhow!("{}", e))?),
        ["help"] | ["?"] => ReplCommand::Help,
        ["quit"] | ["exit"] => ReplCommand::Quit,
        _ => bail!("Unrecognized command (try 'help')"),
    };

    Ok(Some(command))
}

async fn execute<T: Transport>(mixer: &Mixer<T>, command: ReplCommand) -> v96_remote::Result<()> {
    match command {
        ReplCommand::On(target, on) => mixer.set_on(target, on).await,
        ReplCommand::Level(target, percent) => mixer.set_level(target, percent).await,
        ReplCommand::Solo(target, solo) => mixer.set_solo(target, solo).await,
        ReplCommand::Get(Query::On, target) => mixer.get_on(target).await,
        ReplCommand::Get(Query::Level, target) => mixer.get_level(target).await,
        ReplCommand::Get(Query::Solo, target) => mixer.get_solo(target).await,
        ReplCommand::Recall(scene) => mixer.recall_scene(scene).await,
        ReplCommand::Store(scene) => mixer.store_scene(scene).await,
        ReplCommand::ClearSolo => mixer.clear_solo().await,
        ReplCommand::Resolution(resolution) => {
            mixer.set_fader_resolution(resolution);
            Ok(())
        }
        ReplCommand::Range(range) => {
            mixer.set_fader_range(range);
            Ok(())
        }
        ReplCommand::Help | ReplCommand::Quit => Ok(()),
    }
}

/// Read commands until `quit`, EOF or Ctrl+C.
///
/// Blocks the calling thread; run it with `spawn_blocking`.
pub fn run_repl<T: Transport>(mixer: Arc<Mixer<T>>, runtime: Handle) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "V96 Remote - type 'help' for commands".bold().cyan());

    loop {
        let line = match rl.readline("v96> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = rl.add_history_entry(line.as_str());

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{} {}", "error:".red(), e);
                continue;
            }
        };

        match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", HELP),
            command => match runtime.block_on(execute(&mixer, command)) {
                Ok(()) => println!("{}", "ok".green()),
                Err(e) => println!("{} {}", "error:".red(), e),
            },
        }
    }

    Ok(())
}
