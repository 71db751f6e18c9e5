use std::io::BufRead;

use crossbeam::channel::Sender;

use super::Trigger;
use crate::domain::person::PersonField;

pub const HELP: &str = "\
commands:
  add                         append a blank row
  set <row> <column> <value>  edit a cell (columns: name, age, residence; 'null' clears)
  rm <row>                    remove a row
  status                      compare the table with the server copy
  save                        push changes to the server
  quit                        leave the dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Trigger(Trigger),
    Help,
    Nothing,
}

/// Parses one line typed by the user. Rows are numbered from 1 as displayed.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Nothing);
    };

    let trigger = match verb.to_ascii_lowercase().as_str() {
        "add" => Trigger::AddRow,
        "save" => Trigger::Save,
        "status" => Trigger::TableChanged,
        "quit" | "exit" | "q" => Trigger::Quit,
        "help" | "?" => return Ok(Command::Help),
        "rm" | "del" => Trigger::RemoveRow {
            row: parse_row(words.next())?,
        },
        "set" => {
            let row = parse_row(words.next())?;
            let field = words
                .next()
                .ok_or_else(|| "usage: set <row> <column> <value>".to_string())?
                .parse::<PersonField>()
                .map_err(|err| err.to_string())?;
            let value = words.collect::<Vec<_>>().join(" ");
            Trigger::EditCell { row, field, value }
        }
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(Command::Trigger(trigger))
}

fn parse_row(raw: Option<&str>) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| "missing row number".to_string())?;
    match raw.parse::<usize>() {
        Ok(row) if row >= 1 => Ok(row - 1),
        _ => Err(format!("'{raw}' is not a row number")),
    }
}

/// Reads commands from `reader` and forwards triggers until input ends or the
/// session stops listening. End of input counts as `quit`.
pub fn forward_lines(reader: impl BufRead, triggers: &Sender<Trigger>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("failed to read input: {err}");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Command::Trigger(trigger)) => {
                let quit = trigger == Trigger::Quit;
                if triggers.send(trigger).is_err() || quit {
                    return;
                }
            }
            Ok(Command::Help) => eprintln!("{HELP}"),
            Ok(Command::Nothing) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    let _ = triggers.send(Trigger::Quit);
}
