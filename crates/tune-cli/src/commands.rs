//! Line commands typed at the prompt, mapped onto core intents.

use tune_proto::protocol::Intent;

pub const HELP: &str = "\
commands:
  play | space        play/pause (random station when nothing is loaded)
  next | prev         random station
  cat <name>          open a category (\"cat favorites\" for favorites)
  cats                list categories
  <number>            play that row
  fav <number>        toggle favorite for that row
  search <text>       filter a category list or search the directory
  back                return to the category grid
  vol <0-100>         set volume
  stop                stop playback
  help                this text
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Categories,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a row number")]
    BadIndex(String),
    #[error("volume must be a number from 0 to 100")]
    BadVolume,
}

/// Parse one input line.  Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let intent = match word.to_lowercase().as_str() {
        "play" | "space" | "p" => Intent::PlayPause,
        "next" | "n" => Intent::Next,
        "prev" | "previous" => Intent::Previous,
        "back" | "b" => Intent::Back,
        "stop" => Intent::Stop,
        "cat" | "category" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("cat"));
            }
            Intent::SelectCategory {
                category: rest.to_string(),
            }
        }
        "fav" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("fav"));
            }
            Intent::ToggleFavorite {
                index: parse_index(rest)?,
            }
        }
        // an empty search clears the filter
        "search" | "s" => Intent::SearchChanged {
            text: rest.to_string(),
        },
        "vol" | "volume" => {
            let percent = rest.parse::<u8>().map_err(|_| ParseError::BadVolume)?;
            if percent > 100 {
                return Err(ParseError::BadVolume);
            }
            Intent::Volume { percent }
        }
        "cats" | "categories" => return Ok(Some(Command::Categories)),
        "help" | "?" => return Ok(Some(Command::Help)),
        "quit" | "q" | "exit" => return Ok(Some(Command::Quit)),
        _ if word.chars().all(|c| c.is_ascii_digit()) => Intent::ActivateStation {
            index: parse_index(word)?,
        },
        _ => return Err(ParseError::Unknown(word.to_string())),
    };
    Ok(Some(Command::Intent(intent)))
}

fn parse_index(raw: &str) -> Result<usize, ParseError> {
    raw.parse::<usize>()
        .map_err(|_| ParseError::BadIndex(raw.to_string()))
}
