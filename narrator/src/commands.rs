use speech_panel::ParameterRange;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Voices,
    Voice(usize),
    Rate(f32),
    Pitch(f32),
    Volume(f32),
    Play,
    Stop,
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs a value")]
    MissingArgument(&'static str),
    #[error("'{value}' is not a valid {what}")]
    InvalidNumber { what: &'static str, value: String },
}

pub const HELP: &str = "\
text <words>   set the text to speak
voices         list available voices
voice <n>      select voice number n
rate <v>       set rate (0.5 - 2)
pitch <v>      set pitch (0 - 2)
volume <v>     set volume (0 - 1)
play           speak the text
stop           stop speaking
status         show the panel
quit           exit";

/// Parse one input line. Slider values are clamped and snapped the same way a range control
/// would; everything after `text ` is kept verbatim.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (word, rest) = match line.trim_start().split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line.trim(), ""),
    };

    match word {
        "text" => Ok(Command::Text(rest.to_string())),
        "voices" => Ok(Command::Voices),
        "voice" => {
            let value = argument("voice", rest)?;
            value
                .parse()
                .map(Command::Voice)
                .map_err(|_| CommandError::InvalidNumber {
                    what: "voice number",
                    value: value.to_string(),
                })
        }
        "rate" => slider("rate", rest, ParameterRange::RATE).map(Command::Rate),
        "pitch" => slider("pitch", rest, ParameterRange::PITCH).map(Command::Pitch),
        "volume" => slider("volume", rest, ParameterRange::VOLUME).map(Command::Volume),
        "play" => Ok(Command::Play),
        "stop" => Ok(Command::Stop),
        "status" | "" => Ok(Command::Status),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn argument<'a>(name: &'static str, rest: &'a str) -> Result<&'a str, CommandError> {
    let value = rest.trim();
    if value.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    Ok(value)
}

fn slider(name: &'static str, rest: &str, range: ParameterRange) -> Result<f32, CommandError> {
    let value = argument(name, rest)?;
    let parsed: f32 = value.parse().map_err(|_| CommandError::InvalidNumber {
        what: name,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(CommandError::InvalidNumber {
            what: name,
            value: value.to_string(),
        });
    }
    Ok(range.snap(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keeps_spacing() {
        assert_eq!(
            parse_command("text  hello   world \n"),
            Ok(Command::Text(" hello   world ".to_string()))
        );
        assert_eq!(parse_command("text"), Ok(Command::Text(String::new())));
    }

    #[test]
    fn sliders_are_clamped_and_snapped() {
        assert_eq!(parse_command("rate 9"), Ok(Command::Rate(2.0)));
        assert_eq!(parse_command("volume -1"), Ok(Command::Volume(0.0)));
        match parse_command("pitch 1.26") {
            Ok(Command::Pitch(p)) => assert!((p - 1.3).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_numbers_are_reported() {
        assert_eq!(
            parse_command("rate fast"),
            Err(CommandError::InvalidNumber {
                what: "rate",
                value: "fast".to_string()
            })
        );
        assert!(matches!(
            parse_command("rate NaN"),
            Err(CommandError::InvalidNumber { .. })
        ));
        assert_eq!(
            parse_command("voice"),
            Err(CommandError::MissingArgument("voice"))
        );
        assert_eq!(parse_command("voice 2"), Ok(Command::Voice(2)));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("play"), Ok(Command::Play));
        assert_eq!(parse_command("  stop"), Ok(Command::Stop));
        assert_eq!(parse_command(""), Ok(Command::Status));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert_eq!(
            parse_command("sing"),
            Err(CommandError::Unknown("sing".to_string()))
        );
    }
}
