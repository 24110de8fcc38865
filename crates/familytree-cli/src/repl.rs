use anyhow::{Context, Result, bail};
use familytree_events::Command;

/// One line of `browse` input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// `toggle <id>`, resolved against the tree by the caller.
    Toggle(String),
    Command(Command),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  toggle <id>       expand or collapse a person (record id or node index)
  click <x> <y>     click at a screen position
  search <term>     search names; fewer than 2 characters clears
  next | prev       step through search results
  goto <n>          jump to result n (1-based)
  collapse | expand collapse or expand everything
  zoom <factor>     zoom around the screen centre
  pan <dx> <dy>     move the view
  fit | reset       zoom to fit, or reset the view
  resize <w> <h>    change the viewport size
  quit";

fn number(arg: Option<&str>, what: &str) -> Result<f32> {
    let raw = arg.with_context(|| format!("missing {what}"))?;
    raw.parse()
        .with_context(|| format!("{what} must be a number, got {raw:?}"))
}

/// Parse one input line. `centre` is the screen point used by `zoom`.
/// Blank lines yield `None`.
pub fn parse_line(line: &str, centre: (f32, f32)) -> Result<Option<Input>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.trim_start();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim_start()));
    let mut args = rest.split_whitespace();

    let input = match word {
        "" => return Ok(None),
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "?" => Input::Help,
        "toggle" => Input::Toggle(args.next().context("missing id")?.to_string()),
        "click" => Input::Command(Command::Click {
            x: number(args.next(), "x")?,
            y: number(args.next(), "y")?,
        }),
        // Search terms keep their inner spaces.
        "search" => Input::Command(Command::Search(rest.to_string())),
        "next" => Input::Command(Command::NextResult),
        "prev" => Input::Command(Command::PrevResult),
        "goto" => {
            let n: usize = args
                .next()
                .context("missing result number")?
                .parse()
                .context("result number must be a positive integer")?;
            if n == 0 {
                bail!("results are numbered from 1");
            }
            Input::Command(Command::Navigate(n - 1))
        }
        "collapse" => Input::Command(Command::CollapseAll),
        "expand" => Input::Command(Command::ExpandAll),
        "zoom" => Input::Command(Command::Zoom {
            factor: number(args.next(), "factor")?,
            x: centre.0,
            y: centre.1,
        }),
        "pan" => Input::Command(Command::Pan {
            dx: number(args.next(), "dx")?,
            dy: number(args.next(), "dy")?,
        }),
        "fit" => Input::Command(Command::ZoomToFit),
        "reset" => Input::Command(Command::ZoomReset),
        "resize" => Input::Command(Command::Resize {
            width: number(args.next(), "width")?,
            height: number(args.next(), "height")?,
        }),
        other => bail!("unknown command {other:?}, try `help`"),
    };
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Input> {
        parse_line(line, (600.0, 400.0)).unwrap()
    }

    #[test]
    fn test_parses_commands() {
        assert_eq!(parse("  \n"), None);
        assert_eq!(parse("quit"), Some(Input::Quit));
        assert_eq!(parse("toggle 3"), Some(Input::Toggle("3".into())));
        assert_eq!(
            parse("search ram bahadur"),
            Some(Input::Command(Command::Search("ram bahadur".into())))
        );
        assert_eq!(
            parse("search"),
            Some(Input::Command(Command::Search(String::new())))
        );
        assert_eq!(parse("goto 2"), Some(Input::Command(Command::Navigate(1))));
        assert_eq!(
            parse("zoom 1.5"),
            Some(Input::Command(Command::Zoom {
                factor: 1.5,
                x: 600.0,
                y: 400.0
            }))
        );
        assert_eq!(
            parse("pan -10 4"),
            Some(Input::Command(Command::Pan { dx: -10.0, dy: 4.0 }))
        );
    }

    #[test]
    fn test_any_whitespace_separates_command() {
        let ann = Some(Input::Command(Command::Search("ann".into())));
        assert_eq!(parse("search\tann"), ann);
        assert_eq!(parse("search   ann"), ann);
        assert_eq!(parse("\tsearch \t ann\r\n"), ann);
        // Only the separator is stripped from the term.
        assert_eq!(
            parse("search  ann  lee "),
            Some(Input::Command(Command::Search("ann  lee ".into())))
        );
        assert_eq!(parse("toggle\t3"), Some(Input::Toggle("3".into())));
    }

    #[test]
    fn test_rejects_bad_input() {
        let centre = (0.0, 0.0);
        assert!(parse_line("fly", centre).is_err());
        assert!(parse_line("goto 0", centre).is_err());
        assert!(parse_line("click 1", centre).is_err());
        assert!(parse_line("resize wide 10", centre).is_err());
        assert!(parse_line("toggle", centre).is_err());
    }
}
