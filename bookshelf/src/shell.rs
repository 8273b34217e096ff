//! Interactive command parsing

/// A parsed line of shell input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    /// Free-text search.
    Search(&'a str),
    /// Look up a volume by id.
    Get(&'a str),
    /// Search by ISBN.
    Isbn(&'a str),
    /// Search by author.
    Author(&'a str),
    /// Drop all cached results.
    Clear,
    /// Print configuration and cache occupancy.
    Health,
    /// Print the list of commands.
    Help,
    /// Leave the shell.
    Quit,
    /// Nothing was entered.
    Empty,
    /// The input didn't match any command.
    Unknown(&'a str),
}

/// Parses a single line of shell input.
///
/// The first word names the command and the rest of the line, with surrounding whitespace
/// removed, is its argument.
///
/// # Example
///
/// ```rust
/// use bookshelf::shell::{Input, parse};
/// assert_eq!(parse("search dune messiah"), Input::Search("dune messiah"));
/// assert_eq!(parse("get"), Input::Get(""));
/// assert_eq!(parse("searching"), Input::Unknown("searching"));
/// ```
#[must_use]
pub fn parse(line: &str) -> Input<'_> {
    let line = line.trim();
    let (word, args) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, args)| (word, args.trim_start()));

    match word {
        "" => Input::Empty,
        "search" => Input::Search(args),
        "get" => Input::Get(args),
        "isbn" => Input::Isbn(args),
        "author" => Input::Author(args),
        "clear" if args.is_empty() => Input::Clear,
        "health" if args.is_empty() => Input::Health,
        "help" | "?" if args.is_empty() => Input::Help,
        "quit" | "exit" if args.is_empty() => Input::Quit,
        _ => Input::Unknown(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_split_command_and_arguments() {
        assert_eq!(parse("search   dune"), Input::Search("dune"));
        assert_eq!(parse("author\tFrank Herbert"), Input::Author("Frank Herbert"));
    }

    #[test]
    fn it_should_match_whole_words_only() {
        assert_eq!(parse("getaway"), Input::Unknown("getaway"));
        assert_eq!(parse("clear everything"), Input::Unknown("clear everything"));
    }

    #[test]
    fn it_should_parse_shell_input() {
        let test_cases = [
            ("search dune", Input::Search("dune")),
            ("  get abc  ", Input::Get("abc")),
            ("isbn 978-0-441-01359-3", Input::Isbn("978-0-441-01359-3")),
            ("search", Input::Search("")),
            ("clear", Input::Clear),
            ("health", Input::Health),
            ("?", Input::Help),
            ("exit", Input::Quit),
            ("   ", Input::Empty),
            ("searching", Input::Unknown("searching")),
        ];

        for (line, expected) in test_cases {
            assert_eq!(parse(line), expected);
        }
    }
}
