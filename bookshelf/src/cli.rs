//! Command-line interface

use std::fmt::Write as _;

use argh::FromArgs;
use googlebooks::{Book, Client, OrderBy, PrintType, SearchOptions, SearchResult, Transport};
use miette::IntoDiagnostic;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::shell::{self, Input};
use crate::tracing::LogFormat;

/// Search and look up books.
#[derive(Debug, FromArgs)]
pub struct Opts {
    /// path to config file
    #[argh(option, short = 'c', default = "String::from(\"bookshelf.toml\")")]
    pub config: String,
    /// log format, either text or json
    #[argh(option, default = "LogFormat::Text")]
    pub log_format: LogFormat,
    #[argh(subcommand)]
    pub command: Command,
}

/// The action to perform.
#[derive(Debug, FromArgs)]
#[argh(subcommand)]
pub enum Command {
    /// Free-text search.
    Search(SearchCommand),
    /// Look up a single volume.
    Get(GetCommand),
    /// Search by ISBN.
    Isbn(IsbnCommand),
    /// Report configuration and cache state.
    Health(HealthCommand),
    /// Interactive session.
    Shell(ShellCommand),
}

/// search for books
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "search")]
pub struct SearchCommand {
    /// the words to search for
    #[argh(positional)]
    pub query: Vec<String>,
    /// restrict the search to an author
    #[argh(switch)]
    pub author: bool,
    /// restrict the search to titles
    #[argh(switch)]
    pub title: bool,
    /// index of the first result
    #[argh(option, default = "0")]
    pub start_index: u32,
    /// number of results, at most 40
    #[argh(option, default = "googlebooks::query::DEFAULT_MAX_RESULTS")]
    pub max_results: u32,
    /// sort order, either relevance or newest
    #[argh(option, default = "OrderBy::Relevance")]
    pub order_by: OrderBy,
    /// two-letter language code to restrict results to
    #[argh(option, default = "String::from(googlebooks::query::DEFAULT_LANGUAGE)")]
    pub lang: String,
    /// search all languages
    #[argh(switch)]
    pub any_language: bool,
    /// kind of publication, one of all, books or magazines
    #[argh(option, default = "PrintType::Books")]
    pub print_type: PrintType,
    /// print results as JSON
    #[argh(switch)]
    pub json: bool,
}

/// look up a book by its volume id
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "get")]
pub struct GetCommand {
    /// the volume id
    #[argh(positional)]
    pub id: String,
    /// print the book as JSON
    #[argh(switch)]
    pub json: bool,
}

/// search for books by ISBN
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "isbn")]
pub struct IsbnCommand {
    /// the ISBN-10 or ISBN-13
    #[argh(positional)]
    pub isbn: String,
    /// print results as JSON
    #[argh(switch)]
    pub json: bool,
}

/// show configuration and cache state
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "health")]
pub struct HealthCommand {}

/// start an interactive session that reads commands from stdin
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "shell")]
pub struct ShellCommand {}

impl From<&SearchCommand> for SearchOptions {
    fn from(args: &SearchCommand) -> Self {
        let lang = (!args.any_language).then_some(args.lang.as_str());

        SearchOptions::default()
            .with_start_index(args.start_index)
            .with_max_results(args.max_results)
            .with_order_by(args.order_by)
            .with_lang_restrict(lang)
            .with_print_type(args.print_type)
    }
}

/// Executes `command` against `client`.
///
/// # Errors
///
/// Returns an error if the operation fails or its output can't be written.
pub async fn run<T: Transport>(client: &Client<T>, command: Command) -> miette::Result<()> {
    match command {
        Command::Search(cmd) => {
            let query = cmd.query.join(" ");
            let options = SearchOptions::from(&cmd);
            let result = if cmd.author {
                client.search_by_author(&query, &options).await
            } else if cmd.title {
                client.search_by_title(&query, &options).await
            } else {
                client.search(&query, &options).await
            };
            let result = result.into_diagnostic()?;

            print(&result, cmd.json, format_result)
        }
        Command::Get(cmd) => {
            let book = client.get_by_id(&cmd.id).await.into_diagnostic()?;

            print(&book, cmd.json, format_book_details)
        }
        Command::Isbn(cmd) => {
            let result = client
                .search_by_isbn(&cmd.isbn, &SearchOptions::default())
                .await
                .into_diagnostic()?;

            print(&result, cmd.json, format_result)
        }
        Command::Health(_) => {
            println!("{}", client.health().await);

            Ok(())
        }
        Command::Shell(_) => run_shell(client).await,
    }
}

/// Reads commands from stdin until it is closed or the user quits.
///
/// Failed operations are reported and the session continues.
async fn run_shell<T: Transport>(client: &Client<T>) -> miette::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let options = SearchOptions::default();

    loop {
        stdout.write_all(b"> ").await.into_diagnostic()?;
        stdout.flush().await.into_diagnostic()?;

        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            break;
        };

        debug!(%line, "shell input");

        let output = match shell::parse(&line) {
            Input::Search(query) => client
                .search(query, &options)
                .await
                .map(|r| format_result(&r)),
            Input::Author(author) => client
                .search_by_author(author, &options)
                .await
                .map(|r| format_result(&r)),
            Input::Isbn(isbn) => client
                .search_by_isbn(isbn, &options)
                .await
                .map(|r| format_result(&r)),
            Input::Get(id) => client.get_by_id(id).await.map(|b| format_book_details(&b)),
            Input::Clear => {
                client.clear_cache().await;
                Ok("cache cleared".to_string())
            }
            Input::Health => Ok(client.health().await.to_string()),
            Input::Help => Ok(HELP.to_string()),
            Input::Quit => break,
            Input::Empty => continue,
            Input::Unknown(command) => Ok(format!("unknown command `{command}`, try `help`")),
        };

        match output {
            Ok(text) => println!("{text}"),
            Err(err) if err.is_retryable() => println!("error: {err} (you may retry)"),
            Err(err) => println!("error: {err}"),
        }
    }

    Ok(())
}

const HELP: &str = "\
search <query>   search for books
author <name>    search for books by author
isbn <isbn>      search for a book by ISBN
get <id>         show a book by its volume id
clear            drop cached results
health           show configuration and cache state
quit             leave the shell";

fn print<V: Serialize>(value: &V, json: bool, text: fn(&V) -> String) -> miette::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    } else {
        println!("{}", text(value));
    }

    Ok(())
}

/// Formats a page of results as one line per book.
#[must_use]
pub fn format_result(result: &SearchResult) -> String {
    if result.items.is_empty() {
        return format!("No books found for “{}”", result.query);
    }

    let mut out = format!(
        "Showing {} of {} results for “{}”",
        result.items.len(),
        result.total_items,
        result.query
    );

    for book in &result.items {
        let _ = write!(out, "\n  {}", format_book_line(book));
    }

    out
}

/// Formats a book as a single line.
#[must_use]
pub fn format_book_line(book: &Book) -> String {
    let mut line = format!("{} by {}", book.title, book.authors.join(", "));

    if let Some(year) = book.published_date.as_deref().and_then(|d| d.get(..4)) {
        let _ = write!(line, " ({year})");
    }

    let _ = write!(line, " [{}]", book.id);

    line
}

/// Formats a book with all known details.
#[must_use]
pub fn format_book_details(book: &Book) -> String {
    let mut out = format_book_line(book);

    if let Some(subtitle) = &book.subtitle {
        let _ = write!(out, "\n  {subtitle}");
    }
    if let Some(publisher) = &book.publisher {
        let _ = write!(out, "\n  Publisher: {publisher}");
    }
    if book.page_count > 0 {
        let _ = write!(out, "\n  Pages: {}", book.page_count);
    }
    if !book.categories.is_empty() {
        let _ = write!(out, "\n  Categories: {}", book.categories.join(", "));
    }
    if let Some(isbn) = book.isbn_13().or_else(|| book.isbn_10()) {
        let _ = write!(out, "\n  ISBN: {isbn}");
    }
    if book.ratings_count > 0 {
        let _ = write!(
            out,
            "\n  Rating: {:.1} ({} ratings)",
            book.average_rating, book.ratings_count
        );
    }
    if let Some(cover) = book.cover_url() {
        let _ = write!(out, "\n  Cover: {cover}");
    }
    if let Some(description) = &book.description {
        let _ = write!(out, "\n\n{description}");
    }

    out
}
