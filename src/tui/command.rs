//! Slash commands typed into the input box.
//!
//! ```text
//! /new                          start a new conversation
//! /search <query> [--brand B] [--category C] [--min N] [--max N]
//! /trending [category]
//! /prefs                        shopping profile and recommendations
//! /history                      pull saved conversations from the backend
//! /logout
//! /help
//! ```

use std::fmt;

use crate::api::types::{ProductSearchParams, TrendingParams};

pub const HELP_LINES: &[&str] = &[
    "/new                 start a new conversation",
    "/search <query>      search products (--brand, --category, --min, --max)",
    "/trending [category] what is selling right now",
    "/prefs               your shopping profile and recommendations",
    "/history             pull saved conversations from the backend",
    "/logout              sign out",
    "/help                this list",
    "",
    "Ctrl+B sidebar   Tab focus   Ctrl+N new   Ctrl+C quit",
];

const SEARCH_LIMIT: u32 = 20;
const TRENDING_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New,
    Search(ProductSearchParams),
    Trending(TrendingParams),
    Prefs,
    History,
    Logout,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument(&'static str),
    BadValue { flag: String, value: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(name) => write!(f, "Unknown command /{name}. Try /help"),
            CommandError::MissingArgument(usage) => write!(f, "Usage: {usage}"),
            CommandError::BadValue { flag, value } => write!(f, "Bad value for {flag}: {value}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse `input` as a slash command. Returns `None` for ordinary chat text.
pub fn parse(input: &str) -> Option<Result<Command, CommandError>> {
    let rest = input.trim().strip_prefix('/')?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "new" => Ok(Command::New),
        "search" => parse_search(args),
        "trending" => Ok(Command::Trending(TrendingParams {
            category: (!args.is_empty()).then(|| args.to_string()),
            timeframe_days: None,
            limit: Some(TRENDING_LIMIT),
        })),
        "prefs" | "preferences" => Ok(Command::Prefs),
        "history" => Ok(Command::History),
        "logout" => Ok(Command::Logout),
        "help" | "?" => Ok(Command::Help),
        other => Err(CommandError::Unknown(other.to_string())),
    };
    Some(command)
}

fn parse_search(args: &str) -> Result<Command, CommandError> {
    let mut params = ProductSearchParams {
        limit: Some(SEARCH_LIMIT),
        ..Default::default()
    };
    let mut words = Vec::new();
    let mut tokens = args.split_whitespace();

    while let Some(token) = tokens.next() {
        let Some(flag) = token.strip_prefix("--") else {
            words.push(token);
            continue;
        };
        let value = tokens.next().ok_or(CommandError::MissingArgument(
            "/search <query> [--brand B] [--category C] [--min N] [--max N]",
        ))?;
        match flag {
            "brand" => params.brand = Some(value.to_string()),
            "category" => params.category = Some(value.to_string()),
            "department" => params.department = Some(value.to_string()),
            "min" => params.min_price = Some(parse_price(token, value)?),
            "max" => params.max_price = Some(parse_price(token, value)?),
            _ => {
                return Err(CommandError::BadValue {
                    flag: token.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    if !words.is_empty() {
        params.q = Some(words.join(" "));
    }
    if params.q.is_none() && params.brand.is_none() && params.category.is_none() {
        return Err(CommandError::MissingArgument("/search <query>"));
    }
    Ok(Command::Search(params))
}

fn parse_price(flag: &str, value: &str) -> Result<f64, CommandError> {
    value
        .trim_start_matches('$')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| CommandError::BadValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}
