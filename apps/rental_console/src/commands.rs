use shared::domain::{PaymentMethod, VehicleId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Ask the simulated host to push its offer.
    Open,
    Category(String),
    Search(String),
    Vehicle(VehicleId),
    Color(String),
    Pay(PaymentMethod),
    Rent,
    Return,
    Close,
    Escape,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("unknown payment method '{0}' (use cash or bank)")]
    PaymentMethod(String),
}

pub const HELP: &str = "\
commands:
  open                 ask the simulated host to push its offer
  category <name>      switch category tab
  search [text]        filter vehicles by model (empty clears)
  vehicle <id>         select a vehicle
  color <value>        select a color by key
  pay cash|bank        choose payment method
  rent | return        send rent / return to the host
  close | esc          close the menu
  show                 print the menu
  quit                 exit";

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ConsoleCommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let required = |command: &'static str, what: &'static str| {
            if rest.is_empty() {
                Err(ConsoleCommandError::MissingArgument { command, what })
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ConsoleCommandError::Empty),
            "open" => Ok(Self::Open),
            "category" | "cat" => required("category", "a category name").map(Self::Category),
            "search" => Ok(Self::Search(rest.to_string())),
            "vehicle" | "select" => {
                required("vehicle", "a vehicle id").map(|id| Self::Vehicle(VehicleId(id)))
            }
            "color" | "colour" => required("color", "a color value").map(Self::Color),
            "pay" => {
                let method = required("pay", "cash or bank")?;
                PaymentMethod::parse(&method)
                    .map(Self::Pay)
                    .ok_or(ConsoleCommandError::PaymentMethod(method))
            }
            "rent" => Ok(Self::Rent),
            "return" => Ok(Self::Return),
            "close" => Ok(Self::Close),
            "esc" | "escape" => Ok(Self::Escape),
            "show" | "ls" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ConsoleCommandError::Unknown(other.to_string())),
        }
    }
}
