use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between raw arguments and a finished handler.
#[derive(Debug, Error)]
pub enum Error {
    /// Only raised in strict mode. `flag` is always rendered with `--`, even
    /// for single dash short flags.
    #[error("Unknown flag: {flag}")]
    UnknownFlag { flag: String },

    #[error("Missing required argument: {name}")]
    MissingRequiredArgument { name: String },

    #[error("Invalid value for {name}: {value}. Expected one of: {}", .allowed.join(", "))]
    InvalidEnumValue { name: String, value: String, allowed: Vec<String> },

    #[error("Can't parse {name} as a number: {value}")]
    TypeCoercion { name: String, value: String },

    #[error("{}", unknown_subcommand(.token.as_deref(), .available))]
    UnknownSubcommand { token: Option<String>, available: Vec<String> },

    #[error("Invalid argument schema: {0}")]
    InvalidSchema(String),

    #[error("Lifecycle hook failed: {0:#}")]
    Hook(anyhow::Error),

    /// The handler failed. A failure of the exit hook that ran afterwards is
    /// kept in `exit_hook`, the handler error stays primary.
    #[error("{error:#}")]
    Handler { error: anyhow::Error, exit_hook: Option<anyhow::Error> },
}

fn unknown_subcommand(token: Option<&str>, available: &[String]) -> String {
    match token {
        Some(token) => {
            format!("Unknown command: {token}. Available: {}", available.join(", "))
        }
        None => format!("A subcommand is required. Available: {}", available.join(", ")),
    }
}

impl Error {
    pub fn exit(&self) -> ! {
        eprintln!("{self}");
        std::process::exit(1)
    }
}
