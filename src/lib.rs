//! Command line arguments parser with lazily loaded subcommands.
//!
//! Raw chunks are flattened into tokens ([`normalize`]), the command path is
//! peeled off by walking the subcommand tree ([`resolve_subcommand`]), the rest
//! is tokenized into flags and positionals ([`parse_args`]), coerced against
//! the leaf's [`ArgSpec`]s ([`coerce`]) and handed to its handler
//! ([`dispatch`]).
//!
//! ```no_run
//! use reli::{ArgSpec, CommandDescriptor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cmd = CommandDescriptor::new("hello")
//!         .arg(ArgSpec::positional("name").required())
//!         .arg(ArgSpec::boolean("emoji").alias("e"))
//!         .handler(|ctx| async move {
//!             let bang = if ctx.args.flag("emoji") { "❣️" } else { "!" };
//!             println!("Hello {}{}", ctx.args.str("name").unwrap_or_default(), bang);
//!             Ok(())
//!         });
//!     reli::run_main(cmd).await
//! }
//! ```

mod command;
mod dispatch;
mod error;
mod parser;
mod resolve;
mod schema;
mod tokens;
pub mod usage;

pub use crate::{
    command::{CommandContext, CommandDescriptor, CommandFactory, HookFn, Meta},
    dispatch::{dispatch, parse_command, run_command, run_main, RunOptions},
    error::{Error, Result},
    parser::{parse_args, ParserOptions, RawParseResult, RawValue, UnknownFn, WarnFn},
    resolve::{resolve_subcommand, Resolved},
    schema::{coerce, options_for, parse_typed, validate_schema, ArgKind, ArgSpec, TypedArgs, Value},
    tokens::normalize,
};
