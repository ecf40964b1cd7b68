//! Human readable usage text for a command.
//!
//! Subcommands are only listed by name: rendering help never resolves a lazy
//! factory.

use std::fmt::Write;

use crate::{
    command::CommandDescriptor,
    schema::{ArgKind, ArgSpec, Value},
};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

/// Renders usage of `cmd`, reached through `path` (root name first). An empty
/// `path` means `cmd` is the root.
pub fn render(cmd: &CommandDescriptor, path: &[String]) -> String {
    let mut buf = String::new();
    let full_name = if path.is_empty() { cmd.name().to_string() } else { path.join(" ") };

    w!(buf, "{full_name}");
    if let Some(version) = &cmd.meta.version {
        w!(buf, " {version}");
    }
    w!(buf, "\n");
    if let Some(description) = &cmd.meta.description {
        w!(buf, "  {description}\n");
    }

    blank_line(&mut buf);
    w!(buf, "USAGE:\n");
    w!(buf, "    {full_name}");
    let flags = cmd.args.iter().filter(|it| it.is_flag()).collect::<Vec<_>>();
    let positionals = cmd.args.iter().filter(|it| !it.is_flag()).collect::<Vec<_>>();
    if !flags.is_empty() {
        w!(buf, " [OPTIONS]");
    }
    for arg in &positionals {
        w!(buf, " {}", positional(arg));
    }
    if cmd.has_subcommands() {
        w!(buf, " <COMMAND>");
    }
    w!(buf, "\n");

    if !positionals.is_empty() {
        blank_line(&mut buf);
        w!(buf, "ARGS:\n");
        for arg in &positionals {
            w!(buf, "    {}\n", positional(arg));
            describe(&mut buf, arg);
        }
    }

    if !flags.is_empty() {
        blank_line(&mut buf);
        w!(buf, "OPTIONS:\n");
        for arg in &flags {
            let aliases = arg
                .alias
                .iter()
                .map(|it| if it.chars().count() == 1 { format!("-{it}, ") } else { format!("--{it}, ") })
                .collect::<String>();
            let value = match arg.kind {
                ArgKind::Boolean => String::new(),
                ArgKind::Enum => match &arg.allowed {
                    Some(allowed) => format!(" <{}>", allowed.join("|")),
                    None => format!(" <{}>", arg.name),
                },
                ArgKind::Array => format!(" <{}>...", arg.name),
                _ => format!(" <{}>", arg.name),
            };
            w!(buf, "    {aliases}--{}{value}", arg.name);
            if arg.required {
                w!(buf, " (required)");
            }
            w!(buf, "\n");
            describe(&mut buf, arg);
        }
    }

    if cmd.has_subcommands() {
        blank_line(&mut buf);
        w!(buf, "COMMANDS:\n");
        for name in cmd.subcommand_names() {
            if cmd.default_subcommand.as_deref() == Some(name) {
                w!(buf, "    {name} (default)\n");
            } else {
                w!(buf, "    {name}\n");
            }
        }
    }

    buf
}

fn positional(arg: &ArgSpec) -> String {
    if arg.required && arg.default.is_none() {
        format!("<{}>", arg.name)
    } else {
        format!("[{}]", arg.name)
    }
}

fn describe(buf: &mut String, arg: &ArgSpec) {
    let default = arg.default.as_ref().and_then(render_default);
    match (&arg.description, default) {
        (Some(doc), Some(default)) => w!(buf, "      {doc} (default: {default})\n"),
        (Some(doc), None) => w!(buf, "      {doc}\n"),
        (None, Some(default)) => w!(buf, "      (default: {default})\n"),
        (None, None) => (),
    }
}

fn render_default(value: &Value) -> Option<String> {
    match value {
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Str(it) => Some(it.clone()),
        Value::Num(it) => Some(it.to_string()),
        Value::List(items) if items.is_empty() => None,
        Value::List(items) => Some(items.join(",")),
    }
}

fn blank_line(buf: &mut String) {
    w!(buf, "\n");
}
