use crate::{
    command::{CommandContext, CommandDescriptor},
    parser::ParserOptions,
    resolve::resolve_subcommand,
    schema::parse_typed,
    tokens::normalize,
    usage, Error, Result,
};

/// How [`run_command`] treats an invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run `on_init` / `on_exit` around the handler.
    pub lifecycle_hooks: bool,
    /// Fail when a command with subcommands is reached but none is named.
    pub require_subcommand: bool,
    /// Tokenizer settings for the leaf command. Declarations are added from
    /// its arguments.
    pub parser: ParserOptions,
}

impl RunOptions {
    pub fn lifecycle_hooks(mut self, yes: bool) -> Self {
        self.lifecycle_hooks = yes;
        self
    }

    pub fn require_subcommand(mut self, yes: bool) -> Self {
        self.require_subcommand = yes;
        self
    }

    pub fn parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }
}

/// Resolves the command path in `chunks` and parses the remaining tokens
/// against the leaf command, without running anything.
pub async fn parse_command<I, S>(
    root: &CommandDescriptor,
    chunks: I,
    opts: &RunOptions,
) -> Result<(CommandDescriptor, CommandContext)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens = normalize(chunks);
    let resolved = resolve_subcommand(root, tokens, opts.require_subcommand).await?;
    let args = parse_typed(resolved.tokens.iter().cloned(), &resolved.command.args, &opts.parser)?;
    let ctx = CommandContext { args, raw_args: resolved.tokens, path: resolved.path };
    Ok((resolved.command, ctx))
}

pub async fn run_command<I, S>(root: &CommandDescriptor, chunks: I, opts: &RunOptions) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (cmd, ctx) = parse_command(root, chunks, opts).await?;
    dispatch(&cmd, ctx, opts.lifecycle_hooks).await
}

/// Runs the handler of `cmd`, surrounded by its lifecycle hooks when
/// `lifecycle_hooks` is set.
///
/// A failing `on_init` aborts before the handler. `on_exit` runs whether the
/// handler failed or not; when both fail the handler error is returned with
/// the hook error attached.
pub async fn dispatch(cmd: &CommandDescriptor, ctx: CommandContext, lifecycle_hooks: bool) -> Result<()> {
    let handler = match &cmd.handler {
        Some(it) => it,
        None if cmd.has_subcommands() => {
            return Err(Error::UnknownSubcommand {
                token: None,
                available: cmd.subcommand_names().map(str::to_string).collect(),
            })
        }
        None => return Ok(()),
    };

    if lifecycle_hooks {
        if let Some(init) = &cmd.on_init {
            tracing::debug!("on_init `{}`", cmd.name());
            init(ctx.clone()).await.map_err(Error::Hook)?;
        }
    }

    tracing::debug!("running `{}`", ctx.path.join(" "));
    let outcome = handler(ctx.clone()).await;

    let exit = match &cmd.on_exit {
        Some(exit) if lifecycle_hooks => {
            tracing::debug!("on_exit `{}`", cmd.name());
            exit(ctx).await.err()
        }
        _ => None,
    };

    match (outcome, exit) {
        (Ok(()), None) => Ok(()),
        (Ok(()), Some(hook)) => Err(Error::Hook(hook)),
        (Err(error), exit_hook) => Err(Error::Handler { error, exit_hook }),
    }
}

/// Entry point for binaries: parses `std::env::args`, answers `--help` and
/// `--version`, runs the command with lifecycle hooks and exits on failure.
pub async fn run_main(root: CommandDescriptor) {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let opts = RunOptions::default().lifecycle_hooks(true);
    if let Err(err) = run_main_with(&root, args, &opts).await {
        err.exit()
    }
}

async fn run_main_with(root: &CommandDescriptor, args: Vec<String>, opts: &RunOptions) -> Result<()> {
    let tokens = normalize(args);
    let resolved = resolve_subcommand(root, tokens, false).await?;
    let wants = |flag: &str| resolved.tokens.iter().take_while(|it| *it != "--").any(|it| it == flag);

    if wants("--help") || wants("-h") {
        print!("{}", usage::render(&resolved.command, &resolved.path));
        return Ok(());
    }
    if resolved.path.len() == 1 && wants("--version") {
        if let Some(version) = &root.meta.version {
            println!("{version}");
            return Ok(());
        }
    }

    let args = parse_typed(resolved.tokens.iter().cloned(), &resolved.command.args, &opts.parser)?;
    let ctx = CommandContext { args, raw_args: resolved.tokens, path: resolved.path };
    dispatch(&resolved.command, ctx, opts.lifecycle_hooks).await
}
