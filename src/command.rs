use std::{fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};

use crate::schema::{ArgSpec, TypedArgs};

/// What a handler or lifecycle hook gets to see.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub args: TypedArgs,
    /// Tokens left after the command path was peeled off.
    pub raw_args: Vec<String>,
    /// Command names from the root down to the running command.
    pub path: Vec<String>,
}

pub type HookFn = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Produces a subcommand on demand.
///
/// Implemented for any `Fn() -> impl Future<Output = CommandDescriptor>`, so
/// `|| async { build_cmd() }` can be registered directly.
pub trait CommandFactory: Send + Sync {
    fn resolve(&self) -> BoxFuture<'_, CommandDescriptor>;
}

impl<F, Fut> CommandFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = CommandDescriptor> + Send + 'static,
{
    fn resolve(&self) -> BoxFuture<'_, CommandDescriptor> {
        self().boxed()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Default)]
pub struct CommandDescriptor {
    pub meta: Meta,
    pub args: Vec<ArgSpec>,
    pub(crate) subcommands: Vec<(String, Arc<dyn CommandFactory>)>,
    pub(crate) default_subcommand: Option<String>,
    pub(crate) on_init: Option<HookFn>,
    pub(crate) on_exit: Option<HookFn>,
    pub(crate) handler: Option<HookFn>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("meta", &self.meta)
            .field("args", &self.args)
            .field("subcommands", &self.subcommand_names().collect::<Vec<_>>())
            .field("default_subcommand", &self.default_subcommand)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> CommandDescriptor {
        CommandDescriptor {
            meta: Meta { name: name.into(), ..Meta::default() },
            ..CommandDescriptor::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn version(mut self, version: impl Into<String>) -> CommandDescriptor {
        self.meta.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> CommandDescriptor {
        self.meta.description = Some(description.into());
        self
    }

    pub fn arg(mut self, spec: ArgSpec) -> CommandDescriptor {
        self.args.push(spec);
        self
    }

    /// Registers a lazily built subcommand. The factory runs only when the
    /// subcommand is actually selected.
    pub fn subcommand<F>(mut self, name: impl Into<String>, factory: F) -> CommandDescriptor
    where
        F: CommandFactory + 'static,
    {
        let name = name.into();
        self.subcommands.retain(|(it, _)| *it != name);
        let factory: Arc<dyn CommandFactory> = Arc::new(factory);
        self.subcommands.push((name, factory));
        self
    }

    /// Subcommand to descend into when no token names one.
    pub fn default_subcommand(mut self, name: impl Into<String>) -> CommandDescriptor {
        self.default_subcommand = Some(name.into());
        self
    }

    pub fn on_init<F, Fut>(mut self, hook: F) -> CommandDescriptor
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_init = Some(hook_fn(hook));
        self
    }

    pub fn on_exit<F, Fut>(mut self, hook: F) -> CommandDescriptor
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_exit = Some(hook_fn(hook));
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> CommandDescriptor
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(hook_fn(handler));
        self
    }

    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    pub fn subcommand_names(&self) -> impl Iterator<Item = &str> {
        self.subcommands.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn factory(&self, name: &str) -> Option<Arc<dyn CommandFactory>> {
        self.subcommands.iter().find(|(it, _)| it == name).map(|(_, factory)| Arc::clone(factory))
    }
}

fn hook_fn<F, Fut>(f: F) -> HookFn
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx: CommandContext| f(ctx).boxed())
}
