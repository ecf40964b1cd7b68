use crate::{command::CommandDescriptor, Error, Result};

/// Result of walking the subcommand tree.
#[derive(Debug)]
pub struct Resolved {
    /// The leaf command.
    pub command: CommandDescriptor,
    /// Names from the root to the leaf.
    pub path: Vec<String>,
    /// Tokens not consumed as command names, in their original order.
    pub tokens: Vec<String>,
}

/// Descends from `root` while the first non-flag token names a subcommand of
/// the current command, resolving one lazy factory per step.
///
/// A root without subcommands takes all tokens as is. With `require`, stopping
/// on a command which has subcommands but no match (and no default) fails.
pub async fn resolve_subcommand(
    root: &CommandDescriptor,
    tokens: Vec<String>,
    require: bool,
) -> Result<Resolved> {
    let mut path = vec![root.meta.name.clone()];
    let mut current = root.clone();
    if !current.has_subcommands() {
        return Ok(Resolved { command: current, path, tokens });
    }

    let mut consumed = vec![false; tokens.len()];
    let mut cursor = 0;
    while current.has_subcommands() {
        let candidate = tokens
            .iter()
            .enumerate()
            .skip(cursor)
            .take_while(|(_, it)| *it != "--")
            .find(|(_, it)| !it.starts_with('-'));

        if let Some((idx, name)) = candidate {
            if let Some(factory) = current.factory(name) {
                tracing::debug!("resolving subcommand `{name}` of `{}`", current.name());
                let next = factory.resolve().await;
                consumed[idx] = true;
                cursor = idx + 1;
                path.push(name.clone());
                current = next;
                continue;
            }
        }

        let default = current.default_subcommand.clone();
        if let Some(factory) = default.as_deref().and_then(|it| current.factory(it)) {
            tracing::debug!("resolving default subcommand of `{}`", current.name());
            let next = factory.resolve().await;
            path.extend(default);
            current = next;
            continue;
        }

        if require {
            return Err(Error::UnknownSubcommand {
                token: candidate.map(|(_, it)| it.clone()),
                available: current.subcommand_names().map(str::to_string).collect(),
            });
        }
        break;
    }

    let tokens = tokens
        .into_iter()
        .zip(consumed)
        .filter(|(_, consumed)| !consumed)
        .map(|(it, _)| it)
        .collect();
    Ok(Resolved { command: current, path, tokens })
}
