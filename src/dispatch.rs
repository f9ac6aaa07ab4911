//! Command registry: a dotted-name dispatch table built once at startup from
//! declarative handler groups.
//!
//! A group contributes its namespace to a leaf's full name only when the
//! group opts in (`qualify`); recursion into child groups always extends the
//! accumulated base namespace. Name or alias collisions abort startup.

use anyhow::Result;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::context::ChatContext;
use crate::state::AppState;

/// Boxed async command handler
pub type Handler = Arc<
    dyn Fn(Arc<AppState>, Arc<dyn ChatContext>, Vec<String>) -> BoxFuture<'static, Result<()>>
        + Send
        + Sync,
>;

/// Wrap an async fn into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<AppState>, Arc<dyn ChatContext>, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |state, ctx, args| Box::pin(f(state, ctx, args)))
}

/// A directly invocable command
pub struct LeafSpec {
    /// Primary name (joined into the dotted full name)
    pub name: String,
    /// Alternative names, namespaced the same way as `name`
    pub aliases: Vec<String>,
    /// Bound handler
    pub handler: Handler,
}

/// A namespace of leaf commands and nested groups
pub struct CommandGroup {
    /// Namespace label; may be empty
    pub namespace: String,
    /// Whether `namespace` is inserted into this group's own leaf names
    pub qualify: bool,
    /// Leaf commands of this group
    pub commands: Vec<LeafSpec>,
    /// Nested groups
    pub children: Vec<CommandGroup>,
}

/// Fatal registry construction errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two commands flattened to the same full name or alias
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
}

/// Flattened dispatch table keyed by lowercased full dotted name
pub struct CommandRegistry {
    table: HashMap<String, Handler>,
    fallback: Handler,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("table", &self.table.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn join(base: &str, part: &str) -> String {
    if part.is_empty() {
        base.to_string()
    } else {
        format!("{base}.{part}")
    }
}

impl CommandRegistry {
    /// Build the table from the given groups. The fallback handler runs for
    /// unknown command tokens.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistryError::DuplicateCommand`] on any name or alias
    /// collision. This is a startup-abort condition.
    pub fn build(groups: Vec<CommandGroup>, fallback: Handler) -> Result<Self, RegistryError> {
        let mut table = HashMap::new();
        for group in groups {
            Self::flatten(&mut table, "", group)?;
        }
        Ok(Self { table, fallback })
    }

    fn flatten(
        table: &mut HashMap<String, Handler>,
        base: &str,
        group: CommandGroup,
    ) -> Result<(), RegistryError> {
        let leaf_base = if group.qualify {
            join(base, &group.namespace)
        } else {
            base.to_string()
        };
        for leaf in group.commands {
            Self::insert(table, &leaf_base, &leaf.name, leaf.handler.clone())?;
            for alias in &leaf.aliases {
                Self::insert(table, &leaf_base, alias, leaf.handler.clone())?;
            }
        }
        // Children always inherit the extended base, regardless of their
        // own qualify flag.
        let child_base = join(base, &group.namespace);
        for child in group.children {
            Self::flatten(table, &child_base, child)?;
        }
        Ok(())
    }

    fn insert(
        table: &mut HashMap<String, Handler>,
        base: &str,
        name: &str,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        let full = join(base, name)
            .trim_start_matches('.')
            .to_lowercase();
        if table.insert(full.clone(), handler).is_some() {
            return Err(RegistryError::DuplicateCommand(full));
        }
        Ok(())
    }

    /// Resolve the leading token of `text` (case-insensitively) and invoke
    /// the bound handler with the remaining whitespace-split arguments. An
    /// unknown or missing token invokes the fallback handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's failure; recoverable problems are messaged
    /// to the user inside the handlers themselves.
    pub async fn dispatch(
        &self,
        state: Arc<AppState>,
        ctx: Arc<dyn ChatContext>,
        text: &str,
    ) -> Result<()> {
        let mut parts = text.split_whitespace();
        let Some(token) = parts.next() else {
            return (self.fallback)(state, ctx, Vec::new()).await;
        };
        let args: Vec<String> = parts.map(str::to_string).collect();
        match self.table.get(&token.to_lowercase()) {
            Some(bound) => bound(state, ctx, args).await,
            None => {
                debug!(token, "unknown command, falling back to help");
                (self.fallback)(state, ctx, args).await
            }
        }
    }

    /// All registered full names and aliases, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of table entries (names + aliases).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when no command is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
