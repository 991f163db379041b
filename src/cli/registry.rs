use std::collections::HashMap;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

pub struct CommandEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            usage,
            handler,
        }
    }

    /// Extra words that invoke the same command.
    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn words(&self) -> impl Iterator<Item = &'static str> {
        let aliases: &'static [&'static str] = self.aliases;
        std::iter::once(self.name).chain(aliases.iter().copied())
    }
}

/// Commands in registration order. Lookups accept the name or any alias,
/// ignoring ASCII case.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    by_word: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` unless its name or one of its aliases is already claimed.
    pub fn register(&mut self, entry: CommandEntry) -> bool {
        if entry.words().any(|word| self.by_word.contains_key(word)) {
            return false;
        }
        let index = self.entries.len();
        for word in entry.words() {
            self.by_word.insert(word, index);
        }
        self.entries.push(entry);
        true
    }

    pub fn resolve(&self, word: &str) -> Option<&CommandEntry> {
        let index = match self.by_word.get(word) {
            Some(index) => *index,
            None => *self.by_word.get(word.to_ascii_lowercase().as_str())?,
        };
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Primary names only, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// Every word that resolves to a command, for completion and suggestions.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().flat_map(CommandEntry::words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn aliases_resolve_to_the_same_entry() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register(
            CommandEntry::new("delete", "Remove", "delete <ref>", noop).with_aliases(&["rm"])
        ));
        assert_eq!(registry.resolve("rm").map(|e| e.name), Some("delete"));
        assert_eq!(registry.resolve("DELETE").map(|e| e.name), Some("delete"));
        assert!(registry.resolve("remove").is_none());
        assert_eq!(registry.words().collect::<Vec<_>>(), vec!["delete", "rm"]);
    }

    #[test]
    fn claimed_words_are_not_reassigned() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register(CommandEntry::new("list", "List", "list", noop)));
        assert!(!registry.register(
            CommandEntry::new("ls", "Other", "ls", noop).with_aliases(&["list"])
        ));
        assert!(!registry.register(CommandEntry::new("list", "Dup", "list", noop)));
        assert_eq!(registry.entries().len(), 1);
        assert!(registry.resolve("ls").is_none());
        assert_eq!(registry.resolve("list").map(|e| e.description), Some("List"));
    }
}
