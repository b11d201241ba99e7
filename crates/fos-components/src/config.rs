//! Component Configuration

/// How props and hooks are scoped across elements sharing one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isolation {
    /// One props store and hook set per tag; the factory runs once
    #[default]
    Shared,
    /// The factory runs again for every constructed element
    PerInstance,
}

/// Component configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Scope of props stores and hooks
    pub isolation: Isolation,

    /// Ignore attribute changes caused by an element's own reflection
    pub guard_reflection: bool,

    /// Skip updates for attribute changes the last render never read
    pub skip_unread_attributes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            isolation: Isolation::Shared,
            guard_reflection: true,
            skip_unread_attributes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.isolation, Isolation::Shared);
        assert!(config.guard_reflection);
        assert!(config.skip_unread_attributes);
    }
}
