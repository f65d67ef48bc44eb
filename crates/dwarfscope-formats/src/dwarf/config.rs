//! Reader configuration.

/// Configuration for [`DwarfInfo`](super::DwarfInfo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwarfConfig {
    /// Build the address and offset index while loading instead of on the
    /// first query. Queries never mutate the reader after this.
    pub eager_index: bool,

    /// Let child iteration jump over subtrees using `DW_AT_sibling`. When
    /// off, subtrees are always decoded entry by entry.
    pub follow_sibling_hints: bool,
}

impl Default for DwarfConfig {
    fn default() -> Self {
        Self {
            eager_index: false,
            follow_sibling_hints: true,
        }
    }
}

impl DwarfConfig {
    /// Build the index during construction.
    pub fn with_eager_index(mut self, eager: bool) -> Self {
        self.eager_index = eager;
        self
    }

    /// Set whether `DW_AT_sibling` hints are followed.
    pub fn with_sibling_hints(mut self, follow: bool) -> Self {
        self.follow_sibling_hints = follow;
        self
    }
}
