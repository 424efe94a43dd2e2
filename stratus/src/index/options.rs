/// Options controlling how an index is created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Enforce a unique constraint on the indexed field(s).
    pub unique: bool,
    /// Materialize the tag as a SHA-256 digest of the source value instead
    /// of the reversible encoding. Hashed tags support equality only and
    /// are meant for unique fields whose natural values could overflow or
    /// collide under escaping (emails, usernames). Single-field indexes
    /// only.
    pub hashed: bool,
}

impl IndexOptions {
    pub fn new() -> Self {
        IndexOptions::default()
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn hashed(mut self, hashed: bool) -> Self {
        self.hashed = hashed;
        self
    }
}

/// Creates options for a non-unique index.
pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new()
}

/// Creates options for a unique index.
pub fn unique_index() -> IndexOptions {
    IndexOptions::new().unique(true)
}

/// Creates options for a hashed unique index.
pub fn hashed_unique_index() -> IndexOptions {
    IndexOptions::new().unique(true).hashed(true)
}
