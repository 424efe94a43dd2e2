/// Options for controlling find operations on documents.
///
/// `FindOptions` carries pagination for query results and supports method
/// chaining for convenient configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use stratus::collection::FindOptions;
///
/// // Skip the first 10 hits and return at most 20
/// let options = FindOptions::new().offset(10).limit(20);
///
/// // Or use the convenience constructors
/// let options = skip_by(10);
/// let options = limit_to(20);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub(crate) offset: Option<usize>,
    pub(crate) limit: Option<usize>,
}

impl FindOptions {
    /// Creates a new `FindOptions` with no pagination.
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Skips the first `offset` hits of the result stream.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Caps the number of hits returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Creates `FindOptions` that skips a number of results.
pub fn skip_by(offset: usize) -> FindOptions {
    FindOptions::new().offset(offset)
}

/// Creates `FindOptions` that limits the number of results.
pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FindOptions::new();
        assert_eq!(options.offset, None);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_chaining() {
        let options = FindOptions::new().offset(2).limit(3);
        assert_eq!(options.offset, Some(2));
        assert_eq!(options.limit, Some(3));
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(skip_by(5), FindOptions::new().offset(5));
        assert_eq!(limit_to(7), FindOptions::new().limit(7));
    }
}
