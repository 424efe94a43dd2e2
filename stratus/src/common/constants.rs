// blob name constants
pub const CATALOG_BLOB_NAME: &str = "__collection_indexes";
pub const SYSTEM_PREFIX: &str = "__";

// document constants
pub const DOC_ID: &str = "id";

// tag constants
pub const MAX_INDEXED_FIELDS: usize = 10;
pub const MAX_TAG_VALUE_LEN: usize = 256;
pub const COMPOUND_INDEX_SEPARATOR: &str = "_";

// container name constants
pub const MIN_CONTAINER_NAME_LEN: usize = 3;
pub const MAX_CONTAINER_NAME_LEN: usize = 63;
pub const CONTAINER_NAME_PAD: char = 'a';

// catalog CAS retry defaults
pub const DEFAULT_MAX_CATALOG_RETRIES: u32 = 5;
pub const DEFAULT_CATALOG_RETRY_INITIAL_DELAY_MS: u64 = 100;
pub const DEFAULT_CATALOG_RETRY_MAX_DELAY_MS: u64 = 5000;

pub const STRATUS_VERSION: &str = env!("CARGO_PKG_VERSION");

// Compile-time assertion: the catalog blob must itself be a system blob,
// otherwise listings would surface it as a document.
const _: () = {
    let name = CATALOG_BLOB_NAME.as_bytes();
    assert!(name.len() > 2 && name[0] == b'_' && name[1] == b'_');
};
