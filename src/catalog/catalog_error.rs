use thiserror::Error;

/// Load-time failures for the operation catalog and the selection.
///
/// All of these are fatal to the run; the generators never recover from a
/// malformed data source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in '{path}': {source}")]
    Malformed {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("bad hexadecimal field '{value}' in '{path}'")]
    BadHex { path: String, value: String },

    #[error("encoded value {value:#x} in '{path}' does not fit one byte")]
    EncodedOutOfRange { path: String, value: u32 },

    #[error("duplicate operation id {id:#x} in '{path}'")]
    DuplicateId { path: String, id: u16 },

    #[error("selection row {id:#x} in '{path}' is not in the catalog")]
    UnknownSelectionId { path: String, id: u16 },
}
