pub mod catalog_error;
pub mod operation;
pub mod variants;

pub use catalog_error::CatalogError;
pub use operation::Operation;

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

// =============================================================================
// CATALOG - operation metadata, loaded once, read-only afterwards
// =============================================================================

/// One row of the opcodes file. `id` and `encoded` are hexadecimal strings
/// (`0x1a`); an empty `immediate_size` means no immediate.
#[derive(Debug, Deserialize)]
struct OpcodeRow {
    id: String,
    mnemonic: String,
    encoded: String,
    removed_from_stack: u32,
    added_to_stack: u32,
    immediate_size: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct SelectionRow {
    id: String,
}

/// The operation catalog: identifier -> metadata.
///
/// Loaded from a CSV file at startup and then extended with the derived
/// PUSH/DUP/SWAP sub-catalog. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    ops: BTreeMap<u16, Operation>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path_text = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|source| CatalogError::Io {
            path: path_text.clone(),
            source,
        })?;
        Self::from_reader(file, &path_text)
    }

    pub fn from_reader<R: Read>(reader: R, path: &str) -> Result<Self, CatalogError> {
        let mut ops = BTreeMap::new();
        let mut csv_reader = csv::Reader::from_reader(reader);

        for row in csv_reader.deserialize::<OpcodeRow>() {
            let row = row.map_err(|source| CatalogError::Malformed {
                path: path.to_string(),
                source,
            })?;
            let id = parse_hex(path, &row.id)?;
            let encoded = parse_hex(path, &row.encoded)?;
            let encoded =
                u8::try_from(encoded).map_err(|_| CatalogError::EncodedOutOfRange {
                    path: path.to_string(),
                    value: encoded as u32,
                })?;

            let operation = Operation {
                id,
                mnemonic: row.mnemonic,
                encoded,
                removed_from_stack: row.removed_from_stack,
                added_to_stack: row.added_to_stack,
                immediate_size: row.immediate_size,
            };
            if ops.insert(id, operation).is_some() {
                return Err(CatalogError::DuplicateId {
                    path: path.to_string(),
                    id,
                });
            }
        }

        for operation in variants::derived() {
            let id = operation.id;
            if ops.insert(id, operation).is_some() {
                return Err(CatalogError::DuplicateId {
                    path: path.to_string(),
                    id,
                });
            }
        }

        Ok(Self { ops })
    }

    pub fn get(&self, id: u16) -> Option<&Operation> {
        self.ops.get(&id)
    }

    pub fn by_mnemonic(&self, mnemonic: &str) -> Option<&Operation> {
        self.ops.values().find(|op| op.mnemonic == mnemonic)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// SELECTION - which catalog entries a run may emit
// =============================================================================

/// The set of operation identifiers a generation run is scoped to.
///
/// A selection row naming an identifier the catalog does not know is a fatal
/// load error: in a measurement tool, silently skipping rows would skew the
/// produced corpus without anyone noticing.
#[derive(Debug, Clone)]
pub struct Selection {
    ids: BTreeSet<u16>,
}

impl Selection {
    pub fn load(path: impl AsRef<Path>, catalog: &Catalog) -> Result<Self, CatalogError> {
        let path_text = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|source| CatalogError::Io {
            path: path_text.clone(),
            source,
        })?;
        Self::from_reader(file, &path_text, catalog)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        path: &str,
        catalog: &Catalog,
    ) -> Result<Self, CatalogError> {
        let mut ids = BTreeSet::new();
        let mut csv_reader = csv::Reader::from_reader(reader);

        for row in csv_reader.deserialize::<SelectionRow>() {
            let row = row.map_err(|source| CatalogError::Malformed {
                path: path.to_string(),
                source,
            })?;
            let id = parse_hex(path, &row.id)?;
            if catalog.get(id).is_none() {
                return Err(CatalogError::UnknownSelectionId {
                    path: path.to_string(),
                    id,
                });
            }
            ids.insert(id);
        }

        Ok(Self { ids })
    }

    pub fn contains(&self, id: u16) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ids.iter().copied()
    }
}

fn parse_hex(path: &str, value: &str) -> Result<u16, CatalogError> {
    let digits = value.trim().strip_prefix("0x").unwrap_or(value.trim());
    u16::from_str_radix(digits, 16).map_err(|_| CatalogError::BadHex {
        path: path.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_from(text: &str) -> Result<Catalog, CatalogError> {
        Catalog::from_reader(text.as_bytes(), "test.csv")
    }

    const SMALL: &str = "\
id,mnemonic,encoded,removed_from_stack,added_to_stack,immediate_size
0x01,ADD,0x01,2,1,
0x50,POP,0x50,1,0,
0x15c,TLOAD_EXT,0x5c,1,1,
";

    #[test]
    fn test_load_rows_and_derived_variants() {
        let catalog = catalog_from(SMALL).unwrap();

        let add = catalog.get(0x01).unwrap();
        assert_eq!(add.mnemonic, "ADD");
        assert_eq!(add.removed_from_stack, 2);
        assert_eq!(add.added_to_stack, 1);
        assert_eq!(add.immediate_size, None);

        // pseudo-operation: id above 0xff, encoded byte of the real opcode
        let tload_ext = catalog.get(0x15c).unwrap();
        assert_eq!(tload_ext.encoded, 0x5c);

        // derived sub-catalog is always present
        assert_eq!(catalog.get(0x7f).unwrap().mnemonic, "PUSH32");
        assert_eq!(catalog.get(0x9f).unwrap().mnemonic, "SWAP16");
        assert_eq!(catalog.len(), 3 + 64);
    }

    #[test]
    fn test_by_mnemonic() {
        let catalog = catalog_from(SMALL).unwrap();
        assert_eq!(catalog.by_mnemonic("POP").unwrap().id, 0x50);
        assert!(catalog.by_mnemonic("NOSUCH").is_none());
    }

    #[test]
    fn test_malformed_row_is_fatal() {
        let text = "\
id,mnemonic,encoded,removed_from_stack,added_to_stack,immediate_size
0x01,ADD,0x01,two,1,
";
        assert!(matches!(
            catalog_from(text),
            Err(CatalogError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bad_hex_is_fatal() {
        let text = "\
id,mnemonic,encoded,removed_from_stack,added_to_stack,immediate_size
0xzz,ADD,0x01,2,1,
";
        assert!(matches!(catalog_from(text), Err(CatalogError::BadHex { .. })));
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let text = "\
id,mnemonic,encoded,removed_from_stack,added_to_stack,immediate_size
0x01,ADD,0x01,2,1,
0x01,MUL,0x02,2,1,
";
        assert!(matches!(
            catalog_from(text),
            Err(CatalogError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_row_colliding_with_derived_variant_is_fatal() {
        let text = "\
id,mnemonic,encoded,removed_from_stack,added_to_stack,immediate_size
0x80,DUP1,0x80,1,2,
";
        assert!(matches!(
            catalog_from(text),
            Err(CatalogError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_selection_scopes_to_catalog() {
        let catalog = catalog_from(SMALL).unwrap();
        let selection =
            Selection::from_reader("id\n0x01\n0x50\n".as_bytes(), "sel.csv", &catalog).unwrap();

        assert!(selection.contains(0x01));
        assert!(!selection.contains(0x15c));
        assert_eq!(selection.iter().count(), 2);
    }

    #[test]
    fn test_selection_unknown_id_is_fatal() {
        let catalog = catalog_from(SMALL).unwrap();
        let result = Selection::from_reader("id\n0xf1\n".as_bytes(), "sel.csv", &catalog);

        assert!(matches!(
            result,
            Err(CatalogError::UnknownSelectionId { id: 0xf1, .. })
        ));
    }
}
