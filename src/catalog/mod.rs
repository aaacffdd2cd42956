//! Master catalog tables: reading uploads, sniffing columns, writing output.

mod reader;
mod record;
mod writer;

pub use reader::{decode_table, parse_table, read_table, read_table_file};
pub use record::{CatalogTable, ColumnMap, RawProductRecord};
pub(crate) use record::SECTION_LABEL;
pub use writer::write_table;
