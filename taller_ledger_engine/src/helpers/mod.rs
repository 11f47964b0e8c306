mod doc_number;

pub use doc_number::{document_number, fiscal_number, prefixed_number, SEQUENCE_WIDTH};
