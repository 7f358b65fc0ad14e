use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid page number: {0}")]
    InvalidPageNumber(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Page offset overflows for page {page_number} of size {page_size}")]
    OffsetOverflow { page_number: i64, page_size: i64 },
}
