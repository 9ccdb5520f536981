//! Built-in [`DocumentParser`](crate::DocumentParser) implementations.

mod cdr;
mod csv_table;
mod docx;
mod ooxml;
mod pdf;
mod pptx;
mod text;
mod xlsx;

pub use self::cdr::CdrJsonParser;
pub use self::csv_table::CsvParser;
pub use self::docx::DocxParser;
pub use self::pdf::PdfParser;
pub use self::pptx::PptxParser;
pub use self::text::TextParser;
pub use self::xlsx::XlsxParser;
