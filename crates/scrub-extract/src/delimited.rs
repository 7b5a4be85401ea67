//! CSV / TSV extraction

use crate::{error::Result, format::DocumentFormat, text::decode_text, ExtractResult, Extractor};
use tracing::debug;

/// Extractor for delimited text uploads.
///
/// Records are parsed and re-emitted as comma-separated CSV so quoting is
/// consistent in the sanitized output and tab-separated uploads keep their
/// columns once tabs are normalized away. Input that does not parse is passed
/// through as plain text.
#[derive(Debug, Clone)]
pub struct DelimitedExtractor {
    delimiter: u8,
}

impl DelimitedExtractor {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn reformat(&self, text: &str) -> Result<(String, usize)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        let mut rows = 0;
        for record in reader.records() {
            writer.write_record(&record?)?;
            rows += 1;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| crate::ExtractError::Io(e.into_error()))?;
        Ok((String::from_utf8_lossy(&bytes).into_owned(), rows))
    }
}

impl Extractor for DelimitedExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::DelimitedText {
            delimiter: self.delimiter,
        }
    }

    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult> {
        let (text, encoding) = decode_text(bytes);

        match self.reformat(&text) {
            Ok((csv_text, rows)) => Ok(ExtractResult::new(csv_text, self.format())
                .with_metadata("encoding", encoding)
                .with_metadata("row_count", rows.to_string())),
            Err(e) => {
                debug!(error = %e, "Delimited parse failed, passing text through");
                Ok(ExtractResult::new(text, self.format())
                    .with_metadata("encoding", encoding)
                    .with_metadata("extraction_method", "plain_text"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_reemitted() {
        let input = b"name,email\nAlice,\"a@example.com\"\nBob,b@example.com\n";
        let result = DelimitedExtractor::new(b',').extract(input).unwrap();
        assert_eq!(
            result.text,
            "name,email\nAlice,a@example.com\nBob,b@example.com\n"
        );
        assert_eq!(result.metadata("row_count"), Some("3"));
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let input = b"a\tb\tc\nd\n";
        let result = DelimitedExtractor::new(b'\t').extract(input).unwrap();
        assert_eq!(result.text, "a,b,c\nd\n");
    }

    #[test]
    fn test_tsv_reemitted_as_csv() {
        let input = b"first name\tcity\nJane Doe\tNew York\nSmith, John\tOslo\n";
        let result = DelimitedExtractor::new(b'\t').extract(input).unwrap();
        assert_eq!(
            result.text,
            "first name,city\nJane Doe,New York\n\"Smith, John\",Oslo\n"
        );
        assert_eq!(result.metadata("row_count"), Some("3"));
    }

    #[test]
    fn test_fields_with_delimiter_stay_quoted() {
        let input = b"\"Smith, John\",42\n";
        let result = DelimitedExtractor::new(b',').extract(input).unwrap();
        assert_eq!(result.text, "\"Smith, John\",42\n");
    }
}
