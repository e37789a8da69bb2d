use csv::ReaderBuilder;

/// Splits delimited text into rows of string fields.
///
/// Quoted fields may contain the delimiter, line breaks and doubled quotes;
/// both CRLF and LF terminators are accepted and a trailing blank line is
/// dropped. Rows may have any width. Malformed quoting never aborts the
/// parse: stray quotes are taken literally and an unreadable row is skipped.
pub fn parse(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .into_records()
        .filter_map(|record| record.ok())
        .map(|record| record.iter().map(str::to_string).collect())
        .collect()
}
