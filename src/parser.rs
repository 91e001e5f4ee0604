use crate::error::GtfError;
use crate::feature::Strand;

/// One parsed feature line, still holding borrowed slices into the
/// original line; interning into an index's tables is the caller's job.
pub struct ParsedLine<'a> {
    pub reference: &'a str,
    pub feature_type: &'a str,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub gene_id: Option<&'a str>,
    pub transcript_id: Option<&'a str>,
    pub gene_type: Option<&'a str>,
}

/// Parses one feature line.
///
/// Returns `Ok(None)` for comment lines, blank lines, and lines missing a
/// required positional field (silently dropped per the input contract).
/// Returns `Err(GtfError::MalformedNumber)` when `start`/`end` are present
/// but not parseable decimals; the caller decides whether to propagate or
/// to skip-and-count (the ingestion loop does the latter).
pub fn parse_line(line_no: u64, line: &str) -> Result<Option<ParsedLine<'_>>, GtfError> {
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split('\t');
    let Some(reference) = fields.next().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let Some(_source) = fields.next() else {
        return Ok(None);
    };
    let Some(feature_type) = fields.next().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let Some(start_field) = fields.next() else {
        return Ok(None);
    };
    let Some(end_field) = fields.next() else {
        return Ok(None);
    };
    let Some(_score) = fields.next() else {
        return Ok(None);
    };
    let Some(strand_field) = fields.next() else {
        return Ok(None);
    };
    let Some(_frame) = fields.next() else {
        return Ok(None);
    };
    let attributes = fields.next().unwrap_or("");

    let start: u32 = start_field
        .trim()
        .parse()
        .map_err(|_| GtfError::MalformedNumber {
            line: line_no,
            field: "start",
            text: start_field.to_string(),
        })?;
    let end: u32 = end_field
        .trim()
        .parse()
        .map_err(|_| GtfError::MalformedNumber {
            line: line_no,
            field: "end",
            text: end_field.to_string(),
        })?;
    let strand = Strand::from_field(strand_field);

    let (mut gene_id, mut transcript_id, mut gene_type) = (None, None, None);
    let mut tokens = attributes.split_whitespace();
    while let Some(key) = tokens.next() {
        let Some(raw_value) = tokens.next() else {
            break;
        };
        let value = strip_attribute_value(raw_value);
        match key {
            "gene_id" => gene_id = Some(value),
            "gene_type" => gene_type = Some(value),
            "transcript_id" => transcript_id = Some(value),
            _ => {}
        }
    }

    Ok(Some(ParsedLine {
        reference,
        feature_type,
        start,
        end,
        strand,
        gene_id,
        transcript_id,
        gene_type,
    }))
}

/// Strips one trailing `;` and then one surrounding pair of `"` quotes.
fn strip_attribute_value(token: &str) -> &str {
    let stripped_semicolon = token.strip_suffix(';').unwrap_or(token);
    stripped_semicolon
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(stripped_semicolon)
}
