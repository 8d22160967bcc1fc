//! Case table as CSV (RFC 4180, CRLF line endings)

use crate::analysis::PersistentCase;
use crate::error::Result;

use super::TIMESTAMP_FORMAT;

const HEADER: [&str; 7] = [
    "aggressor",
    "victim",
    "hostile_count",
    "first_ts",
    "last_ts",
    "span_days",
    "severity_score",
];

pub fn render_cases(cases: &[PersistentCase]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(vec![]);
    writer.write_record(HEADER)?;

    for case in cases {
        writer.write_record([
            case.aggressor_id.clone(),
            case.victim_id.clone(),
            case.hostile_count.to_string(),
            case.first_ts.format(TIMESTAMP_FORMAT).to_string(),
            case.last_ts.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", case.span_days),
            format!("{:.6}", case.severity_score),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}
