//! Rendering of a series into one of the two line formats.
//!
//! ## Block (format A)
//!
//! ```text
//! <header>
//! 0. 3600. 2
//! 483312. 4616501. 1.
//! 484650. 4616489. 0.
//! 3600. 3600. 2
//! ...
//! ```
//!
//! ## Columnar (format B)
//!
//! ```text
//! <header>
//! 2,3
//! 483312,4616501
//! 484650,4616489
//! 0,0.50,0.25
//! 3600,1.10,0.00
//! ...
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use forcing_common::{check_alignment, ExtractedPoint, Shift};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WriterError};
use crate::header::Header;

/// Output layout of a forcing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `t. dt. n` line per step followed by its `x. y. value.` lines.
    #[default]
    #[serde(alias = "a")]
    Block,
    /// Coordinates once, then one comma-separated value row per step.
    #[serde(alias = "b")]
    Columnar,
}

impl OutputFormat {
    /// The header conventionally used with this format.
    pub fn default_header(&self) -> Header {
        match self {
            OutputFormat::Block => Header::Radar,
            OutputFormat::Columnar => Header::Minimal,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "block" => Ok(OutputFormat::Block),
            "b" | "columnar" => Ok(OutputFormat::Columnar),
            _ => Err(WriterError::UnknownFormat(s.to_string())),
        }
    }
}

/// Fixed-point rendering with Python-style names for non-finite values.
fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Render `series` as the full file content.
pub fn render(
    series: &[Vec<ExtractedPoint>],
    header: &str,
    shift: Shift,
    dt: u64,
    format: OutputFormat,
) -> Result<String> {
    if series.is_empty() {
        return Err(WriterError::EmptySeries);
    }
    let mut out = String::from(header);
    match format {
        OutputFormat::Block => render_block(&mut out, series, shift, dt),
        OutputFormat::Columnar => {
            check_alignment(series)?;
            render_columnar(&mut out, series, shift, dt);
        }
    }
    Ok(out)
}

fn render_block(out: &mut String, series: &[Vec<ExtractedPoint>], shift: Shift, dt: u64) {
    for (idx, step) in series.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}. {}. {}", idx as u64 * dt, dt, step.len());
        for point in step {
            let (x, y) = shift.apply(point.x, point.y);
            let _ = writeln!(
                out,
                "{}. {}. {}.",
                fixed(x, 0),
                fixed(y, 0),
                fixed(point.value, 0)
            );
        }
    }
}

fn render_columnar(out: &mut String, series: &[Vec<ExtractedPoint>], shift: Shift, dt: u64) {
    let first = &series[0];
    let _ = writeln!(out, "{},{}", first.len(), series.len());
    for point in first {
        let (x, y) = shift.apply(point.x, point.y);
        let _ = writeln!(out, "{},{}", fixed(x, 0), fixed(y, 0));
    }
    for (idx, step) in series.iter().enumerate() {
        let values: Vec<String> = step.iter().map(|p| fixed(p.value, 2)).collect();
        let _ = writeln!(out, "{},{}", idx as u64 * dt, values.join(","));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MINIMAL_HEADER;

    fn single() -> Vec<Vec<ExtractedPoint>> {
        vec![vec![ExtractedPoint::new(5.4, 100.2, 200.7)]]
    }

    #[test]
    fn test_block_single_point() {
        let text = render(&single(), "#\n", Shift::default(), 3600, OutputFormat::Block).unwrap();
        assert_eq!(text, "#\n0. 3600. 1\n100. 201. 5.\n");
    }

    #[test]
    fn test_block_time_column_is_scaled_by_dt() {
        let series = vec![single()[0].clone(), single()[0].clone(), Vec::new()];
        let text = render(&series, "", Shift::default(), 900, OutputFormat::Block).unwrap();
        assert_eq!(
            text,
            "0. 900. 1\n100. 201. 5.\n900. 900. 1\n100. 201. 5.\n1800. 900. 0\n"
        );
    }

    #[test]
    fn test_columnar_shift_and_decimals() {
        let series = vec![
            vec![ExtractedPoint::new(5.4, 100.2, 200.7)],
            vec![ExtractedPoint::new(6.1, 100.2, 200.7)],
        ];
        let text = render(
            &series,
            MINIMAL_HEADER,
            Shift::new(100.0, 200.0),
            3600,
            OutputFormat::Columnar,
        )
        .unwrap();
        // 0.2 rounds down and 0.7 rounds up after the shift
        assert_eq!(text, "\n#\n1,2\n0,1\n0,5.40\n3600,6.10\n");
    }

    #[test]
    fn test_columnar_shift_on_whole_coordinates() {
        let series = vec![
            vec![ExtractedPoint::new(5.4, 101.0, 201.0)],
            vec![ExtractedPoint::new(6.1, 101.0, 201.0)],
        ];
        let text = render(&series, "", Shift::new(100.0, 200.0), 3600, OutputFormat::Columnar)
            .unwrap();
        assert_eq!(text, "1,2\n1,1\n0,5.40\n3600,6.10\n");
    }

    #[test]
    fn test_columnar_rejects_misaligned_steps() {
        let series = vec![
            vec![ExtractedPoint::new(1.0, 0.0, 0.0), ExtractedPoint::new(1.0, 1.0, 0.0)],
            vec![ExtractedPoint::new(1.0, 0.0, 0.0)],
        ];
        let err = render(&series, "", Shift::default(), 3600, OutputFormat::Columnar);
        assert!(matches!(err, Err(WriterError::MisalignedSeries(_))));

        let moved = vec![
            vec![ExtractedPoint::new(1.0, 0.0, 0.0)],
            vec![ExtractedPoint::new(1.0, 5.0, 0.0)],
        ];
        let err = render(&moved, "", Shift::default(), 3600, OutputFormat::Columnar);
        assert!(matches!(err, Err(WriterError::MisalignedSeries(_))));
    }

    #[test]
    fn test_empty_series() {
        for format in [OutputFormat::Block, OutputFormat::Columnar] {
            assert!(matches!(
                render(&[], "", Shift::default(), 3600, format),
                Err(WriterError::EmptySeries)
            ));
        }
    }

    #[test]
    fn test_rounding_and_non_finite() {
        assert_eq!(fixed(2.6, 0), "3");
        assert_eq!(fixed(0.126, 2), "0.13");
        assert_eq!(fixed(f64::NAN, 2), "nan");
        assert_eq!(fixed(f64::NEG_INFINITY, 0), "-inf");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("A".parse::<OutputFormat>().unwrap(), OutputFormat::Block);
        assert_eq!("columnar".parse::<OutputFormat>().unwrap(), OutputFormat::Columnar);
        assert!("c".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Columnar.default_header(), Header::Minimal);
    }
}
