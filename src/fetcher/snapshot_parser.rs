//! Daily snapshot parser
//!
//! Converts one day's XML document into [`CurrencyRecord`]s. The document root
//! holds one element per currency, each with children in a fixed order:
//!
//! ```text
//! <ValCurs Date="02.01.2023" name="Foreign Currency Market">
//!     <Valute ID="R01235">
//!         <NumCode>840</NumCode>          <!-- 0: unused identifier -->
//!         <CharCode>USD</CharCode>        <!-- 1: display name -->
//!         <Nominal>1</Nominal>            <!-- 2: unit count -->
//!         <Name>US Dollar</Name>          <!-- 3: currency code (record key) -->
//!         <Value>70,3375</Value>          <!-- 4: rate, comma decimal separator -->
//!     </Valute>
//! </ValCurs>
//! ```
//!
//! Fields are read BY POSITION, not by tag name: child 1 is the display name,
//! child 3 the currency code and child 4 the rate. On the live feed this means
//! records are keyed by the English name with the letter code shown alongside.
//! The upstream schema is not documented beyond this order. If the feed ever
//! reorders or inserts children the parser will read the wrong fields (or fail
//! with a parse error) rather than adapt; keep it that way unless the feed
//! contract is confirmed.
//!
//! The payload is decoded with the charset named in the XML declaration (the
//! feed declares `windows-1251`), falling back to UTF-8.

use crate::fetcher::{FetcherError, FetcherResult};
use crate::window::format_date;
use crate::{CalendarDate, CurrencyRecord};
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node};
use std::borrow::Cow;

/// Child position of the display name inside a currency element
pub const NAME_INDEX: usize = 1;
/// Child position of the unit count inside a currency element
pub const NOMINAL_INDEX: usize = 2;
/// Child position of the currency code inside a currency element
pub const CODE_INDEX: usize = 3;
/// Child position of the rate inside a currency element
pub const RATE_INDEX: usize = 4;

/// Stateless parser for daily rate snapshots
pub struct SnapshotParser;

impl SnapshotParser {
    /// Parse one day's snapshot document
    ///
    /// # Arguments
    /// * `date` - Day the snapshot was requested for; stamped on every record
    /// * `payload` - Raw response body
    ///
    /// # Errors
    /// - `FetcherError::MalformedDocument` if the payload is not well-formed XML
    /// - `FetcherError::Parse` if a currency element lacks a required child or
    ///   carries a rate that is not a positive number
    pub fn parse(date: CalendarDate, payload: &[u8]) -> FetcherResult<Vec<CurrencyRecord>> {
        let decoded = decode(payload);
        // The text is decoded already; the declared encoding no longer applies
        let text = match decoded.strip_prefix("<?xml") {
            Some(rest) => rest.split_once("?>").map_or(&*decoded, |(_, body)| body),
            None => &*decoded,
        };

        let document = Document::parse(text).map_err(|e| {
            FetcherError::MalformedDocument(format!("snapshot for {}: {e}", format_date(date)))
        })?;

        document
            .root_element()
            .children()
            .filter(Node::is_element)
            .enumerate()
            .map(|(position, currency)| Self::parse_currency(date, position, currency))
            .collect()
    }

    fn parse_currency(
        date: CalendarDate,
        position: usize,
        currency: Node<'_, '_>,
    ) -> FetcherResult<CurrencyRecord> {
        let fields: Vec<Node<'_, '_>> = currency.children().filter(Node::is_element).collect();

        let field = |index: usize, name: &str| {
            fields.get(index).copied().ok_or_else(|| {
                FetcherError::Parse(format!(
                    "currency #{position} on {}: missing {name} (child {index}), found {} children",
                    format_date(date),
                    fields.len()
                ))
            })
        };

        let display_name = text_of(field(NAME_INDEX, "display name")?).to_string();

        let code = text_of(field(CODE_INDEX, "currency code")?).to_string();

        // Informational only; a missing or odd unit count never fails the snapshot
        let nominal = fields
            .get(NOMINAL_INDEX)
            .and_then(|node| text_of(*node).parse::<u32>().ok());

        let rate_text = text_of(field(RATE_INDEX, "rate")?);
        let rate = Self::parse_rate(rate_text).map_err(|e| {
            FetcherError::Parse(format!("{code} on {}: {e}", format_date(date)))
        })?;

        let record = CurrencyRecord {
            code,
            display_name,
            nominal,
            rate,
            observed_date: date,
        };

        record.validate().map_err(|e| {
            FetcherError::Parse(format!("currency #{position} on {}: {e}", format_date(date)))
        })?;

        Ok(record)
    }

    /// Parse a decimal rate written with a comma separator (e.g. "12,3456")
    pub fn parse_rate(raw: &str) -> Result<f64, String> {
        let normalized = raw.trim().replace(',', ".");

        let rate: f64 = normalized
            .parse()
            .map_err(|e| format!("failed to parse rate {raw:?}: {e}"))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(format!("rate must be a positive number, got {raw:?}"));
        }

        Ok(rate)
    }
}

/// Decode with the encoding named in the XML declaration, UTF-8 otherwise.
///
/// A byte order mark takes precedence over the declaration and is removed.
fn decode(payload: &[u8]) -> Cow<'_, str> {
    let encoding = declared_encoding(payload).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(payload);
    text
}

fn declared_encoding(payload: &[u8]) -> Option<&'static Encoding> {
    let prolog = payload.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(payload);
    if !prolog.starts_with(b"<?xml") {
        return None;
    }

    let end = prolog.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&prolog[..end]).ok()?;
    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = rest[1..].split(quote).next()?;
    Encoding::for_label(label.trim().as_bytes())
}

fn text_of<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or_default()
}
