//! Decoder for compiled (`.mo`) message catalogs.
//!
//! Layout, all fields 32-bit in the byte order announced by the magic number:
//!
//! ```text
//! 0   magic            0x950412de
//! 4   revision         0
//! 8   N                number of string pairs
//! 12  O                offset of the original string table
//! 16  T                offset of the translated string table
//! 20  S, H             hash table size and offset (not used here)
//! O   N x (length, offset) descriptors of original strings
//! T   N x (length, offset) descriptors of translated strings
//! ```
//!
//! Pair 0 maps the empty string to the metadata header.

use std::borrow::Cow;

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::catalog::{Catalog, MessageKey};
use crate::error::{FormatError, FormatResult};
use crate::metadata::Metadata;
use crate::plural::{DEFAULT_PLURAL_FORMS, PluralRule};

pub const MAGIC: u32 = 0x950412de;
const MAGIC_SWAPPED: u32 = 0xde120495;
pub const CONTEXT_SEPARATOR: u8 = 0x04;
pub const FORM_SEPARATOR: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

pub struct Parser<'a> {
    source: &'a [u8],
    order: ByteOrder,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Parser {
            source,
            order: ByteOrder::Little,
        }
    }

    pub fn parse(&mut self) -> FormatResult<Catalog> {
        self.order = self.detect_byte_order()?;

        let revision = self.read_u32(4, "header")?;
        if revision != 0 {
            return Err(FormatError::UnsupportedRevision(revision));
        }
        let count = self.read_u32(8, "header")? as usize;
        let originals = self.read_u32(12, "header")? as usize;
        let translations = self.read_u32(16, "header")? as usize;

        let mut first = 0;
        let mut metadata = Metadata::default();
        if count > 0 && self.string_at(originals, 0, "original string table")?.is_empty() {
            let header = self.string_at(translations, 0, "translated string table")?;
            metadata = Metadata::parse(&String::from_utf8_lossy(header));
            first = 1;
        }

        let encoding = metadata.encoding();
        let declared = metadata.plural_forms().unwrap_or(DEFAULT_PLURAL_FORMS);
        let (plural_forms, rule) = match PluralRule::compile(declared) {
            Ok(rule) => (declared, rule),
            Err(e) => {
                warn!(header = %declared, error = %e, "malformed plural forms header, using default rule");
                (DEFAULT_PLURAL_FORMS, PluralRule::default())
            }
        };
        debug!(
            charset = encoding.name(),
            plural_forms = %plural_forms,
            pairs = count,
            "parsing catalog"
        );

        let mut catalog = Catalog::with_header(plural_forms.to_string(), rule.count(), encoding.name());
        for index in first..count {
            let original = self.string_at(originals, index, "original string table")?;
            if original.is_empty() {
                // A second header block carries nothing addressable.
                continue;
            }
            let translation = self.string_at(translations, index, "translated string table")?;
            let (key, forms) = decode_pair(encoding, index, original, translation)?;
            catalog.insert(key, forms);
        }

        Ok(catalog)
    }

    fn detect_byte_order(&self) -> FormatResult<ByteOrder> {
        let bytes = self.slice(0, 4, "header")?;
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        match magic {
            MAGIC => Ok(ByteOrder::Little),
            MAGIC_SWAPPED => Ok(ByteOrder::Big),
            other => Err(FormatError::BadMagic(other)),
        }
    }

    fn slice(&self, offset: usize, length: usize, section: &'static str) -> FormatResult<&'a [u8]> {
        offset
            .checked_add(length)
            .and_then(|end| self.source.get(offset..end))
            .ok_or(FormatError::TruncatedTable { section, offset })
    }

    fn read_u32(&self, offset: usize, section: &'static str) -> FormatResult<u32> {
        let bytes = self.slice(offset, 4, section)?;
        let bytes = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Raw bytes of the string described by descriptor `index` of the table at `table`.
    fn string_at(&self, table: usize, index: usize, section: &'static str) -> FormatResult<&'a [u8]> {
        let descriptor = index
            .checked_mul(8)
            .and_then(|relative| relative.checked_add(table))
            .ok_or(FormatError::TruncatedTable {
                section,
                offset: table,
            })?;
        let length = self.read_u32(descriptor, section)? as usize;
        let offset = self.read_u32(descriptor + 4, section)? as usize;
        self.slice(offset, length, "string data")
    }
}

/// Parse one catalog file's bytes.
pub fn parse(bytes: &[u8]) -> FormatResult<Catalog> {
    Parser::new(bytes).parse()
}

fn decode<'b>(encoding: &'static Encoding, index: usize, bytes: &'b [u8]) -> FormatResult<Cow<'b, str>> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(FormatError::BadEncoding {
            index,
            charset: encoding.name(),
        })
}

/// Split an original/translation pair into its key and translated forms.
///
/// The original is `[context 0x04] id [0x00 plural-id]`; the plural source
/// form only marks the entry as plural-capable and is dropped.
fn decode_pair(
    encoding: &'static Encoding,
    index: usize,
    original: &[u8],
    translation: &[u8],
) -> FormatResult<(MessageKey, Vec<String>)> {
    let (context, rest) = match original.iter().position(|&b| b == CONTEXT_SEPARATOR) {
        Some(separator) => (&original[..separator], &original[separator + 1..]),
        None => (&original[..0], original),
    };
    let id = match rest.iter().position(|&b| b == FORM_SEPARATOR) {
        Some(separator) => &rest[..separator],
        None => rest,
    };

    let key = MessageKey {
        context: decode(encoding, index, context)?.into_owned(),
        id: decode(encoding, index, id)?.into_owned(),
    };
    let forms = translation
        .split(|&b| b == FORM_SEPARATOR)
        .map(|form| decode(encoding, index, form).map(Cow::into_owned))
        .collect::<FormatResult<Vec<_>>>()?;

    Ok((key, forms))
}
