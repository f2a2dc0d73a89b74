//! Catalog encoder used by the tests to produce binary catalog files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::MessageKey;
use crate::parser::{CONTEXT_SEPARATOR, FORM_SEPARATOR, MAGIC};

const DEFAULT_HEADER: &str = "Content-Type: text/plain; charset=UTF-8\n\
    Plural-Forms: nplurals=2; plural=(n != 1);\n";

pub struct CatalogBuilder {
    header: Option<String>,
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
    entries: Vec<(MessageKey, Vec<String>)>,
    big_endian: bool,
    revision: u32,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        CatalogBuilder {
            header: Some(DEFAULT_HEADER.to_string()),
            pairs: Vec::new(),
            entries: Vec::new(),
            big_endian: false,
            revision: 0,
        }
    }

    pub fn header(mut self, header: &str) -> Self {
        self.header = Some(header.to_string());
        self
    }

    pub fn no_header(mut self) -> Self {
        self.header = None;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    pub fn message(self, id: &str, translation: &str) -> Self {
        self.context_message("", id, translation)
    }

    pub fn context_message(mut self, context: &str, id: &str, translation: &str) -> Self {
        self.pairs
            .push((original(context, id, None), translation.as_bytes().to_vec()));
        self.entries
            .push((MessageKey::new(context, id), vec![translation.to_string()]));
        self
    }

    pub fn plural(self, id: &str, plural_id: &str, forms: &[&str]) -> Self {
        self.context_plural("", id, plural_id, forms)
    }

    pub fn context_plural(mut self, context: &str, id: &str, plural_id: &str, forms: &[&str]) -> Self {
        let translation = forms.join("\0").into_bytes();
        self.pairs
            .push((original(context, id, Some(plural_id)), translation));
        self.entries.push((
            MessageKey::new(context, id),
            forms.iter().map(|form| form.to_string()).collect(),
        ));
        self
    }

    /// Add a pair with arbitrary bytes, bypassing any encoding.
    pub fn raw(mut self, original: &[u8], translation: &[u8]) -> Self {
        self.pairs.push((original.to_vec(), translation.to_vec()));
        self
    }

    /// Entries added through the typed methods, in insertion order.
    pub fn entries(&self) -> Vec<(MessageKey, Vec<String>)> {
        self.entries.clone()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pairs: Vec<(&[u8], &[u8])> = Vec::new();
        if let Some(header) = &self.header {
            pairs.push((b"", header.as_bytes()));
        }
        pairs.extend(self.pairs.iter().map(|(o, t)| (o.as_slice(), t.as_slice())));

        let count = pairs.len() as u32;
        let originals = 28u32;
        let translations = originals + 8 * count;
        let mut data_offset = translations + 8 * count;

        let mut header = Vec::new();
        let mut original_table = Vec::new();
        let mut translation_table = Vec::new();
        let mut data = Vec::new();

        for (original, _) in &pairs {
            self.push_u32(&mut original_table, original.len() as u32);
            self.push_u32(&mut original_table, data_offset);
            data.extend_from_slice(original);
            data.push(0);
            data_offset += original.len() as u32 + 1;
        }
        for (_, translation) in &pairs {
            self.push_u32(&mut translation_table, translation.len() as u32);
            self.push_u32(&mut translation_table, data_offset);
            data.extend_from_slice(translation);
            data.push(0);
            data_offset += translation.len() as u32 + 1;
        }

        self.push_u32(&mut header, MAGIC);
        self.push_u32(&mut header, self.revision);
        self.push_u32(&mut header, count);
        self.push_u32(&mut header, originals);
        self.push_u32(&mut header, translations);
        self.push_u32(&mut header, 0);
        self.push_u32(&mut header, translations + 8 * count);

        let mut bytes = header;
        bytes.extend(original_table);
        bytes.extend(translation_table);
        bytes.extend(data);
        bytes
    }

    /// Write the catalog as `<culture><extension>` inside `dir`.
    pub fn write_to(&self, dir: &Path, culture: &str, extension: &str) -> PathBuf {
        let path = dir.join(format!("{}{}", culture, extension));
        fs::write(&path, self.build()).unwrap();
        path
    }

    fn push_u32(&self, out: &mut Vec<u8>, value: u32) {
        if self.big_endian {
            out.extend_from_slice(&value.to_be_bytes());
        } else {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn original(context: &str, id: &str, plural_id: Option<&str>) -> Vec<u8> {
    let mut bytes = Vec::new();
    if !context.is_empty() {
        bytes.extend_from_slice(context.as_bytes());
        bytes.push(CONTEXT_SEPARATOR);
    }
    bytes.extend_from_slice(id.as_bytes());
    if let Some(plural_id) = plural_id {
        bytes.push(FORM_SEPARATOR);
        bytes.extend_from_slice(plural_id.as_bytes());
    }
    bytes
}
