//! The KVF operations themselves: `validate`, `get_description`, the
//! typed readers, `create_default`, and the temp-file-then-rename
//! `rewrite` that makes schema migration atomic against power loss,
//! grounded on `original_source/Kvf.c`'s `KvfValidate`/`KvfRewrite`/
//! `KvfFindByKey` family.

use crate::codec::{decode_entry, decode_header, encode_entry, encode_header, Cursor, DecodedEntry};
use crate::schema::{Schema, SchemaEntry, ValueSpec, VarType};
use crate::value::KvfValue;
use fs::FsWrapper;
use kernel::errorcode::ErrorCode;
use kernel::hil::filesystem::{Filesystem, FsError, OpenMode};
use kernel::sync::NamedMutex;

fn map_fs_err(err: FsError) -> ErrorCode {
    err.into()
}

fn read_all(handle: &mut fs::FileHandle) -> Result<Vec<u8>, ErrorCode> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = handle.read(&mut chunk).map_err(map_fs_err)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf)
}

fn write_all(handle: &mut fs::FileHandle, data: &[u8]) -> Result<(), ErrorCode> {
    let mut written = 0;
    while written < data.len() {
        let n = handle.write(&data[written..]).map_err(map_fs_err)?;
        if n == 0 {
            return Err(ErrorCode::FILESYSTEM);
        }
        written += n;
    }
    Ok(())
}

fn default_value(spec: &ValueSpec) -> KvfValue {
    match spec {
        ValueSpec::Bool { default } => KvfValue::Bool(*default),
        ValueSpec::Int8u { default, .. } => KvfValue::Int8u(*default),
        ValueSpec::Int8s { default, .. } => KvfValue::Int8s(*default),
        ValueSpec::Int16u { default, .. } => KvfValue::Int16u(*default),
        ValueSpec::Int16s { default, .. } => KvfValue::Int16s(*default),
        ValueSpec::Int32u { default, .. } => KvfValue::Int32u(*default),
        ValueSpec::Int32s { default, .. } => KvfValue::Int32s(*default),
        ValueSpec::Fp32 { default, .. } => KvfValue::Fp32(*default),
        ValueSpec::Str { default } => KvfValue::Str(default.to_string()),
        ValueSpec::Enum { default, .. } => KvfValue::Enum(*default),
    }
}

fn spec_matches_decoded(spec: &ValueSpec, decoded: &DecodedEntry) -> bool {
    match spec {
        ValueSpec::Bool { default } => decoded.default == KvfValue::Bool(*default),
        ValueSpec::Int8u { default, min, max } => {
            decoded.default == KvfValue::Int8u(*default)
                && decoded.min == Some(KvfValue::Int8u(*min))
                && decoded.max == Some(KvfValue::Int8u(*max))
        }
        ValueSpec::Int8s { default, min, max } => {
            decoded.default == KvfValue::Int8s(*default)
                && decoded.min == Some(KvfValue::Int8s(*min))
                && decoded.max == Some(KvfValue::Int8s(*max))
        }
        ValueSpec::Int16u { default, min, max } => {
            decoded.default == KvfValue::Int16u(*default)
                && decoded.min == Some(KvfValue::Int16u(*min))
                && decoded.max == Some(KvfValue::Int16u(*max))
        }
        ValueSpec::Int16s { default, min, max } => {
            decoded.default == KvfValue::Int16s(*default)
                && decoded.min == Some(KvfValue::Int16s(*min))
                && decoded.max == Some(KvfValue::Int16s(*max))
        }
        ValueSpec::Int32u { default, min, max } => {
            decoded.default == KvfValue::Int32u(*default)
                && decoded.min == Some(KvfValue::Int32u(*min))
                && decoded.max == Some(KvfValue::Int32u(*max))
        }
        ValueSpec::Int32s { default, min, max } => {
            decoded.default == KvfValue::Int32s(*default)
                && decoded.min == Some(KvfValue::Int32s(*min))
                && decoded.max == Some(KvfValue::Int32s(*max))
        }
        ValueSpec::Fp32 { default, min, max } => {
            decoded.default == KvfValue::Fp32(*default)
                && decoded.min == Some(KvfValue::Fp32(*min))
                && decoded.max == Some(KvfValue::Fp32(*max))
        }
        ValueSpec::Str { default } => decoded.default == KvfValue::Str(default.to_string()),
        ValueSpec::Enum { default, items } => {
            decoded.default == KvfValue::Enum(*default)
                && decoded.enum_items.len() == items.len()
                && decoded
                    .enum_items
                    .iter()
                    .zip(items.iter())
                    .all(|((name, value), item)| name == item.name && *value == item.value)
        }
    }
}

fn decode_all(buf: &[u8]) -> Result<(String, Vec<DecodedEntry>), ErrorCode> {
    let mut cursor = Cursor::new(buf);
    let header = decode_header(&mut cursor)?;
    let mut entries = Vec::new();
    while cursor.remaining() > 0 {
        entries.push(decode_entry(&mut cursor)?);
    }
    Ok((header.description, entries))
}

fn build_file(schema: &Schema, old_entries: &[DecodedEntry]) -> Vec<u8> {
    let mut out = encode_header(schema.description);
    for entry in schema.entries {
        let current = old_entries
            .iter()
            .find(|d| d.key == entry.key && d.var_type == entry.value.var_type())
            .map(|d| d.current.clone())
            .unwrap_or_else(|| default_value(&entry.value));
        out.extend(encode_entry(entry, &current));
    }
    out
}

/// A KVF store bound to a concrete filesystem backend. `tmp_counter` is
/// process-wide and monotonic (wrapping at 256) so concurrent rewrites on
/// different files never collide on a temp name.
pub struct KvfStore<F: Filesystem> {
    fs: FsWrapper<F>,
    tmp_counter: NamedMutex<u8>,
}

impl<F: Filesystem> KvfStore<F> {
    pub fn new(backend: F, total_bytes: u64) -> KvfStore<F> {
        KvfStore {
            fs: FsWrapper::new(backend, total_bytes),
            tmp_counter: NamedMutex::new("kvf_tmp_counter", 0),
        }
    }

    fn next_tmp_name(&self) -> String {
        let mut guard = self.tmp_counter.lock();
        let name = format!("tmp{}", *guard);
        *guard = guard.wrapping_add(1);
        name
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>, ErrorCode> {
        let mut handle = self.fs.open(path, OpenMode::Read).map_err(map_fs_err)?;
        let buf = read_all(&mut handle)?;
        handle.close().map_err(map_fs_err)?;
        Ok(buf)
    }

    /// Implements the four-step algorithm: missing file -> create default;
    /// description mismatch or any entry shape/default/min/max mismatch ->
    /// rewrite; otherwise the file already matches the schema and nothing
    /// is written.
    pub fn validate(&mut self, schema: &Schema, path: &str) -> Result<(), ErrorCode> {
        let buf = match self.read_file(path) {
            Ok(buf) => buf,
            Err(ErrorCode::FILEDOESNOTEXIST) => return self.create_default(schema, path),
            Err(err) => return Err(err),
        };

        let (description, entries) = match decode_all(&buf) {
            Ok(parsed) => parsed,
            Err(_) => return self.rewrite(schema, path),
        };

        if description != schema.description {
            return self.rewrite(schema, path);
        }
        if entries.len() != schema.entries.len() {
            return self.rewrite(schema, path);
        }
        for (entry, decoded) in schema.entries.iter().zip(entries.iter()) {
            if decoded.key != entry.key
                || decoded.description != entry.description
                || decoded.var_type != entry.value.var_type()
            {
                return self.rewrite(schema, path);
            }
            if !spec_matches_decoded(&entry.value, decoded) {
                return self.rewrite(schema, path);
            }
        }
        Ok(())
    }

    pub fn get_description(&mut self, path: &str) -> Result<String, ErrorCode> {
        let buf = self.read_file(path)?;
        let mut cursor = Cursor::new(&buf);
        let header = decode_header(&mut cursor)?;
        Ok(header.description)
    }

    /// Writes every schema entry with `current == default`, directly (no
    /// temp-file indirection, since there is no prior file to protect
    /// against a partial write clobbering).
    pub fn create_default(&mut self, schema: &Schema, path: &str) -> Result<(), ErrorCode> {
        let bytes = build_file(schema, &[]);
        let mut handle = self
            .fs
            .open(path, OpenMode::WriteTruncate)
            .map_err(map_fs_err)?;
        write_all(&mut handle, &bytes)?;
        handle.close().map_err(map_fs_err)
    }

    /// Writes a schema-shaped file into `tmp<n>`, preserving any value
    /// from `path`'s existing entries whose key and type still match,
    /// then renames the temp file over `path`. The rename is the
    /// power-loss-safe commit point: if it never completes, `path` still
    /// holds its previous, fully-written contents.
    pub fn rewrite(&mut self, schema: &Schema, path: &str) -> Result<(), ErrorCode> {
        let old_entries = match self.read_file(path) {
            Ok(buf) => decode_all(&buf).map(|(_, entries)| entries).unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        let bytes = build_file(schema, &old_entries);
        let tmp_name = self.next_tmp_name();
        let mut handle = self
            .fs
            .open(&tmp_name, OpenMode::WriteTruncate)
            .map_err(map_fs_err)?;
        write_all(&mut handle, &bytes)?;
        handle.close().map_err(map_fs_err)?;
        self.fs.rename(&tmp_name, path).map_err(map_fs_err)
    }

    /// Walks `path` looking for `key` with crc16(key) matching the
    /// stored key hash and `expected_type` matching the stored type tag.
    /// A crc hit with the wrong type returns `KEYTYPEDOESNOTMATCH`
    /// without considering later entries, mirroring `Kvf.c`'s readers
    /// failing closed rather than scanning past a tag mismatch.
    pub fn find_by_key(
        &mut self,
        path: &str,
        key: &str,
        expected_type: VarType,
    ) -> Result<KvfValue, ErrorCode> {
        let buf = self.read_file(path)?;
        let key_crc = kernel::crc::crc16(key.as_bytes());
        let mut cursor = Cursor::new(&buf);
        let _header = decode_header(&mut cursor)?;
        while cursor.remaining() > 0 {
            let decoded = decode_entry(&mut cursor)?;
            if decoded.key_crc == key_crc && decoded.key == key {
                if decoded.var_type != expected_type {
                    return Err(ErrorCode::KEYTYPEDOESNOTMATCH);
                }
                return Ok(decoded.current);
            }
        }
        Err(ErrorCode::KEYDOESNOTEXIST)
    }

    pub fn bool_for_key(&mut self, path: &str, key: &str) -> Result<bool, ErrorCode> {
        match self.find_by_key(path, key, VarType::Bool)? {
            KvfValue::Bool(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int8u_for_key(&mut self, path: &str, key: &str) -> Result<u8, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int8u)? {
            KvfValue::Int8u(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int8s_for_key(&mut self, path: &str, key: &str) -> Result<i8, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int8s)? {
            KvfValue::Int8s(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int16u_for_key(&mut self, path: &str, key: &str) -> Result<u16, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int16u)? {
            KvfValue::Int16u(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int16s_for_key(&mut self, path: &str, key: &str) -> Result<i16, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int16s)? {
            KvfValue::Int16s(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int32u_for_key(&mut self, path: &str, key: &str) -> Result<u32, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int32u)? {
            KvfValue::Int32u(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn int32s_for_key(&mut self, path: &str, key: &str) -> Result<i32, ErrorCode> {
        match self.find_by_key(path, key, VarType::Int32s)? {
            KvfValue::Int32s(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn fp32_for_key(&mut self, path: &str, key: &str) -> Result<f32, ErrorCode> {
        match self.find_by_key(path, key, VarType::Fp32)? {
            KvfValue::Fp32(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn string_for_key(&mut self, path: &str, key: &str) -> Result<String, ErrorCode> {
        match self.find_by_key(path, key, VarType::Str)? {
            KvfValue::Str(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }

    pub fn enum_for_key(&mut self, path: &str, key: &str) -> Result<u32, ErrorCode> {
        match self.find_by_key(path, key, VarType::Enum)? {
            KvfValue::Enum(v) => Ok(v),
            _ => Err(ErrorCode::KEYTYPEDOESNOTMATCH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumItem;
    use kernel::hil::filesystem::File;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Backing = Rc<RefCell<HashMap<String, Vec<u8>>>>;

    /// A file handle backed directly by the shared map, so a write is
    /// visible to the rest of the fake filesystem immediately rather
    /// than needing an explicit flush-on-close step.
    struct MemFile {
        backing: Backing,
        path: String,
        read_pos: usize,
    }

    impl File for MemFile {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
            let files = self.backing.borrow();
            let data = files.get(&self.path).map(Vec::as_slice).unwrap_or(&[]);
            let n = (data.len() - self.read_pos).min(buf.len());
            buf[..n].copy_from_slice(&data[self.read_pos..self.read_pos + n]);
            self.read_pos += n;
            Ok(n)
        }
        fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
            self.backing
                .borrow_mut()
                .entry(self.path.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }
        fn close(self: Box<Self>) -> Result<(), FsError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemFs {
        files: Backing,
    }

    impl Filesystem for MemFs {
        fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn File>, FsError> {
            match mode {
                OpenMode::Read | OpenMode::ReadWrite => {
                    if !self.files.borrow().contains_key(path) {
                        return Err(FsError::NotFound);
                    }
                    Ok(Box::new(MemFile {
                        backing: self.files.clone(),
                        path: path.to_string(),
                        read_pos: 0,
                    }))
                }
                OpenMode::WriteTruncate | OpenMode::Append => {
                    if mode == OpenMode::WriteTruncate {
                        self.files.borrow_mut().insert(path.to_string(), Vec::new());
                    } else {
                        self.files.borrow_mut().entry(path.to_string()).or_default();
                    }
                    Ok(Box::new(MemFile {
                        backing: self.files.clone(),
                        path: path.to_string(),
                        read_pos: 0,
                    }))
                }
            }
        }
        fn delete(&mut self, path: &str) -> Result<(), FsError> {
            self.files.borrow_mut().remove(path);
            Ok(())
        }
        fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError> {
            let data = self
                .files
                .borrow_mut()
                .remove(old_path)
                .ok_or(FsError::NotFound)?;
            self.files.borrow_mut().insert(new_path.to_string(), data);
            Ok(())
        }
        fn free_space_bytes(&self) -> Result<u64, FsError> {
            Ok(1_000_000)
        }
    }

    fn schema_v1() -> Schema {
        static ENTRIES: [SchemaEntry; 2] = [
            SchemaEntry {
                key: "a",
                description: "entry a",
                value: ValueSpec::Int8u {
                    default: 1,
                    min: 0,
                    max: 10,
                },
            },
            SchemaEntry {
                key: "b",
                description: "entry b",
                value: ValueSpec::Int16u {
                    default: 2,
                    min: 0,
                    max: 100,
                },
            },
        ];
        Schema {
            description: "ver1",
            entries: &ENTRIES,
        }
    }

    fn schema_v2() -> Schema {
        static ITEMS: [EnumItem; 1] = [EnumItem { name: "on", value: 1 }];
        static ENTRIES: [SchemaEntry; 3] = [
            SchemaEntry {
                key: "a",
                description: "entry a",
                value: ValueSpec::Int8u {
                    default: 1,
                    min: 0,
                    max: 10,
                },
            },
            SchemaEntry {
                key: "b",
                description: "entry b",
                value: ValueSpec::Int32u {
                    default: 2,
                    min: 0,
                    max: 100,
                },
            },
            SchemaEntry {
                key: "c",
                description: "entry c",
                value: ValueSpec::Enum {
                    default: 0,
                    items: &ITEMS,
                },
            },
        ];
        Schema {
            description: "ver2",
            entries: &ENTRIES,
        }
    }

    fn store_with_backend() -> KvfStore<MemFs> {
        KvfStore::new(MemFs::default(), 1_000_000)
    }

    #[test]
    fn validate_creates_a_default_file_when_missing() {
        let mut store = store_with_backend();
        let schema = schema_v1();
        store.validate(&schema, "cfg.kvf").unwrap();
        assert_eq!(store.int8u_for_key("cfg.kvf", "a").unwrap(), 1);
        assert_eq!(store.int16u_for_key("cfg.kvf", "b").unwrap(), 2);
    }

    #[test]
    fn validate_leaves_an_already_matching_file_untouched() {
        let mut store = store_with_backend();
        let schema = schema_v1();
        store.validate(&schema, "cfg.kvf").unwrap();
        let before = store.read_file("cfg.kvf").unwrap();
        store.validate(&schema, "cfg.kvf").unwrap();
        let after = store.read_file("cfg.kvf").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn schema_migration_preserves_matching_keys_and_defaults_new_ones() {
        let schema1 = schema_v1();
        let mut raw = encode_header(schema1.description);
        raw.extend(encode_entry(&schema1.entries[0], &KvfValue::Int8u(7)));
        raw.extend(encode_entry(&schema1.entries[1], &KvfValue::Int16u(2)));

        let mut files = HashMap::new();
        files.insert("cfg.kvf".to_string(), raw);
        let backend = MemFs {
            files: Rc::new(RefCell::new(files)),
        };
        let mut store = KvfStore::new(backend, 1_000_000);

        let schema2 = schema_v2();
        store.validate(&schema2, "cfg.kvf").unwrap();

        assert_eq!(store.get_description("cfg.kvf").unwrap(), "ver2");
        assert_eq!(store.int8u_for_key("cfg.kvf", "a").unwrap(), 7);
        assert_eq!(store.int32u_for_key("cfg.kvf", "b").unwrap(), 2);
        assert_eq!(store.enum_for_key("cfg.kvf", "c").unwrap(), 0);
    }

    #[test]
    fn find_by_key_reports_missing_and_mistyped_keys() {
        let mut store = store_with_backend();
        store.validate(&schema_v1(), "cfg.kvf").unwrap();
        assert_eq!(
            store.find_by_key("cfg.kvf", "nope", VarType::Bool),
            Err(ErrorCode::KEYDOESNOTEXIST)
        );
        assert_eq!(
            store.find_by_key("cfg.kvf", "a", VarType::Bool),
            Err(ErrorCode::KEYTYPEDOESNOTMATCH)
        );
    }

    #[test]
    fn reading_a_missing_file_reports_file_does_not_exist() {
        let mut store = store_with_backend();
        assert_eq!(
            store.get_description("missing.kvf"),
            Err(ErrorCode::FILEDOESNOTEXIST)
        );
    }
}
