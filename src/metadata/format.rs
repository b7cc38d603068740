//! Byte layout of a metadata blob.
//!
//! ```text
//! +----------------+----------------+--------+--------+-----+-----------+------------+
//! | format version | module version | header | types  | ... | type refs | names      |
//! |   12 bytes     |   12 bytes     | 40 B   | 19 B/r |     | bytes     | utf-8      |
//! +----------------+----------------+--------+--------+-----+-----------+------------+
//! ```
//!
//! Every integer is a little-endian `u32` unless noted. Records refer to
//! the type-reference stream and the name blob with `(index, length)`
//! slices, and to other tables with `(index, count)` slices.

use std::fmt;

use crate::{
    ast::ast::Privacy,
    errors::errors::{Error, ErrorImpl},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const SIZE: usize = 12;

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version { major, minor, patch }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        write_u32(out, self.major);
        write_u32(out, self.minor);
        write_u32(out, self.patch);
    }

    pub fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(Version::new(reader.u32()?, reader.u32()?, reader.u32()?))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version of the layout described in this module.
pub const FORMAT_VERSION: Version = Version::new(1, 0, 0);

/// One entry of the type-reference stream.
///
/// `Type` and `FuncType` are followed by a `u32` index into their table;
/// `Pointer`, `Reference` and `Array` are followed by the type they wrap.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Type = 0,
    FuncType,
    Pointer,
    Void,
    Bool,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Reference,
    Array,
}

impl TypeTag {
    const ALL: [TypeTag; 18] = [
        TypeTag::Type,
        TypeTag::FuncType,
        TypeTag::Pointer,
        TypeTag::Void,
        TypeTag::Bool,
        TypeTag::UInt8,
        TypeTag::UInt16,
        TypeTag::UInt32,
        TypeTag::UInt64,
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Float16,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::Reference,
        TypeTag::Array,
    ];

    pub fn from_u8(tag: u8) -> Result<Self, Error> {
        TypeTag::ALL
            .get(tag as usize)
            .copied()
            .ok_or_else(|| Error::unpositioned(ErrorImpl::UnknownTypeTag { tag }))
    }

    pub fn int(width: u32, signed: bool) -> Option<Self> {
        let tag = match (width, signed) {
            (8, false) => TypeTag::UInt8,
            (16, false) => TypeTag::UInt16,
            (32, false) => TypeTag::UInt32,
            (64, false) => TypeTag::UInt64,
            (8, true) => TypeTag::Int8,
            (16, true) => TypeTag::Int16,
            (32, true) => TypeTag::Int32,
            (64, true) => TypeTag::Int64,
            _ => return None,
        };

        Some(tag)
    }

    pub fn float(width: u32) -> Option<Self> {
        match width {
            16 => Some(TypeTag::Float16),
            32 => Some(TypeTag::Float32),
            64 => Some(TypeTag::Float64),
            _ => None,
        }
    }
}

/// Start offsets of each table, then the size of the whole blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub types: u32,
    pub fields: u32,
    pub functions: u32,
    pub globals: u32,
    pub func_types: u32,
    pub params: u32,
    pub param_types: u32,
    pub type_refs: u32,
    pub names: u32,
    pub size: u32,
}

impl Header {
    pub const SIZE: usize = 40;

    fn offsets(&self) -> [u32; 10] {
        [
            self.types,
            self.fields,
            self.functions,
            self.globals,
            self.func_types,
            self.params,
            self.param_types,
            self.type_refs,
            self.names,
            self.size,
        ]
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        for offset in self.offsets() {
            write_u32(out, offset);
        }
    }

    pub fn read(reader: &mut Reader) -> Result<Self, Error> {
        let header = Header {
            types: reader.u32()?,
            fields: reader.u32()?,
            functions: reader.u32()?,
            globals: reader.u32()?,
            func_types: reader.u32()?,
            params: reader.u32()?,
            param_types: reader.u32()?,
            type_refs: reader.u32()?,
            names: reader.u32()?,
            size: reader.u32()?,
        };

        let offsets = header.offsets();
        if offsets[0] as usize != 2 * Version::SIZE + Header::SIZE
            || offsets.windows(2).any(|pair| pair[0] > pair[1])
        {
            return Err(corrupt("table offsets are out of order"));
        }

        Ok(header)
    }

    /// The byte range of table `index` in header order.
    pub fn table(&self, index: usize) -> std::ops::Range<usize> {
        let offsets = self.offsets();
        offsets[index] as usize..offsets[index + 1] as usize
    }
}

/// A run of entries in another table or byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub index: u32,
    pub length: u32,
}

impl Slice {
    pub fn new(index: usize, length: usize) -> Self {
        Slice {
            index: index as u32,
            length: length as u32,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        write_u32(out, self.index);
        write_u32(out, self.length);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(Slice {
            index: reader.u32()?,
            length: reader.u32()?,
        })
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.index as usize..self.index as usize + self.length as usize
    }
}

/// A fixed-size entry of one of the tables.
pub trait Record: Sized {
    const SIZE: usize;
    const TABLE: &'static str;

    fn write(&self, out: &mut Vec<u8>);
    fn read(reader: &mut Reader) -> Result<Self, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub is_foreign: bool,
    pub is_union: bool,
    pub privacy: Privacy,
    pub name: Slice,
    pub fields: Slice,
}

impl Record for TypeRecord {
    const SIZE: usize = 19;
    const TABLE: &'static str = "type";

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.is_foreign as u8);
        out.push(self.is_union as u8);
        write_privacy(out, self.privacy);
        self.name.write(out);
        self.fields.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(TypeRecord {
            is_foreign: reader.bool()?,
            is_union: reader.bool()?,
            privacy: reader.privacy()?,
            name: Slice::read(reader)?,
            fields: Slice::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    pub privacy: Privacy,
    pub name: Slice,
    pub type_ref: Slice,
}

impl Record for FieldRecord {
    const SIZE: usize = 17;
    const TABLE: &'static str = "field";

    fn write(&self, out: &mut Vec<u8>) {
        write_privacy(out, self.privacy);
        self.name.write(out);
        self.type_ref.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(FieldRecord {
            privacy: reader.privacy()?,
            name: Slice::read(reader)?,
            type_ref: Slice::read(reader)?,
        })
    }
}

pub const FUNCTION_STATIC: u8 = 1;
pub const FUNCTION_EXPORT: u8 = 1 << 1;

/// A function or method. `type_ref` holds a single `FuncType` entry
/// describing the declared parameters, without `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub privacy: Privacy,
    pub is_method: bool,
    pub flags: u8,
    pub name: Slice,
    pub type_ref: Slice,
    pub params: Slice,
}

impl Record for FunctionRecord {
    const SIZE: usize = 27;
    const TABLE: &'static str = "function";

    fn write(&self, out: &mut Vec<u8>) {
        write_privacy(out, self.privacy);
        out.push(self.is_method as u8);
        out.push(self.flags);
        self.name.write(out);
        self.type_ref.write(out);
        self.params.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(FunctionRecord {
            privacy: reader.privacy()?,
            is_method: reader.bool()?,
            flags: reader.u8()?,
            name: Slice::read(reader)?,
            type_ref: Slice::read(reader)?,
            params: Slice::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRecord {
    pub privacy: Privacy,
    pub is_constant: bool,
    pub name: Slice,
    pub type_ref: Slice,
}

impl Record for GlobalRecord {
    const SIZE: usize = 18;
    const TABLE: &'static str = "global";

    fn write(&self, out: &mut Vec<u8>) {
        write_privacy(out, self.privacy);
        out.push(self.is_constant as u8);
        self.name.write(out);
        self.type_ref.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(GlobalRecord {
            privacy: reader.privacy()?,
            is_constant: reader.bool()?,
            name: Slice::read(reader)?,
            type_ref: Slice::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncTypeRecord {
    pub is_variadic: bool,
    pub return_type: Slice,
    pub params: Slice,
}

impl Record for FuncTypeRecord {
    const SIZE: usize = 17;
    const TABLE: &'static str = "function type";

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.is_variadic as u8);
        self.return_type.write(out);
        self.params.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(FuncTypeRecord {
            is_variadic: reader.bool()?,
            return_type: Slice::read(reader)?,
            params: Slice::read(reader)?,
        })
    }
}

/// A parameter name of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRecord {
    pub name: Slice,
}

impl Record for ParamRecord {
    const SIZE: usize = 8;
    const TABLE: &'static str = "parameter";

    fn write(&self, out: &mut Vec<u8>) {
        self.name.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(ParamRecord {
            name: Slice::read(reader)?,
        })
    }
}

/// A parameter type of a function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamTypeRecord {
    pub type_ref: Slice,
}

impl Record for ParamTypeRecord {
    const SIZE: usize = 8;
    const TABLE: &'static str = "parameter type";

    fn write(&self, out: &mut Vec<u8>) {
        self.type_ref.write(out);
    }

    fn read(reader: &mut Reader) -> Result<Self, Error> {
        Ok(ParamTypeRecord {
            type_ref: Slice::read(reader)?,
        })
    }
}

pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_privacy(out: &mut Vec<u8>, privacy: Privacy) {
    out.push(match privacy {
        Privacy::Public => 0,
        Privacy::Private => 1,
    });
}

pub fn write_table<R: Record>(out: &mut Vec<u8>, records: &[R]) {
    for record in records {
        record.write(out);
    }
}

/// Decodes a whole table. A table whose bytes are not an exact number
/// of records is corrupt.
pub fn read_table<R: Record>(bytes: &[u8]) -> Result<Vec<R>, Error> {
    if bytes.len() % R::SIZE != 0 {
        return Err(corrupt(&format!(
            "{} table of {} bytes is not a whole number of {}-byte records",
            R::TABLE,
            bytes.len(),
            R::SIZE
        )));
    }

    let mut reader = Reader::new(bytes);
    let mut records = Vec::with_capacity(bytes.len() / R::SIZE);
    while !reader.is_drained() {
        records.push(R::read(&mut reader)?);
    }

    Ok(records)
}

/// A cursor over little-endian bytes.
pub struct Reader<'b> {
    bytes: &'b [u8],
    offset: usize,
}

impl<'b> Reader<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Reader { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_drained(&self) -> bool {
        self.offset == self.bytes.len()
    }

    fn take(&mut self, count: usize) -> Result<&'b [u8], Error> {
        let end = self.offset + count;
        let bytes = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| corrupt(&format!("unexpected end of data at byte {}", self.offset)))?;

        self.offset = end;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn u32(&mut self) -> Result<u32, Error> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn bool(&mut self) -> Result<bool, Error> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(corrupt(&format!("{} is not a boolean", other))),
        }
    }

    fn privacy(&mut self) -> Result<Privacy, Error> {
        match self.u8()? {
            0 => Ok(Privacy::Public),
            1 => Ok(Privacy::Private),
            other => Err(corrupt(&format!("{} is not a privacy", other))),
        }
    }
}

pub fn corrupt(message: &str) -> Error {
    Error::unpositioned(ErrorImpl::CorruptMetadata {
        message: message.to_string(),
    })
}
