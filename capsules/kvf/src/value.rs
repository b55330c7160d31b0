//! A runtime value read off or written to disk, paired with the
//! `VarType` tag it must match (`Kvf.h`'s type-mismatch check in every
//! `Kvf*ForKey` reader).

use crate::schema::VarType;

#[derive(Debug, Clone, PartialEq)]
pub enum KvfValue {
    Bool(bool),
    Int8u(u8),
    Int8s(i8),
    Int16u(u16),
    Int16s(i16),
    Int32u(u32),
    Int32s(i32),
    Fp32(f32),
    Str(String),
    Enum(u32),
}

impl KvfValue {
    pub fn var_type(&self) -> VarType {
        match self {
            KvfValue::Bool(_) => VarType::Bool,
            KvfValue::Int8u(_) => VarType::Int8u,
            KvfValue::Int8s(_) => VarType::Int8s,
            KvfValue::Int16u(_) => VarType::Int16u,
            KvfValue::Int16s(_) => VarType::Int16s,
            KvfValue::Int32u(_) => VarType::Int32u,
            KvfValue::Int32s(_) => VarType::Int32s,
            KvfValue::Fp32(_) => VarType::Fp32,
            KvfValue::Str(_) => VarType::Str,
            KvfValue::Enum(_) => VarType::Enum,
        }
    }
}
