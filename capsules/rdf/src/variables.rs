//! The fixed 14-entry streaming-parameter enumeration, grounded on
//! `original_source/Rdf.h`'s `MOT_STREAM_PARAMS`/`MOT_STREAM_*_BIT` pair and
//! `Rdf.c`'s `RdfItemDefinitions` table: each parameter has a name and a
//! type fixed at compile time, independent of whether a given recorder's
//! mask selects it.

/// A value staged for one streaming parameter, tagged with the width its
/// declared type carries on disk. Only the widths `RdfItemDefinitions`
/// actually uses are represented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamValue {
    Int32u(u32),
    Int32s(i32),
    Int16u(u16),
    Fp32(f32),
}

impl StreamValue {
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            StreamValue::Int32u(v) => out.extend(v.to_le_bytes()),
            StreamValue::Int32s(v) => out.extend(v.to_le_bytes()),
            StreamValue::Int16u(v) => out.extend(v.to_le_bytes()),
            StreamValue::Fp32(v) => out.extend(v.to_bits().to_le_bytes()),
        }
    }
}

/// The on-disk type tag written in each variable header, matching the
/// tag values `kvf::VarType` uses for the same `VAR_TYPE` vocabulary so a
/// single reader can recognize either file kind's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Int16u,
    Int32u,
    Int32s,
    Fp32,
}

impl VarKind {
    pub fn tag(self) -> u8 {
        match self {
            VarKind::Int16u => 3,
            VarKind::Int32u => 5,
            VarKind::Int32s => 6,
            VarKind::Fp32 => 7,
        }
    }

    fn width(self) -> usize {
        match self {
            VarKind::Int16u => 2,
            VarKind::Int32u | VarKind::Int32s | VarKind::Fp32 => 4,
        }
    }

    /// The zero value staged for this kind before a caller's first
    /// `write_variable` call.
    fn zero(self) -> StreamValue {
        match self {
            VarKind::Int16u => StreamValue::Int16u(0),
            VarKind::Int32u => StreamValue::Int32u(0),
            VarKind::Int32s => StreamValue::Int32s(0),
            VarKind::Fp32 => StreamValue::Fp32(0.0),
        }
    }
}

pub struct ItemDefinition {
    pub name: &'static str,
    pub kind: VarKind,
}

/// Number of streaming parameters, mirroring `MOT_STREAM_MAX_VARS`.
pub const MAX_VARS: usize = 14;

pub const TIME: usize = 0;
pub const SPEED_SETPOINT: usize = 1;
pub const AVG_SPEED: usize = 2;
pub const INST_SPEED: usize = 3;
pub const POSITION: usize = 4;
pub const FILTER_CURRENT: usize = 5;
pub const AVG_CURRENT: usize = 6;
pub const PID_ERROR: usize = 7;
pub const PID_ERRORSUM: usize = 8;
pub const PID_OUTPUT: usize = 9;
pub const PWM_OUTPUT: usize = 10;
pub const RAW_SG: usize = 11;
pub const SCALED_SG: usize = 12;
pub const INST_CURRENT: usize = 13;

/// Names numbered the way `RdfItemDefinitions` numbers them, so a
/// spreadsheet import sorts columns in enumeration order rather than
/// alphabetically.
pub const ITEM_DEFINITIONS: [ItemDefinition; MAX_VARS] = [
    ItemDefinition { name: "00 Time", kind: VarKind::Int32u },
    ItemDefinition { name: "01 Speed Setpt", kind: VarKind::Int32u },
    ItemDefinition { name: "02 Avg Speed", kind: VarKind::Int32u },
    ItemDefinition { name: "03 Inst Speed", kind: VarKind::Int32u },
    ItemDefinition { name: "04 Motor Pos", kind: VarKind::Int32s },
    ItemDefinition { name: "05 Filter Curr", kind: VarKind::Int16u },
    ItemDefinition { name: "06 Avg Curr", kind: VarKind::Int16u },
    ItemDefinition { name: "07 PID Err", kind: VarKind::Fp32 },
    ItemDefinition { name: "08 PID ErrSum", kind: VarKind::Fp32 },
    ItemDefinition { name: "09 PID Output", kind: VarKind::Fp32 },
    ItemDefinition { name: "10 PWM Output", kind: VarKind::Int16u },
    ItemDefinition { name: "11 Raw Strain", kind: VarKind::Int16u },
    ItemDefinition { name: "12 Scl Strain", kind: VarKind::Int16u },
    ItemDefinition { name: "13 Inst Curr", kind: VarKind::Int16u },
];

pub fn zero_for(idx: usize) -> StreamValue {
    ITEM_DEFINITIONS[idx].kind.zero()
}

pub fn width_for(idx: usize) -> usize {
    ITEM_DEFINITIONS[idx].kind.width()
}

/// Indices selected by `mask`, in ascending bit order — the order
/// headers are written in and samples are packed in.
pub fn selected_indices(mask: u16) -> impl Iterator<Item = usize> {
    (0..MAX_VARS).filter(move |idx| mask & (1 << idx) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_indices_are_ascending_and_respect_the_mask() {
        let mask = (1 << TIME) | (1 << AVG_SPEED) | (1 << RAW_SG);
        let got: Vec<usize> = selected_indices(mask).collect();
        assert_eq!(got, vec![TIME, AVG_SPEED, RAW_SG]);
    }

    #[test]
    fn widths_match_the_declared_item_types() {
        assert_eq!(width_for(TIME), 4);
        assert_eq!(width_for(FILTER_CURRENT), 2);
        assert_eq!(width_for(PID_ERROR), 4);
    }
}
