//! ROM-level commands over [`Link`]: `MATCH`/`SKIP`/
//! `MATCH_OD`/`SKIP_OD`/`RESUME`/`READ`/`SEARCH_ALL`/`SEARCH_ALM` and the
//! Dallas/Maxim ROM-search state machine, grounded on
//! `original_source/L3_OneWireNetwork.c`'s `OwNetSearch` (Maxim application
//! note 187).

use kernel::errorcode::ErrorCode;
use kernel::hil::onewire::Link;
use kernel::onewire_types::{RomId, ScanType, ROM_ID_NONE};

/// ROM command byte values, exactly as `original_source/L3_OneWireNetwork.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomCommand {
    Match = 0x55,
    Skip = 0xCC,
    MatchOd = 0x69,
    SkipOd = 0x3C,
    Resume = 0xA5,
    Read = 0x33,
    SearchAll = 0xF0,
    SearchAlm = 0xFC,
}

/// Per-scan search state: `last_conflict`/`last_zero` persist across
/// repeated calls to [`search`] so a caller can walk the whole bus one
/// device at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchContext {
    pub rom_id: u64,
    pub last_conflict: u8,
    pub last_device: bool,
}

const ID_BITS: u8 = 64;

/// Sends `cmd` followed by the 64-bit ROM ID of `target` (or no address
/// bits for `Skip`/`SkipOd`).
pub fn select(link: &mut dyn Link, cmd: RomCommand, target: Option<RomId>) -> Result<(), ErrorCode> {
    link.write_byte(cmd as u8)?;
    if let Some(id) = target {
        for byte in id.to_le_bytes() {
            link.write_byte(byte)?;
        }
    }
    Ok(())
}

/// Runs one iteration of the Dallas ROM-search algorithm (Maxim
/// application note 187), continuing from `ctx.last_conflict`/
/// `ctx.rom_id` the way `OwNetSearch` does. Returns `Ok(None)` when no
/// device responded to the reset that precedes a search (an empty bus),
/// `Ok(Some(rom_id))` on a CRC-valid address, `Err(ErrorCode::CRCFAIL)`
/// when all 64 bits were walked but the CRC-8 trailer did not validate.
pub fn search(
    link: &mut dyn Link,
    scan_type: ScanType,
    ctx: &mut SearchContext,
) -> Result<Option<RomId>, ErrorCode> {
    let present = link.reset()?;
    if !present {
        ctx.rom_id = ROM_ID_NONE;
        return Ok(None);
    }

    let search_cmd = match scan_type {
        ScanType::Full => RomCommand::SearchAll,
        ScanType::Alarms => RomCommand::SearchAlm,
    };
    link.write_byte(search_cmd as u8)?;

    let mut rom_id: u64 = ctx.rom_id;
    let mut last_zero: u8 = 0;

    for bit_pos in 0..ID_BITS {
        link.write_bit(true)?;
        let true_bit = link.read_bit()?;
        link.write_bit(true)?;
        let comp_bit = link.read_bit()?;

        let direction = if true_bit && comp_bit {
            ctx.rom_id = ROM_ID_NONE;
            return Ok(None);
        } else if true_bit != comp_bit {
            true_bit
        } else {
            // Conflict: both a device and its complement responded. Follow
            // the previous pass's path below `last_conflict`, the new fork
            // at `last_conflict` itself, and `1` past it; `last_zero` only
            // ever moves when the direction chosen here is `0`.
            let direction = if bit_pos < ctx.last_conflict {
                (rom_id >> bit_pos) & 1 != 0
            } else {
                bit_pos == ctx.last_conflict
            };
            if !direction {
                last_zero = bit_pos;
            }
            direction
        };

        if direction {
            rom_id |= 1u64 << bit_pos;
        } else {
            rom_id &= !(1u64 << bit_pos);
        }

        link.write_bit(direction)?;
    }

    let candidate = RomId::new(rom_id);
    if !candidate.crc_valid() {
        return Err(ErrorCode::CRCFAIL);
    }

    ctx.last_conflict = last_zero;
    ctx.rom_id = rom_id;
    ctx.last_device = ctx.last_conflict == 0;
    Ok(Some(candidate))
}
