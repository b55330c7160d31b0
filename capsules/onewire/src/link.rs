//! Register-level driver for the 1-Wire bus-master chip,
//! implementing [`kernel::hil::onewire::Link`] on top of the narrow
//! [`crate::i2c_bus::I2cBus`] surface.

use crate::i2c_bus::I2cBus;
use crate::regs;
use kernel::errorcode::ErrorCode;
use kernel::hil::onewire::{Link, Pullup, Speed};

pub struct OneWireLink<B: I2cBus> {
    bus: B,
    config: u8,
    pullup_pending: Option<Pullup>,
}

impl<B: I2cBus> OneWireLink<B> {
    pub fn new(bus: B) -> OneWireLink<B> {
        OneWireLink {
            bus,
            config: 0,
            pullup_pending: None,
        }
    }

    /// Polls the busy bit up to [`regs::IDLE_WAIT_RETRY_COUNT`] times,
    /// returning the final status byte once the bus goes idle.
    fn wait_idle(&mut self) -> Result<u8, ErrorCode> {
        for _ in 0..regs::IDLE_WAIT_RETRY_COUNT {
            let status = self.bus.read_register(regs::REG_MASTER_STATUS)?;
            if status & regs::STATUS_MASK_1WB == 0 {
                return Ok(status);
            }
        }
        Err(ErrorCode::TIMEOUT)
    }

    fn run_function(&mut self, func: u8) -> Result<u8, ErrorCode> {
        self.bus.write_register(regs::REG_FUNC, func)?;
        self.wait_idle()
    }
}

impl<B: I2cBus> Link for OneWireLink<B> {
    fn init(&mut self) -> Result<(), ErrorCode> {
        for _ in 0..regs::INIT_RETRY_COUNT {
            let id1 = self.bus.read_register(regs::REG_MANUF_ID1);
            let id2 = self.bus.read_register(regs::REG_MANUF_ID2);
            if let (Ok(regs::COVIDIEN_MANUF_ID1), Ok(regs::COVIDIEN_MANUF_ID2)) = (id1, id2) {
                return Ok(());
            }
        }
        kernel::debug_flt!("1-wire bus-master manufacturer id probe exhausted retries");
        Err(ErrorCode::NODEVICE)
    }

    fn reset(&mut self) -> Result<bool, ErrorCode> {
        self.bus.write_register(regs::REG_FUNC, regs::FUNC_1WIRE_RESET_PULSE)?;
        let status = self.wait_idle()?;
        if status & regs::STATUS_MASK_SD != 0 {
            return Err(ErrorCode::BUSERR);
        }
        Ok(status & regs::STATUS_MASK_PPD != 0)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), ErrorCode> {
        self.read_bit_or_write(bit).map(|_| ())
    }

    fn read_bit(&mut self) -> Result<bool, ErrorCode> {
        self.read_bit_or_write(true)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ErrorCode> {
        self.bus.write_register(regs::REG_FUNC, regs::FUNC_1WIRE_WRITE_BYTE)?;
        self.bus.write_register(regs::REG_READ_DATA, byte)?;
        self.wait_idle().map(|_| ())
    }

    fn read_byte(&mut self) -> Result<u8, ErrorCode> {
        self.run_function(regs::FUNC_1WIRE_READ_BYTE)?;
        self.bus.read_register(regs::REG_READ_DATA)
    }

    fn set_speed(&mut self, speed: Speed) {
        match speed {
            Speed::Overdrive => self.config |= regs::CONFIG_MASK_1WS,
            Speed::Standard => self.config &= !regs::CONFIG_MASK_1WS,
        }
    }

    fn set_pullup(&mut self, pullup: Pullup) {
        self.pullup_pending = Some(pullup);
    }

    fn update_config(&mut self) -> Result<(), ErrorCode> {
        if let Some(pullup) = self.pullup_pending.take() {
            match pullup {
                Pullup::Strong => self.config |= regs::CONFIG_MASK_SPU,
                Pullup::Off => self.config &= !regs::CONFIG_MASK_SPU,
            }
        }
        self.bus.write_register(regs::REG_MST_CONFIG, self.config)
    }

    fn sleep(&mut self) -> Result<(), ErrorCode> {
        self.bus.write_register(regs::REG_TW1L, regs::OVERDRIVE_TW1L_VALUE)?;
        self.run_function(regs::FUNC_1WIRE_MASTER_RESET)?;
        self.reset().map(|_| ())
    }
}

impl<B: I2cBus> OneWireLink<B> {
    fn read_bit_or_write(&mut self, value: bool) -> Result<bool, ErrorCode> {
        let param = if value { 0x80 } else { 0x00 };
        self.bus.write_register(regs::REG_FUNC, regs::FUNC_1WIRE_SINGLE_BIT)?;
        self.bus.write_register(regs::REG_FUNC_PARAM, param)?;
        let status = self.wait_idle()?;
        Ok(status & regs::STATUS_MASK_SBR != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeBus {
        registers: HashMap<u8, u8>,
    }

    impl FakeBus {
        fn new() -> FakeBus {
            let mut registers = HashMap::new();
            registers.insert(regs::REG_MANUF_ID1, regs::COVIDIEN_MANUF_ID1);
            registers.insert(regs::REG_MANUF_ID2, regs::COVIDIEN_MANUF_ID2);
            registers.insert(regs::REG_MASTER_STATUS, 0);
            FakeBus { registers }
        }
    }

    impl I2cBus for FakeBus {
        fn write_register(&mut self, register: u8, value: u8) -> Result<(), ErrorCode> {
            self.registers.insert(register, value);
            Ok(())
        }

        fn read_register(&mut self, register: u8) -> Result<u8, ErrorCode> {
            Ok(*self.registers.get(&register).unwrap_or(&0))
        }
    }

    #[test]
    fn init_succeeds_when_manufacturer_id_matches() {
        let mut link = OneWireLink::new(FakeBus::new());
        assert!(link.init().is_ok());
    }

    #[test]
    fn init_fails_when_manufacturer_id_never_matches() {
        let mut bus = FakeBus::new();
        bus.registers.insert(regs::REG_MANUF_ID1, 0x00);
        let mut link = OneWireLink::new(bus);
        assert_eq!(link.init(), Err(ErrorCode::NODEVICE));
    }

    #[test]
    fn reset_reports_short_as_buserr() {
        let mut bus = FakeBus::new();
        bus.registers.insert(regs::REG_MASTER_STATUS, regs::STATUS_MASK_SD);
        let mut link = OneWireLink::new(bus);
        assert_eq!(link.reset(), Err(ErrorCode::BUSERR));
    }

    #[test]
    fn reset_reports_presence() {
        let mut bus = FakeBus::new();
        bus.registers.insert(regs::REG_MASTER_STATUS, regs::STATUS_MASK_PPD);
        let mut link = OneWireLink::new(bus);
        assert_eq!(link.reset(), Ok(true));
    }

    #[test]
    fn update_config_flushes_cached_pullup() {
        let mut link = OneWireLink::new(FakeBus::new());
        link.set_pullup(Pullup::Strong);
        assert!(link.update_config().is_ok());
        assert_eq!(link.config & regs::CONFIG_MASK_SPU, regs::CONFIG_MASK_SPU);
    }
}
