//! HD44780 16x2 character display behind a PCF8574 I2C backpack.
//!
//! The backpack maps its eight outputs to the display as
//! `D7 D6 D5 D4 BL EN RW RS`, so every byte goes out as two nibbles, each
//! latched by an enable pulse. A nibble and its pulse travel in one I2C
//! write.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use launcher_core::presentation::{BAR_GLYPH, FULL_BLOCK, StatusFrame};

/// Default backpack address with A0..A2 pulled high.
pub const PCF8574_ADDRESS: u8 = 0x27;

const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0x04;
const REGISTER_SELECT: u8 = 0x01;

/// HD44780 instructions.
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_INCREMENT: u8 = 0x06;
    pub const DISPLAY_ON: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_CGRAM: u8 = 0x40;
    pub const SET_DDRAM: u8 = 0x80;
    /// High nibble sent alone during the 8-bit to 4-bit handshake.
    pub const WAKE: u8 = 0x30;
    pub const FOUR_BIT: u8 = 0x20;
}

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// CGRAM slot that holds the bar glyph.
const BAR_SLOT: u8 = 0;

pub struct CharacterLcd<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> CharacterLcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Runs the 4-bit initialisation handshake, clears the screen and loads
    /// the bar glyph.
    pub async fn init(&mut self) -> Result<(), I2C::Error> {
        self.delay.delay_ms(50).await;
        for _ in 0..3 {
            self.write_nibble(cmd::WAKE).await?;
            self.delay.delay_us(4_500).await;
        }
        self.write_nibble(cmd::FOUR_BIT).await?;
        self.delay.delay_us(150).await;

        self.command(cmd::FUNCTION_4BIT_2LINE).await?;
        self.command(cmd::DISPLAY_ON).await?;
        self.command(cmd::CLEAR).await?;
        self.delay.delay_ms(2).await;
        self.command(cmd::ENTRY_INCREMENT).await?;

        self.load_glyph(BAR_SLOT, &FULL_BLOCK).await
    }

    /// Stores a 5x8 bitmap in one of the eight CGRAM slots.
    pub async fn load_glyph(&mut self, slot: u8, rows: &[u8; 8]) -> Result<(), I2C::Error> {
        self.command(cmd::SET_CGRAM | ((slot & 0x07) << 3)).await?;
        for &row in rows {
            self.data(row).await?;
        }
        Ok(())
    }

    /// Rewrites both rows.
    pub async fn write_frame(&mut self, frame: &StatusFrame) -> Result<(), I2C::Error> {
        for (offset, line) in ROW_OFFSETS.into_iter().zip([&frame.top, &frame.bottom]) {
            self.command(cmd::SET_DDRAM | offset).await?;
            for ch in line.chars() {
                self.data(glyph_code(ch)).await?;
            }
        }
        Ok(())
    }

    async fn command(&mut self, instruction: u8) -> Result<(), I2C::Error> {
        self.write_byte(instruction, 0).await?;
        self.delay.delay_us(50).await;
        Ok(())
    }

    async fn data(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.write_byte(value, REGISTER_SELECT).await
    }

    async fn write_byte(&mut self, value: u8, mode: u8) -> Result<(), I2C::Error> {
        let high = (value & 0xF0) | mode | BACKLIGHT;
        let low = ((value << 4) & 0xF0) | mode | BACKLIGHT;
        self.i2c
            .write(self.address, &[high | ENABLE, high, low | ENABLE, low])
            .await
    }

    async fn write_nibble(&mut self, value: u8) -> Result<(), I2C::Error> {
        let bits = (value & 0xF0) | BACKLIGHT;
        self.i2c.write(self.address, &[bits | ENABLE, bits]).await
    }
}

/// Character ROM code for `ch`. Anything outside printable ASCII shows as
/// `?`.
#[must_use]
pub fn glyph_code(ch: char) -> u8 {
    if ch == BAR_GLYPH {
        return BAR_SLOT;
    }
    u8::try_from(ch)
        .ok()
        .filter(|code| code.is_ascii_graphic() || *code == b' ')
        .unwrap_or(b'?')
}

/// Keeps the most recent frame until the display has accepted it.
///
/// A failed write leaves the frame pending and forces the init handshake
/// on the next attempt, since a NACK usually means the backpack lost power
/// and dropped back to 8-bit mode.
pub struct FrameRefresher<I2C, D> {
    lcd: CharacterLcd<I2C, D>,
    ready: bool,
    pending: Option<StatusFrame>,
}

impl<I2C, D> FrameRefresher<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(lcd: CharacterLcd<I2C, D>) -> Self {
        Self {
            lcd,
            ready: false,
            pending: None,
        }
    }

    /// Replaces whatever frame is still waiting to be written.
    pub fn queue(&mut self, frame: StatusFrame) {
        self.pending = Some(frame);
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Initialises the display if needed, then writes the pending frame.
    pub async fn flush(&mut self) -> Result<(), I2C::Error> {
        let Some(frame) = self.pending.as_ref() else {
            return Ok(());
        };
        if !self.ready {
            self.lcd.init().await?;
            self.ready = true;
        }
        if let Err(err) = self.lcd.write_frame(frame).await {
            self.ready = false;
            return Err(err);
        }
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
    use launcher_core::duty::Duty;
    use launcher_core::presentation::StatusView;

    use super::*;

    #[derive(Default)]
    struct Bus {
        writes: Vec<(u8, Vec<u8>)>,
        fail_after: Option<usize>,
    }

    impl ErrorType for Bus {
        type Error = ErrorKind;
    }

    impl I2c for Bus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail_after.is_some_and(|limit| self.writes.len() >= limit) {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for operation in operations {
                if let Operation::Write(bytes) = operation {
                    self.writes.push((address, bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Clock {
        waited_ns: u64,
    }

    impl DelayNs for Clock {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
        }
    }

    fn lcd() -> CharacterLcd<Bus, Clock> {
        CharacterLcd::new(Bus::default(), Clock::default(), PCF8574_ADDRESS)
    }

    /// Reassembles (rs, byte) pairs from full-byte writes.
    fn decode(writes: &[(u8, Vec<u8>)]) -> Vec<(bool, u8)> {
        writes
            .iter()
            .filter(|(_, bytes)| bytes.len() == 4)
            .map(|(_, bytes)| {
                let rs = bytes[1] & REGISTER_SELECT != 0;
                (rs, (bytes[1] & 0xF0) | (bytes[3] >> 4))
            })
            .collect()
    }

    #[test]
    fn init_handshake_then_configures_display() {
        let mut lcd = lcd();
        block_on(lcd.init()).expect("init succeeds");

        let writes = &lcd.i2c.writes;
        assert!(writes.iter().all(|(address, _)| *address == PCF8574_ADDRESS));
        assert_eq!(
            writes[..4]
                .iter()
                .map(|(_, bytes)| bytes.as_slice())
                .collect::<Vec<_>>(),
            vec![
                &[0x3C, 0x38][..],
                &[0x3C, 0x38][..],
                &[0x3C, 0x38][..],
                &[0x2C, 0x28][..],
            ]
        );
        assert_eq!(writes[4].1, vec![0x2C, 0x28, 0x8C, 0x88]);

        let bytes = decode(writes);
        assert_eq!(
            &bytes[..5],
            &[
                (false, 0x28),
                (false, 0x0C),
                (false, 0x01),
                (false, 0x06),
                (false, 0x40),
            ]
        );
        assert_eq!(&bytes[5..], &[(true, 0x1F); 8]);
        assert!(lcd.delay.waited_ns >= 50_000_000);
    }

    #[test]
    fn frame_maps_bar_glyph_to_cgram() {
        let mut lcd = lcd();
        let frame = StatusFrame::render(&StatusView::idle(Duty::new(128), 5_300));
        block_on(lcd.write_frame(&frame)).expect("write succeeds");

        let bytes = decode(&lcd.i2c.writes);
        assert_eq!(bytes.len(), 2 + 32);
        assert_eq!(bytes[0], (false, 0x80));
        let top: Vec<u8> = bytes[1..17].iter().map(|(_, b)| *b).collect();
        assert_eq!(top, b"IDLE RPM: 2660  ".to_vec());
        assert_eq!(bytes[17], (false, 0xC0));
        let bottom: Vec<u8> = bytes[18..].iter().map(|(_, b)| *b).collect();
        assert_eq!(&bottom[..8], &[0; 8]);
        assert_eq!(&bottom[8..], b"        ");
        assert!(bytes[18..].iter().all(|(rs, _)| *rs));
    }

    #[test]
    fn bus_errors_abort_the_frame() {
        let mut lcd = CharacterLcd::new(
            Bus {
                fail_after: Some(3),
                ..Bus::default()
            },
            Clock::default(),
            PCF8574_ADDRESS,
        );
        let frame = StatusFrame::render(&StatusView::idle(Duty::new(128), 5_300));
        let result = block_on(lcd.write_frame(&frame));
        assert_eq!(
            result,
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert_eq!(lcd.i2c.writes.len(), 3);
    }

    #[test]
    fn failed_frame_is_kept_and_retried() {
        let mut display = FrameRefresher::new(lcd());
        let frame = StatusFrame::render(&StatusView::idle(Duty::new(128), 5_300));
        display.queue(frame.clone());
        block_on(display.flush()).expect("first write succeeds");
        assert!(!display.has_pending());

        let idle = StatusFrame::render(&StatusView::idle(Duty::new(10), 5_300));
        let written = display.lcd.i2c.writes.len();
        display.lcd.i2c.fail_after = Some(written + 5);
        display.queue(idle.clone());
        assert!(block_on(display.flush()).is_err());
        assert!(display.has_pending());

        display.lcd.i2c.fail_after = None;
        display.lcd.i2c.writes.clear();
        block_on(display.flush()).expect("retry succeeds");
        assert!(!display.has_pending());

        // The retry re-runs the handshake before redrawing.
        assert_eq!(display.lcd.i2c.writes[0].1, vec![0x3C, 0x38]);
        let bytes = decode(&display.lcd.i2c.writes);
        let top: Vec<u8> = bytes[bytes.len() - 33..bytes.len() - 17]
            .iter()
            .map(|(_, b)| *b)
            .collect();
        assert_eq!(top, idle.top.as_bytes().to_vec());
    }

    #[test]
    fn flush_without_frame_touches_nothing() {
        let mut display = FrameRefresher::new(lcd());
        block_on(display.flush()).expect("nothing to do");
        assert!(display.lcd.i2c.writes.is_empty());
    }

    #[test]
    fn non_ascii_shows_placeholder() {
        assert_eq!(glyph_code('A'), b'A');
        assert_eq!(glyph_code(' '), b' ');
        assert_eq!(glyph_code(BAR_GLYPH), 0);
        assert_eq!(glyph_code('█'), b'?');
        assert_eq!(glyph_code('\n'), b'?');
    }
}
