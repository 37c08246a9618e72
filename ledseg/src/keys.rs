//! Decoding of the key scan data read back from a TM1638.

/// The number of bytes the TM1638 sends in response to a key scan
pub const KEY_BYTES: usize = 4;

/// Key scan data read from a TM1638 with [`crate::Tm1638::read_keys`].
///
/// The chip scans a 3x8 matrix (columns `K1..K3`, rows `KS1..KS8`) and reports it in four bytes,
/// two rows per byte.  How the matrix maps to the buttons on the board depends on the board, so
/// there are a few ways to look at it:
///
/// - [`Self::is_pressed`] and iteration work in terms of the raw matrix.
/// - [`Self::led_and_key_buttons`] decodes the 8 button "LED & KEY" board.
/// - [`Self::sixteen_key_number`] and [`Self::sixteen_key_mask`] decode the 16 button board.
///
/// Iterating yields each pressed key once, clearing it as it goes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Keys([u8; KEY_BYTES]);

impl Keys {
    pub fn new(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn any_pressed(&self) -> bool {
        self.0.iter().any(|byte| *byte != 0)
    }

    /// Test if the key at `col` and `row` of the matrix is pressed
    pub fn is_pressed(&self, col: KeyColumn, row: KeyRow) -> bool {
        let nibble = row.nibble(&self.0);

        nibble & col.nibble_mask() != 0
    }

    /// One bit per row, set if any key in that row is pressed.  `KS1` is bit 0.
    pub fn rows_bitmask(&self) -> u8 {
        use strum::VariantArray;

        KeyRow::VARIANTS
            .iter()
            .filter(|row| row.nibble(&self.0) != 0)
            .fold(0u8, |bitmask, row| bitmask | (1 << (row.to_row_number() - 1)))
    }

    /// The buttons of the 8 button "LED & KEY" board, `S1` in bit 0 through `S8` in bit 7.
    ///
    /// Each button sits in a row of its own, but not in order: the odd rows are `S1..S4` and the
    /// even rows `S5..S8`.
    ///
    /// ```text
    /// S1  S2  S3  S4  S5  S6  S7  S8
    /// KS1 KS3 KS5 KS7 KS2 KS4 KS6 KS8
    /// ```
    ///
    /// Bit `n` of the result lines up with LED `n` of the same board, so the result can be passed
    /// straight to [`crate::Tm1638::set_leds`].
    #[allow(clippy::identity_op)]
    pub fn led_and_key_buttons(&self) -> u8 {
        let rows = self.rows_bitmask();

        let s1 = rows & 0b0000_0001; // KS1
        let s5 = rows & 0b0000_0010; // KS2
        let s2 = rows & 0b0000_0100; // KS3
        let s6 = rows & 0b0000_1000; // KS4
        let s3 = rows & 0b0001_0000; // KS5
        let s7 = rows & 0b0010_0000; // KS6
        let s4 = rows & 0b0100_0000; // KS7
        let s8 = rows & 0b1000_0000; // KS8

        (s1 >> 0)
            | (s2 >> 1)
            | (s3 >> 2)
            | (s4 >> 3)
            | (s5 << 3)
            | (s6 << 2)
            | (s7 << 1)
            | (s8 << 0)
    }

    /// The number (1 to 16) of the button pressed on the 16 button board, or 0 if none is.
    ///
    /// Only one button can be reported.  A byte with more than one of its buttons down matches
    /// none of them; across bytes the highest numbered byte wins.
    pub fn sixteen_key_number(&self) -> u8 {
        let mut number = 0;

        for (i, byte) in self.0.iter().enumerate() {
            let i = i as u8;
            match *byte {
                0x04 => number = 1 + 2 * i,
                0x40 => number = 2 + 2 * i,
                0x02 => number = 9 + 2 * i,
                0x20 => number = 10 + 2 * i,
                _ => {}
            }
        }

        number
    }

    /// Every button of the 16 button board, `S1` in bit 0 through `S16` in bit 15.
    ///
    /// Byte `i` holds buttons `1 + 2i`, `2 + 2i`, `9 + 2i` and `10 + 2i`, in bits 2, 6, 1 and 5.
    pub fn sixteen_key_mask(&self) -> u16 {
        let mut mask = 0u16;

        for (i, byte) in self.0.iter().enumerate() {
            // Gather the four button bits into bits 0, 1, 4 and 5
            let gathered = (((byte & 0x40) >> 3 | (byte & 0x04)) >> 2)
                | (byte & 0x20)
                | ((byte & 0x02) << 3);
            let gathered = gathered as u16;
            let shift = 2 * i;

            mask |= ((gathered & 0x000F) << shift) | ((gathered & 0x00F0) << 4 << shift);
        }

        mask
    }

    /// Remove one pressed key from the scan data and return it
    fn pop_key(&mut self) -> Option<(KeyColumn, KeyRow)> {
        // Bits 3 and 7 of each byte don't correspond to any column
        let (index, byte) = self
            .0
            .iter_mut()
            .enumerate()
            .find(|(_index, byte)| (**byte & 0b0111_0111) != 0)?;

        let set_bit = (*byte & 0b0111_0111).trailing_zeros() as u8;
        *byte &= !(1 << set_bit);

        let col = KeyColumn::from_bit_index(set_bit % 4)?;
        let row = KeyRow::from_byte_and_bit_index(index as u8, set_bit)?;

        Some((col, row))
    }
}

impl Iterator for Keys {
    type Item = (KeyColumn, KeyRow);

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_key()
    }
}

impl AsRef<[u8]> for Keys {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// The columns of the key matrix
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyColumn {
    K1,
    K2,
    K3,
}

impl KeyColumn {
    pub fn to_column_number(self) -> u8 {
        match self {
            Self::K1 => 1,
            Self::K2 => 2,
            Self::K3 => 3,
        }
    }

    /// Within a row's nibble K3 is bit 0, K2 bit 1 and K1 bit 2.  Bit 3 is unused.
    fn nibble_mask(self) -> u8 {
        match self {
            Self::K1 => 0b0100,
            Self::K2 => 0b0010,
            Self::K3 => 0b0001,
        }
    }

    fn from_bit_index(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Self::K3),
            1 => Some(Self::K2),
            2 => Some(Self::K1),
            _ => None,
        }
    }
}

/// The rows of the key matrix
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::VariantArray)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyRow {
    KS1,
    KS2,
    KS3,
    KS4,
    KS5,
    KS6,
    KS7,
    KS8,
}

impl KeyRow {
    pub fn to_row_number(self) -> u8 {
        self as u8 + 1
    }

    /// The nibble holding this row's three column bits
    fn nibble(self, keys: &[u8; KEY_BYTES]) -> u8 {
        let (byte_index, bit_index) = self.to_byte_and_bit_index();

        (keys[byte_index as usize] >> bit_index) & 0x0f
    }

    /// Odd rows are in the low nibble, even rows in the high nibble, two rows per byte
    fn to_byte_and_bit_index(self) -> (u8, u8) {
        let row = self.to_row_number();
        let bit_index = if row % 2 == 0 { 4 } else { 0 };

        ((row - 1) / 2, bit_index)
    }

    fn from_byte_and_bit_index(byte: u8, bit: u8) -> Option<Self> {
        use strum::VariantArray;

        let index = byte as usize * 2 + usize::from(bit >= 4);
        Self::VARIANTS.get(index).copied()
    }
}
