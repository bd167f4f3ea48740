//! CRC-32 as computed by the STM32 CRC peripheral.
//!
//! Polynomial `0x04C11DB7`, initial value `0xFFFFFFFF`, MSB-first, no
//! reflection and no final XOR. Input is consumed one little-endian 32-bit
//! word at a time. A trailing partial word is zero-padded at its front and
//! then byte-reversed before being loaded, so the tail `[a, b, c]` is fed as
//! the word `0x00_aa_bb_cc`. Firmware checks resource packs against exactly
//! this value.

pub const CRC_POLY: u32 = 0x04C1_1DB7;
pub const CRC_INIT: u32 = 0xFFFF_FFFF;

#[inline]
fn process_word(crc: u32, word: u32) -> u32 {
    let mut crc = crc ^ word;
    for _ in 0..32 {
        crc = if crc & 0x8000_0000 != 0 {
            (crc << 1) ^ CRC_POLY
        } else {
            crc << 1
        };
    }
    crc
}

#[inline]
fn load_word(chunk: &[u8]) -> u32 {
    debug_assert!(!chunk.is_empty() && chunk.len() <= 4);
    let mut word = [0u8; 4];
    if chunk.len() == 4 {
        word.copy_from_slice(chunk);
    } else {
        // Front padding followed by a reversal leaves the tail reversed at
        // the low end of the word.
        for (dst, src) in word.iter_mut().zip(chunk.iter().rev()) {
            *dst = *src;
        }
    }
    u32::from_le_bytes(word)
}

/// CRC of `data` starting from the peripheral reset value.
pub fn crc32(data: &[u8]) -> u32 {
    crc32_with_seed(data, CRC_INIT)
}

/// CRC of `data` continuing from a previous result.
///
/// Chaining is only equivalent to a single call over the concatenation when
/// every earlier chunk is a whole number of words.
pub fn crc32_with_seed(data: &[u8], seed: u32) -> u32 {
    data.chunks(4)
        .fold(seed, |crc, chunk| process_word(crc, load_word(chunk)))
}

/// Incremental form of [`crc32`] for streamed input.
///
/// Bytes are buffered until a full word is available, so any split of the
/// input yields the same result as one [`crc32`] call over all of it.
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
    pending: [u8; 4],
    pending_len: usize,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self::with_seed(CRC_INIT)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            crc: seed,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        if self.pending_len > 0 {
            let take = (4 - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];
            if self.pending_len < 4 {
                return;
            }
            self.crc = process_word(self.crc, load_word(&self.pending));
            self.pending_len = 0;
        }

        let whole = data.len() - data.len() % 4;
        self.crc = crc32_with_seed(&data[..whole], self.crc);

        let tail = &data[whole..];
        self.pending[..tail.len()].copy_from_slice(tail);
        self.pending_len = tail.len();
    }

    pub fn finalize(&self) -> u32 {
        if self.pending_len == 0 {
            self.crc
        } else {
            process_word(self.crc, load_word(&self.pending[..self.pending_len]))
        }
    }
}
