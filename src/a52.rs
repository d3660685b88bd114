//! A5/2 stream cipher implementation
//!
//! A5/2 is the export-grade GSM over-the-air encryption algorithm. Four
//! LFSRs are clocked under a majority rule driven by dedicated bits of the
//! fourth register, and the output combiner XORs the top bits of R1..R3
//! with three majority functions to make the keystream non-linear. The
//! combiner output is delayed by one clock cycle.
//!
//! Reference: Briceno/Goldberg/Wagner reference implementation (1999),
//! with the corrected R2 combiner taps (bits 16, 14, 12).

use tracing::trace;

use crate::bit_buffer::BitBuffer;
use crate::error::A52Error;

/// Key size in bytes (64 bits)
pub const KEY_SIZE: usize = 8;

/// Significant bits of the frame number
pub const FRAME_MASK: u32 = 0x3F_FFFF;

/// Keystream block length in bits, one block per burst direction
pub const KEYSTREAM_BITS: usize = 114;

/// Keystream block length in bytes (114 bits packed MSB-first)
pub const KEYSTREAM_BYTES: usize = 15;

/// One 114-bit keystream block, packed MSB-first per byte.
///
/// The low 6 bits of the final byte are always zero.
pub type Keystream = [u8; KEYSTREAM_BYTES];

/// Register width masks. R1 is 19 bits, R2 22, R3 23, R4 17.
const R1_MASK: u32 = 0x07_FFFF;
const R2_MASK: u32 = 0x3F_FFFF;
const R3_MASK: u32 = 0x7F_FFFF;
const R4_MASK: u32 = 0x01_FFFF;

/// Feedback taps: R1 bits 18,17,16,13; R2 bits 21,20; R3 bits 22,21,20,7;
/// R4 bits 16,11.
const R1_TAPS: u32 = 0x07_2000;
const R2_TAPS: u32 = 0x30_0000;
const R3_TAPS: u32 = 0x70_0080;
const R4_TAPS: u32 = 0x01_0800;

/// Clock-control bits of R4, one paired with each of R1, R2, R3.
const R4_CLOCK_R1: u32 = 1 << 10;
const R4_CLOCK_R2: u32 = 1 << 3;
const R4_CLOCK_R3: u32 = 1 << 7;

/// Bits forced to one in the cycle that loads the last frame bit.
const R1_FORCE_BIT: u32 = 1 << 15;
const R2_FORCE_BIT: u32 = 1 << 16;
const R3_FORCE_BIT: u32 = 1 << 18;
const R4_FORCE_BIT: u32 = 1 << 10;

/// Parity of a register value: XOR of all bits, reduced modulo 2.
#[inline]
fn parity(x: u32) -> u32 {
    x.count_ones() & 1
}

/// Returns true iff at least two of the three words are non-zero.
#[inline]
fn majority(w1: u32, w2: u32, w3: u32) -> bool {
    u8::from(w1 != 0) + u8::from(w2 != 0) + u8::from(w3 != 0) >= 2
}

/// Advance one register: shift left under its width mask, feed the parity
/// of the tapped bits back into bit 0, and OR in `forced` (zero outside the
/// final frame-load cycle).
#[inline]
fn advance(reg: u32, mask: u32, taps: u32, forced: u32) -> u32 {
    let feedback = parity(reg & taps);
    ((reg << 1) & mask) | feedback | forced
}

/// A5/2 cipher state for one (key, frame) pair.
///
/// The four registers and the one-cycle output delay are the complete
/// cipher state; every instance is independent, so separate frames or key
/// pairs can run on separate threads without synchronization.
pub struct A52 {
    /// 19-bit LFSR
    r1: u32,
    /// 22-bit LFSR
    r2: u32,
    /// 23-bit LFSR
    r3: u32,
    /// 17-bit clock-control LFSR
    r4: u32,
    /// Output bit computed on the previous cycle, emitted on the current one
    delay_bit: u8,
}

impl A52 {
    /// Creates a cipher instance keyed for one (key, frame) pair.
    ///
    /// `key` must be exactly 8 bytes; key bits are consumed LSB-first within
    /// each byte, in byte order. Frame numbers wider than 22 bits are
    /// truncated to their low 22 bits.
    pub fn new(key: &[u8], frame: u32) -> Result<Self, A52Error> {
        let key: &[u8; KEY_SIZE] = key
            .try_into()
            .map_err(|_| A52Error::InvalidKeyLength(key.len()))?;

        let mut cipher = A52 {
            r1: 0,
            r2: 0,
            r3: 0,
            r4: 0,
            delay_bit: 0,
        };
        cipher.load(key, frame);
        trace!("A5/2 key setup complete for frame {:#x}", frame & FRAME_MASK);
        Ok(cipher)
    }

    /// Mixes the key and frame number into the registers.
    ///
    /// Clock control is disabled while material loads, so every cycle
    /// advances all four registers. The cycle that consumes the last frame
    /// bit also forces one known bit of each register to one. 100 mixing
    /// cycles under normal clock control follow, then one discarded output
    /// call primes the delay pipeline.
    fn load(&mut self, key: &[u8; KEY_SIZE], frame: u32) {
        for i in 0..64 {
            self.clock(true, false);
            let key_bit = u32::from(key[i / 8] >> (i & 7)) & 1;
            self.r1 ^= key_bit;
            self.r2 ^= key_bit;
            self.r3 ^= key_bit;
            self.r4 ^= key_bit;
        }

        for i in 0..22 {
            self.clock(true, i == 21);
            let frame_bit = (frame >> i) & 1;
            self.r1 ^= frame_bit;
            self.r2 ^= frame_bit;
            self.r3 ^= frame_bit;
            self.r4 ^= frame_bit;
        }

        for _ in 0..100 {
            self.clock(false, false);
        }

        self.output_bit();
    }

    /// Advances the registers by one cycle.
    ///
    /// R4 always advances. R1, R2 and R3 advance when their R4 clock-control
    /// bit agrees with the majority of the three control bits, or
    /// unconditionally while `force_all` is set during key/frame loading.
    /// `frame_load` marks the cycle that consumes the last frame bit.
    fn clock(&mut self, force_all: bool, frame_load: bool) {
        let forced = |bit: u32| if frame_load { bit } else { 0 };
        let maj = majority(
            self.r4 & R4_CLOCK_R1,
            self.r4 & R4_CLOCK_R2,
            self.r4 & R4_CLOCK_R3,
        );

        if force_all || (self.r4 & R4_CLOCK_R1 != 0) == maj {
            self.r1 = advance(self.r1, R1_MASK, R1_TAPS, forced(R1_FORCE_BIT));
        }
        if force_all || (self.r4 & R4_CLOCK_R2 != 0) == maj {
            self.r2 = advance(self.r2, R2_MASK, R2_TAPS, forced(R2_FORCE_BIT));
        }
        if force_all || (self.r4 & R4_CLOCK_R3 != 0) == maj {
            self.r3 = advance(self.r3, R3_MASK, R3_TAPS, forced(R3_FORCE_BIT));
        }
        self.r4 = advance(self.r4, R4_MASK, R4_TAPS, forced(R4_FORCE_BIT));
    }

    /// Produces one keystream bit and advances the output delay pipeline.
    ///
    /// The emitted bit is the one computed on the previous cycle; the bit
    /// derived from the current register contents replaces it in the
    /// pipeline. The pipeline is primed during key setup, so the first call
    /// after setup already returns a defined bit.
    fn output_bit(&mut self) -> u8 {
        let top_bits = ((self.r1 >> 18) ^ (self.r2 >> 21) ^ (self.r3 >> 22)) & 1;
        let combined = top_bits
            ^ u32::from(majority(self.r1 & 0x8000, !self.r1 & 0x4000, self.r1 & 0x1000))
            ^ u32::from(majority(!self.r2 & 0x1_0000, self.r2 & 0x4000, self.r2 & 0x1000))
            ^ u32::from(majority(self.r3 & 0x4_0000, self.r3 & 0x1_0000, !self.r3 & 0x2000));

        let bit = self.delay_bit;
        self.delay_bit = combined as u8;
        bit
    }

    /// Generates the two 114-bit keystream blocks for the loaded frame.
    ///
    /// The blocks cover the two directions of the duplex channel; which
    /// physical direction each one encrypts is the caller's convention. The
    /// second block continues from the state the first left behind.
    pub fn generate_keystreams(&mut self) -> (Keystream, Keystream) {
        let block_a = self.keystream_block();
        let block_b = self.keystream_block();
        trace!("A5/2 keystream pair generated");
        (block_a, block_b)
    }

    /// Runs 114 clock-and-output cycles, packing the bits MSB-first.
    fn keystream_block(&mut self) -> Keystream {
        let mut block = [0u8; KEYSTREAM_BYTES];
        let mut bits = BitBuffer::new(&mut block);
        for _ in 0..KEYSTREAM_BITS {
            self.clock(false, false);
            bits.write(self.output_bit() != 0);
        }
        block
    }
}

/// Generates the A5/2 keystream pair for one (key, frame) pair.
///
/// Runs key setup followed by 228 keystream cycles. Fails only when `key`
/// is not exactly 8 bytes, before any cipher state is built.
pub fn generate_keystreams(key: &[u8], frame: u32) -> Result<(Keystream, Keystream), A52Error> {
    let mut cipher = A52::new(key, frame)?;
    Ok(cipher.generate_keystreams())
}

/// Encrypts or decrypts one pair of GSM bursts in place.
///
/// Keystream block A is XORed into `block1` and block B into `block2`, up
/// to each buffer's length (at most 15 bytes carry keystream). Encryption
/// and decryption are the same operation.
pub fn a52_crypt_frame(
    key: &[u8],
    frame: u32,
    block1: &mut [u8],
    block2: &mut [u8],
) -> Result<(), A52Error> {
    let (block_a, block_b) = generate_keystreams(key, frame)?;
    xor_keystream(block1, &block_a);
    xor_keystream(block2, &block_b);
    Ok(())
}

/// XORs keystream bytes into `data`, bounded by the shorter of the two.
#[inline]
fn xor_keystream(data: &mut [u8], keystream: &[u8]) {
    for (d, k) in data.iter_mut().zip(keystream) {
        *d ^= k;
    }
}
