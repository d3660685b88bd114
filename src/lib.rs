//! A5/2 stream cipher for GSM over-the-air encryption
//!
//! Implements the A5/2 keystream generator: four linear feedback shift
//! registers under majority-vote clock control, a non-linear output combiner
//! with one cycle of output delay, and the key/frame loading procedure.
//! Each (64-bit key, 22-bit frame number) pair yields two independent
//! 114-bit keystream blocks, one per direction of the duplex channel.
//!
//! Reference: the Briceno/Goldberg/Wagner reference implementation (1999),
//! with the corrected R2 combiner taps.

pub mod a52;
pub mod bit_buffer;
pub mod error;

pub use a52::{
    a52_crypt_frame, generate_keystreams, Keystream, A52, FRAME_MASK, KEYSTREAM_BITS,
    KEYSTREAM_BYTES, KEY_SIZE,
};
pub use bit_buffer::BitBuffer;
pub use error::A52Error;
