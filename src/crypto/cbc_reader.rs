//! Streaming AES-128-CBC decryption.
//!
//! [`CbcDecryptReader`] presents a plaintext byte stream over a ciphertext
//! source, decrypting block-by-block as bytes are pulled. The whole stream is
//! never buffered; CBC chaining state persists across pulls.

use std::io::{self, Read};

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use aes::Aes128;

use crate::error::BackupError;

use super::kdf::derive_key_iv;
use super::{BLOCK_SIZE, IV_SIZE};

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Decryptor lifecycle.
///
/// Key material is derived lazily on the first pull; once the underlying
/// stream reports end-of-stream the reader latches drained and every later
/// pull returns 0 bytes.
enum DecryptState {
    Pending,
    Active(Aes128CbcDec),
    Drained,
}

/// Pull-based AES-128-CBC decrypting reader.
///
/// Wraps a ciphertext byte source and implements [`std::io::Read`] yielding
/// plaintext. Each read request must have room for at least one 16-byte
/// cipher block; the reader fills the largest block multiple that fits and
/// decrypts it in place.
///
/// The ciphertext length must be an exact multiple of the block size. There
/// is no padding removal; callers trim to a declared plaintext size if they
/// need one.
///
/// Decode-path errors ([`BufferTooSmall`], [`InvalidIv`], [`InvalidPadding`])
/// cross the `Read` seam wrapped in [`io::Error`] and are recovered by
/// `BackupError::from`.
///
/// [`BufferTooSmall`]: BackupError::BufferTooSmall
/// [`InvalidIv`]: BackupError::InvalidIv
/// [`InvalidPadding`]: BackupError::InvalidPadding
pub struct CbcDecryptReader<R> {
    inner: R,
    passphrase: Vec<u8>,
    iv_seed: Vec<u8>,
    state: DecryptState,
}

impl<R: Read> CbcDecryptReader<R> {
    /// Create a decrypting reader over `inner`.
    ///
    /// The IV seed normally comes from the secure header and is 16 bytes; a
    /// shorter seed is rejected with [`BackupError::InvalidIv`] on the first
    /// pull.
    pub fn new(inner: R, passphrase: &str, iv_seed: &[u8]) -> Self {
        Self {
            inner,
            passphrase: passphrase.as_bytes().to_vec(),
            iv_seed: iv_seed.to_vec(),
            state: DecryptState::Pending,
        }
    }

    /// Derive key material and construct the block mode.
    fn init_block_mode(&self) -> Result<Aes128CbcDec, BackupError> {
        if self.iv_seed.len() < IV_SIZE {
            return Err(BackupError::InvalidIv {
                have: self.iv_seed.len(),
            });
        }
        let mut seed = [0u8; IV_SIZE];
        seed.copy_from_slice(&self.iv_seed[..IV_SIZE]);
        let (key, iv) = derive_key_iv(&self.passphrase, &seed);
        Ok(Aes128CbcDec::new(&key.into(), &iv.into()))
    }

    /// Read-full semantics: fill `buf` from the underlying stream until it
    /// is full or the stream ends.
    fn fill_ciphertext(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Read for CbcDecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if matches!(self.state, DecryptState::Drained) {
            return Ok(0);
        }
        if buf.len() < BLOCK_SIZE {
            return Err(BackupError::BufferTooSmall {
                needed: BLOCK_SIZE,
                have: buf.len(),
            }
            .into());
        }

        if matches!(self.state, DecryptState::Pending) {
            let mode = self.init_block_mode().map_err(io::Error::from)?;
            self.state = DecryptState::Active(mode);
        }

        let aligned = (buf.len() / BLOCK_SIZE) * BLOCK_SIZE;
        let n = self.fill_ciphertext(&mut buf[..aligned])?;
        if n == 0 {
            // Benign end-of-stream, not a protocol violation.
            self.state = DecryptState::Drained;
            return Ok(0);
        }
        if n % BLOCK_SIZE != 0 {
            self.state = DecryptState::Drained;
            return Err(BackupError::InvalidPadding.into());
        }
        let final_pull = n < aligned;

        if let DecryptState::Active(mode) = &mut self.state {
            for block in buf[..n].chunks_exact_mut(BLOCK_SIZE) {
                mode.decrypt_block_mut(GenericArray::from_mut_slice(block));
            }
        }
        if final_pull {
            self.state = DecryptState::Drained;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;
    use std::io::Cursor;

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    const SEED: [u8; IV_SIZE] = [7u8; IV_SIZE];

    /// CBC-encrypt a block-aligned plaintext under the derived key material.
    fn encrypt_fixture(passphrase: &str, plaintext: &[u8]) -> Vec<u8> {
        assert_eq!(plaintext.len() % BLOCK_SIZE, 0);
        let (key, iv) = derive_key_iv(passphrase.as_bytes(), &SEED);
        let mut mode = Aes128CbcEnc::new(&key.into(), &iv.into());
        let mut out = plaintext.to_vec();
        for block in out.chunks_exact_mut(BLOCK_SIZE) {
            mode.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        out
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    fn decrypt_all(ciphertext: Vec<u8>, passphrase: &str) -> io::Result<Vec<u8>> {
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), passphrase, &SEED);
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_round_trip_block_multiples() {
        for len in [BLOCK_SIZE, 160, 4096] {
            let plaintext = patterned(len);
            let ciphertext = encrypt_fixture("secret", &plaintext);
            let decrypted = decrypt_all(ciphertext, "secret").unwrap();
            assert_eq!(decrypted, plaintext, "length {}", len);
        }
    }

    #[test]
    fn test_chaining_state_spans_pulls() {
        let plaintext = patterned(64);
        let ciphertext = encrypt_fixture("secret", &plaintext);
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED);
        let mut out = Vec::new();
        let mut buf = [0u8; 32];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, plaintext);
    }

    #[test]
    fn test_small_buffer_rejected() {
        let ciphertext = encrypt_fixture("secret", &patterned(32));
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED);
        for have in 1..BLOCK_SIZE {
            let mut buf = vec![0u8; have];
            let err = reader.read(&mut buf).unwrap_err();
            assert!(matches!(
                BackupError::from(err),
                BackupError::BufferTooSmall { needed, have: got }
                    if needed == BLOCK_SIZE && got == have
            ));
        }
    }

    #[test]
    fn test_zero_length_read_is_noop() {
        let ciphertext = encrypt_fixture("secret", &patterned(16));
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED);
        assert_eq!(reader.read(&mut []).unwrap(), 0);
        // The stream is still intact afterwards.
        let mut buf = [0u8; 4096];
        assert_eq!(reader.read(&mut buf).unwrap(), 16);
    }

    #[test]
    fn test_unaligned_ciphertext_is_invalid_padding() {
        let mut ciphertext = encrypt_fixture("secret", &patterned(32));
        ciphertext.truncate(24);
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED);
        let mut buf = [0u8; 4096];
        let err = reader.read(&mut buf).unwrap_err();
        assert!(matches!(BackupError::from(err), BackupError::InvalidPadding));
    }

    #[test]
    fn test_short_iv_seed_rejected_on_first_pull() {
        let ciphertext = encrypt_fixture("secret", &patterned(16));
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED[..8]);
        let mut buf = [0u8; 64];
        let err = reader.read(&mut buf).unwrap_err();
        assert!(matches!(
            BackupError::from(err),
            BackupError::InvalidIv { have: 8 }
        ));
    }

    #[test]
    fn test_empty_stream_is_benign_eof() {
        let mut reader = CbcDecryptReader::new(Cursor::new(Vec::new()), "secret", &SEED);
        let mut buf = [0u8; 64];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_drained_latches_after_final_pull() {
        let plaintext = patterned(32);
        let ciphertext = encrypt_fixture("secret", &plaintext);
        let mut reader = CbcDecryptReader::new(Cursor::new(ciphertext), "secret", &SEED);
        let mut buf = [0u8; 4096];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(n, 32);
        assert_eq!(&buf[..n], &plaintext[..]);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_wrong_passphrase_yields_garbage_not_error() {
        let plaintext = patterned(64);
        let ciphertext = encrypt_fixture("secret", &plaintext);
        let decrypted = decrypt_all(ciphertext, "wrong").unwrap();
        assert_eq!(decrypted.len(), plaintext.len());
        assert_ne!(decrypted, plaintext);
    }
}
