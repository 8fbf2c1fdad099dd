//! Streaming digest accumulator for canonical bytes.

use std::fmt;
use std::io;

use sha2::digest::DynDigest;
use sha2::{Sha256, Sha384, Sha512};

use crate::config::DigestAlgorithm;

/// Digest sink fed by one traversal.
///
/// The sink only ever grows: it is never rewound, replayed or shared between
/// calls. Finalizing consumes it.
pub struct HashSink {
    algorithm: DigestAlgorithm,
    digest: Box<dyn DynDigest>,
    written: u64,
}

impl HashSink {
    /// Create an empty sink for the given algorithm.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let digest: Box<dyn DynDigest> = match algorithm {
            DigestAlgorithm::Sha256 => Box::new(Sha256::default()),
            DigestAlgorithm::Sha384 => Box::new(Sha384::default()),
            DigestAlgorithm::Sha512 => Box::new(Sha512::default()),
        };

        Self {
            algorithm,
            digest,
            written: 0,
        }
    }

    /// Digest algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Number of canonical bytes received so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Finish the digest and return it as lowercase hex.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.digest.finalize())
    }
}

impl Default for HashSink {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}

impl io::Write for HashSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.digest.update(buf);
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for HashSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashSink")
            .field("algorithm", &self.algorithm)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_sha512_digest() {
        let sink = HashSink::default();
        assert_eq!(
            sink.finalize_hex(),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_streaming_matches_single_write() {
        let mut split = HashSink::new(DigestAlgorithm::Sha256);
        split.write_all(b"hello ").unwrap();
        split.write_all(b"world").unwrap();
        assert_eq!(split.bytes_written(), 11);

        let mut whole = HashSink::new(DigestAlgorithm::Sha256);
        whole.write_all(b"hello world").unwrap();

        assert_eq!(split.finalize_hex(), whole.finalize_hex());
    }

    #[test]
    fn test_output_length_matches_algorithm() {
        for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha384, DigestAlgorithm::Sha512] {
            let hex = HashSink::new(algorithm).finalize_hex();
            assert_eq!(hex.len(), algorithm.output_len() * 2);
        }
    }
}
