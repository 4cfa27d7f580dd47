//! Wire format for cryptographic artifacts crossing a channel.
//!
//! Each message is one atomic frame: a 4-byte unsigned big-endian payload
//! length, a 1-byte type tag, then the payload — a canonical encoding of
//! the tagged type's fields as big-endian fixed-width or length-prefixed
//! integers. Decoding is strict: an unrecognized tag, a truncated payload
//! or trailing bytes all fail the receive, never partially succeed.

use num_bigint_dig::BigUint;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::paillier::{Ciphertext, PaillierPublicKey};
use crate::shamir::{Share, SharingParameters};

/// Payload tag for a Paillier public key.
pub const TAG_PUBLIC_KEY: u8 = 1;
/// Payload tag for a Paillier ciphertext.
pub const TAG_CIPHERTEXT: u8 = 2;
/// Payload tag for a plaintext integer.
pub const TAG_PLAINTEXT_INT: u8 = 3;
/// Payload tag for a secret share.
pub const TAG_SHARE: u8 = 4;
/// Payload tag for secret-sharing parameters.
pub const TAG_SHARING_PARAMS: u8 = 5;

/// Maximum frame payload size (10MB).
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// The closed set of payload kinds a channel can carry.
///
/// Adding a kind means adding a variant and a tag, so the decoder stays
/// exhaustive by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireMessage {
    /// A Paillier public key (tag 1).
    PublicKey(PaillierPublicKey),
    /// A Paillier ciphertext (tag 2).
    Ciphertext(Ciphertext),
    /// A plaintext non-negative integer (tag 3).
    PlaintextInt(BigUint),
    /// One secret share (tag 4).
    Share(Share),
    /// Secret-sharing parameters (tag 5).
    SharingParams(SharingParameters),
}

impl WireMessage {
    /// The wire tag identifying this payload's schema.
    pub fn tag(&self) -> u8 {
        match self {
            WireMessage::PublicKey(_) => TAG_PUBLIC_KEY,
            WireMessage::Ciphertext(_) => TAG_CIPHERTEXT,
            WireMessage::PlaintextInt(_) => TAG_PLAINTEXT_INT,
            WireMessage::Share(_) => TAG_SHARE,
            WireMessage::SharingParams(_) => TAG_SHARING_PARAMS,
        }
    }

    /// Human-readable payload kind, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::PublicKey(_) => "PUBLIC_KEY",
            WireMessage::Ciphertext(_) => "CIPHERTEXT",
            WireMessage::PlaintextInt(_) => "PLAINTEXT_INT",
            WireMessage::Share(_) => "SHARE",
            WireMessage::SharingParams(_) => "SHARING_PARAMS",
        }
    }

    /// Encodes the payload (everything after the tag byte).
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            WireMessage::PublicKey(pk) => {
                put_biguint(&mut buf, &pk.n);
                put_biguint(&mut buf, &pk.g);
            }
            WireMessage::Ciphertext(ct) => {
                put_biguint(&mut buf, &ct.value);
                put_biguint(&mut buf, &ct.modulus);
            }
            WireMessage::PlaintextInt(v) => put_biguint(&mut buf, v),
            WireMessage::Share(s) => {
                buf.extend_from_slice(&s.index.to_be_bytes());
                put_biguint(&mut buf, &s.value);
            }
            WireMessage::SharingParams(p) => {
                put_biguint(&mut buf, &p.modulus);
                buf.extend_from_slice(&p.threshold.to_be_bytes());
                buf.extend_from_slice(&p.parties.to_be_bytes());
            }
        }
        buf
    }

    /// Decodes a payload for the given tag.
    ///
    /// # Errors
    /// `Deserialization` for an unrecognized tag, a truncated payload or
    /// trailing bytes.
    pub fn decode_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        let mut reader = PayloadReader::new(payload);
        let message = match tag {
            TAG_PUBLIC_KEY => WireMessage::PublicKey(PaillierPublicKey {
                n: reader.get_biguint()?,
                g: reader.get_biguint()?,
            }),
            TAG_CIPHERTEXT => WireMessage::Ciphertext(Ciphertext {
                value: reader.get_biguint()?,
                modulus: reader.get_biguint()?,
            }),
            TAG_PLAINTEXT_INT => WireMessage::PlaintextInt(reader.get_biguint()?),
            TAG_SHARE => WireMessage::Share(Share {
                index: reader.get_u32()?,
                value: reader.get_biguint()?,
            }),
            TAG_SHARING_PARAMS => WireMessage::SharingParams(SharingParameters {
                modulus: reader.get_biguint()?,
                threshold: reader.get_u32()?,
                parties: reader.get_u32()?,
            }),
            other => {
                return Err(Error::Deserialization(format!(
                    "unrecognized type tag {other}"
                )))
            }
        };
        reader.finish()?;
        Ok(message)
    }

    /// Unwraps a public key payload.
    ///
    /// # Errors
    /// `Deserialization` if the message carries a different payload kind.
    pub fn expect_public_key(self) -> Result<PaillierPublicKey> {
        match self {
            WireMessage::PublicKey(pk) => Ok(pk),
            other => Err(Error::unexpected_payload("PUBLIC_KEY", other.kind())),
        }
    }

    /// Unwraps a ciphertext payload.
    ///
    /// # Errors
    /// `Deserialization` if the message carries a different payload kind.
    pub fn expect_ciphertext(self) -> Result<Ciphertext> {
        match self {
            WireMessage::Ciphertext(ct) => Ok(ct),
            other => Err(Error::unexpected_payload("CIPHERTEXT", other.kind())),
        }
    }

    /// Unwraps a plaintext integer payload.
    ///
    /// # Errors
    /// `Deserialization` if the message carries a different payload kind.
    pub fn expect_plaintext_int(self) -> Result<BigUint> {
        match self {
            WireMessage::PlaintextInt(v) => Ok(v),
            other => Err(Error::unexpected_payload("PLAINTEXT_INT", other.kind())),
        }
    }

    /// Unwraps a share payload.
    ///
    /// # Errors
    /// `Deserialization` if the message carries a different payload kind.
    pub fn expect_share(self) -> Result<Share> {
        match self {
            WireMessage::Share(s) => Ok(s),
            other => Err(Error::unexpected_payload("SHARE", other.kind())),
        }
    }

    /// Unwraps a sharing-parameters payload.
    ///
    /// # Errors
    /// `Deserialization` if the message carries a different payload kind.
    pub fn expect_sharing_params(self) -> Result<SharingParameters> {
        match self {
            WireMessage::SharingParams(p) => Ok(p),
            other => Err(Error::unexpected_payload("SHARING_PARAMS", other.kind())),
        }
    }
}

/// Writes one complete frame. The write either transmits the whole frame
/// or fails; there are no partial logical messages.
pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &WireMessage,
) -> Result<()> {
    let payload = message.encode_payload();
    if payload.len() > MAX_FRAME_SIZE {
        return Err(Error::InvalidParameter(format!(
            "payload of {} bytes exceeds the {MAX_FRAME_SIZE} byte frame limit",
            payload.len()
        )));
    }

    let mut frame = Vec::with_capacity(4 + 1 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.push(message.tag());
    frame.extend_from_slice(&payload);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one complete frame, blocking until it fully arrives.
///
/// # Errors
/// `ChannelClosed` if the stream ends (peer disconnect), `Deserialization`
/// for an oversized or malformed frame.
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<WireMessage> {
    let mut header = [0u8; 5];
    read_exact_or_closed(reader, &mut header).await?;
    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let tag = header[4];
    if length > MAX_FRAME_SIZE {
        return Err(Error::Deserialization(format!(
            "frame length {length} exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    let mut payload = vec![0u8; length];
    read_exact_or_closed(reader, &mut payload).await?;
    WireMessage::decode_payload(tag, &payload)
}

async fn read_exact_or_closed<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::ChannelClosed),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Writes a 4-byte big-endian length followed by the magnitude bytes.
fn put_biguint(buf: &mut Vec<u8>, value: &BigUint) {
    let bytes = value.to_bytes_be();
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(&bytes);
}

/// Strict cursor over a payload: every read is bounds-checked and the
/// whole buffer must be consumed.
struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        PayloadReader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(Error::Deserialization("truncated payload".into())),
        }
    }

    fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn get_biguint(&mut self) -> Result<BigUint> {
        let length = self.get_u32()? as usize;
        Ok(BigUint::from_bytes_be(self.take(length)?))
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(Error::Deserialization(format!(
                "{} trailing bytes after payload",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}
