//! WebSocket frame codec.
//!
//! ```text
//! received: [fin<<7 | opcode][mask<<7 | len7][ext len 0/2/8][mask key 4][payload]
//! sent:     [0x81][len7 | 126 + len16 | 127 + len64][payload]
//! ```
//!
//! Fragmentation is not supported: a continuation frame is treated as a
//! complete message of its own. Control frames are recognised and dropped.

const FIN_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;
const LEN7_MASK: u8 = 0x7F;

const LEN16_MARKER: u8 = 126;
const LEN64_MARKER: u8 = 127;
const MAX_LEN7: usize = 125;
const MAX_LEN16: usize = u16::MAX as usize;

/// Frame opcode, decoded once when the header is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Close,
    Ping,
    Pong,
    /// Binary and reserved opcodes
    Other(u8),
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & OPCODE_MASK {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => Self::Other(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
            Self::Other(bits) => bits & OPCODE_MASK,
        }
    }
}

/// One parsed frame. The payload is already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub mask: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

impl Frame {
    /// The text message carried by this frame, if the relay accepts it.
    ///
    /// Only masked text or continuation frames with a UTF-8 payload qualify.
    pub fn into_text(self) -> Option<String> {
        match self.opcode {
            Opcode::Text | Opcode::Continuation => {}
            Opcode::Close | Opcode::Ping | Opcode::Pong | Opcode::Other(_) => return None,
        }
        self.mask?;
        String::from_utf8(self.payload).ok()
    }
}

/// XOR `payload` in place with `key`; applying it twice restores the input.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

struct Header {
    fin: bool,
    opcode: Opcode,
    mask: Option<[u8; 4]>,
    header_len: usize,
    payload_len: u64,
}

fn parse_header(buf: &[u8]) -> Option<Header> {
    let (&first, rest) = buf.split_first()?;
    let (&second, rest) = rest.split_first()?;

    let (payload_len, rest) = match second & LEN7_MASK {
        LEN16_MARKER => {
            let (ext, rest) = rest.split_first_chunk::<2>()?;
            (u16::from_be_bytes(*ext) as u64, rest)
        }
        LEN64_MARKER => {
            let (ext, rest) = rest.split_first_chunk::<8>()?;
            (u64::from_be_bytes(*ext), rest)
        }
        len7 => (u64::from(len7), rest),
    };

    let (mask, rest) = if second & MASK_BIT != 0 {
        let (key, rest) = rest.split_first_chunk::<4>()?;
        (Some(*key), rest)
    } else {
        (None, rest)
    };

    Some(Header {
        fin: first & FIN_BIT != 0,
        opcode: Opcode::from_bits(first),
        mask,
        header_len: buf.len() - rest.len(),
        payload_len,
    })
}

/// Total size (header plus payload) declared by the frame at the front of `buf`.
///
/// Available as soon as the header is complete, before the payload arrives.
pub fn frame_len(buf: &[u8]) -> Option<u64> {
    let header = parse_header(buf)?;
    Some((header.header_len as u64).saturating_add(header.payload_len))
}

/// Parse one frame from the front of `buf`.
///
/// Returns the frame and the number of bytes it occupied, or `None` while the
/// buffer does not yet hold the complete frame. Never reads past `buf`.
pub fn parse_frame(buf: &[u8]) -> Option<(Frame, usize)> {
    let header = parse_header(buf)?;
    let payload_len = usize::try_from(header.payload_len).ok()?;
    let rest = &buf[header.header_len..];
    if rest.len() < payload_len {
        return None;
    }

    let mut payload = rest[..payload_len].to_vec();
    if let Some(key) = header.mask {
        apply_mask(&mut payload, key);
    }

    Some((
        Frame {
            fin: header.fin,
            opcode: header.opcode,
            mask: header.mask,
            payload,
        },
        header.header_len + payload_len,
    ))
}

/// Decode the text message carried by the frame at the start of `buf`.
///
/// Returns `None` for truncated buffers, control frames, unmasked frames and
/// non-UTF-8 payloads; none of these are errors.
pub fn decode(buf: &[u8]) -> Option<String> {
    let (frame, _) = parse_frame(buf)?;
    frame.into_text()
}

/// Encode `text` as a single unmasked, final text frame.
pub fn encode(text: &str) -> Vec<u8> {
    encode_frame(Opcode::Text, text.as_bytes(), None)
}

/// Encode an arbitrary final frame, masking the payload when `mask` is given.
///
/// The relay only sends unmasked frames; masking exists for client-side
/// encoding.
pub fn encode_frame(opcode: Opcode, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 14);
    frame.push(FIN_BIT | opcode.bits());

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    if len <= MAX_LEN7 {
        frame.push(mask_bit | len as u8);
    } else if len <= MAX_LEN16 {
        frame.push(mask_bit | LEN16_MARKER);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(mask_bit | LEN64_MARKER);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            frame.extend_from_slice(&key);
            let start = frame.len();
            frame.extend_from_slice(payload);
            apply_mask(&mut frame[start..], key);
        }
        None => frame.extend_from_slice(payload),
    }

    frame
}
