use crate::errors::WfaError;

/// Symbol appended past the end of the pattern
pub const PATTERN_PADDING: u8 = 0x00;

/// Symbol appended past the end of the text. Differs from [`PATTERN_PADDING`], such that an
/// exact-match extension always stops at the end of either sequence.
pub const TEXT_PADDING: u8 = 0xFF;

/// Number of padding symbols after each sequence
pub const PADDING_WIDTH: usize = 16;

/// Sentinel-padded copies of the pattern and text.
///
/// Offsets within the alignment matrix never point further than one position past the end of
/// either sequence, so reading a symbol at a valid pattern or text position never needs an
/// explicit bounds check.
#[derive(Clone, Debug)]
pub struct PaddedSequences {
    pattern: Vec<u8>,
    text: Vec<u8>,
    pattern_len: usize,
    text_len: usize,
}

impl PaddedSequences {
    pub fn new(pattern: &[u8], text: &[u8]) -> Result<Self, WfaError> {
        check_reserved("pattern", pattern)?;
        check_reserved("text", text)?;

        Ok(Self {
            pattern: pad(pattern, PATTERN_PADDING)?,
            text: pad(text, TEXT_PADDING)?,
            pattern_len: pattern.len(),
            text_len: text.len(),
        })
    }

    #[inline]
    pub fn pattern_len(&self) -> usize {
        self.pattern_len
    }

    #[inline]
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// The pattern without padding
    pub fn pattern(&self) -> &[u8] {
        &self.pattern[..self.pattern_len]
    }

    /// The text without padding
    pub fn text(&self) -> &[u8] {
        &self.text[..self.text_len]
    }

    /// Number of exactly matching symbols starting at pattern position `v` and text position `h`
    #[inline]
    pub fn match_run(&self, v: usize, h: usize) -> usize {
        self.pattern[v..].iter()
            .zip(&self.text[h..])
            .take_while(|(p, t)| p == t)
            .count()
    }
}

fn check_reserved(sequence: &'static str, seq: &[u8]) -> Result<(), WfaError> {
    match seq.iter().position(|c| *c == PATTERN_PADDING || *c == TEXT_PADDING) {
        Some(position) => Err(WfaError::ReservedSymbol { sequence, position, symbol: seq[position] }),
        None => Ok(())
    }
}

fn pad(seq: &[u8], symbol: u8) -> Result<Vec<u8>, WfaError> {
    let mut padded = Vec::new();
    padded.try_reserve_exact(seq.len() + PADDING_WIDTH)?;
    padded.extend_from_slice(seq);
    padded.resize(seq.len() + PADDING_WIDTH, symbol);

    Ok(padded)
}
