//! Metrics for the PDF standard fonts used by the vector backend.
//!
//! Helvetica and Helvetica-Bold are built into every PDF viewer, so the
//! document never embeds font programs. Widths are the Adobe AFM advance
//! widths for printable ASCII, in 1/1000 em.

/// Helvetica advance widths, `' '..='~'`.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica-Bold advance widths, `' '..='~'`.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Width used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

const ASCENDER: f32 = 0.718;
const DESCENDER: f32 = -0.207;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn new(bold: bool) -> Self {
        if bold {
            Self::HelveticaBold
        } else {
            Self::Helvetica
        }
    }

    /// PostScript name for the font dictionary.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name inside the page.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
        }
    }

    fn advance(&self, ch: char) -> u16 {
        let table = match self {
            Self::Helvetica => &HELVETICA,
            Self::HelveticaBold => &HELVETICA_BOLD,
        };
        match ch {
            ' '..='~' => table[ch as usize - 0x20],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent(&self, size: f32) -> f32 {
        ASCENDER * size
    }

    /// Advance width and line height at `size` points.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let units: u32 = text.chars().map(|c| self.advance(c) as u32).sum();
        (units as f32 * size / 1000.0, (ASCENDER - DESCENDER) * size)
    }
}

/// Encode text for a WinAnsi font; characters outside Latin-1 become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}
