//! Pixel graphics through the kitty graphics protocol.
//!
//! - `ESC _ G a=T,f=32,s=<w>,v=<h>,i=<id>,m=1;<data> ESC \` - first chunk
//! - `ESC _ G m=<more>;<data> ESC \` - following chunks
//! - `ESC _ G a=d,d=I,i=<id> ESC \` - delete an image

use base64::{engine::general_purpose, Engine as _};

/// Maximum base64 bytes per escape sequence.
pub const CHUNK_SIZE: usize = 4096;

const APC_START: &str = "\x1b_G";
const APC_END: &str = "\x1b\\";

/// An RGBA bitmap attached to a plane, drawn by the terminal itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprixel {
    /// Terminal image id; stable for the plane.
    pub image_id: u32,
    /// Bumped on every blit into the same plane.
    pub generation: u32,
    /// Plane row of the top-left cell.
    pub y: u32,
    /// Plane column of the top-left cell.
    pub x: u32,
    /// Cells covered.
    pub rows: u32,
    pub cols: u32,
    /// Bitmap size in pixels.
    pub px_height: u32,
    pub px_width: u32,
    encoded: String,
}

impl Sprixel {
    pub(crate) fn new(
        image_id: u32,
        generation: u32,
        (y, x): (u32, u32),
        (rows, cols): (u32, u32),
        (px_height, px_width): (u32, u32),
        rgba: &[u8],
    ) -> Self {
        Self {
            image_id,
            generation,
            y,
            x,
            rows,
            cols,
            px_height,
            px_width,
            encoded: general_purpose::STANDARD.encode(rgba),
        }
    }

    /// Base64 of the RGBA bitmap.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Escape sequences transmitting and displaying `sprixel` at the cursor.
///
/// The cursor is not moved by the terminal (`C=1`), and replies are
/// suppressed (`q=2`).
#[must_use]
pub fn placement_sequence(sprixel: &Sprixel) -> String {
    let data = sprixel.encoded.as_bytes();
    let chunks: Vec<&[u8]> = if data.is_empty() {
        vec![&[][..]]
    } else {
        data.chunks(CHUNK_SIZE).collect()
    };
    let mut out = String::with_capacity(data.len() + chunks.len() * 16 + 64);
    for (i, chunk) in chunks.iter().enumerate() {
        let more = u8::from(i + 1 < chunks.len());
        // chunks of base64 are ASCII
        let text = std::str::from_utf8(chunk).unwrap_or_default();
        out.push_str(APC_START);
        if i == 0 {
            out.push_str(&format!(
                "a=T,f=32,s={},v={},i={},q=2,C=1,",
                sprixel.px_width, sprixel.px_height, sprixel.image_id
            ));
        }
        out.push_str(&format!("m={more};"));
        out.push_str(text);
        out.push_str(APC_END);
    }
    out
}

/// Escape sequence deleting image `image_id` and its placements.
#[must_use]
pub fn delete_sequence(image_id: u32) -> String {
    format!("{APC_START}a=d,d=I,i={image_id},q=2{APC_END}")
}
