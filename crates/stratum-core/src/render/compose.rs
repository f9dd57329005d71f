//! Flattening a pile into one frame.

use super::frame::{FrameBuffer, Placement};
use crate::blend::{layer_cell, resolve_high_contrast};
use crate::cell::Cell;
use crate::channel::{Alpha, Channels};
use crate::error::Result;
use crate::pile::Pile;

/// Composite every plane of `pile` into `frame`, bottom to top.
///
/// The frame is resized to the screen when needed. Each position starts as
/// an empty cell on the terminal's default colours; planes covering it are
/// layered with [`layer_cell`]. Afterwards half-covered wide glyphs become
/// spaces, glyph-less positions print as spaces and high-contrast
/// foregrounds are resolved against the final background.
pub fn compose(pile: &Pile, frame: &mut FrameBuffer) -> Result<()> {
    let screen = pile.dims();
    if frame.dims() != screen {
        frame.resize(screen);
    }
    frame.fill(&Cell::empty());

    for &id in pile.zorder() {
        let Some(visible) = pile.visible_rect(id)? else {
            continue;
        };
        let plane = pile.plane(id)?;
        let (ay, ax) = pile.abs_yx(id)?;

        for fy in visible.y..visible.y + visible.rows as i32 {
            for fx in visible.x..visible.x + visible.cols as i32 {
                let (ly, lx) = ((fy - ay) as u32, (fx - ax) as u32);
                let (Some(cell), Some(acc)) =
                    (plane.cell_at(ly, lx), frame.get_mut(fy as u32, fx as u32))
                else {
                    continue;
                };
                layer_cell(acc, cell);
            }
        }

        if let Some(sprixel) = plane.sprixel() {
            let sy = i64::from(ay) + i64::from(sprixel.y);
            let sx = i64::from(ax) + i64::from(sprixel.x);
            if visible.contains(sy, sx) {
                frame.graphics_mut().push(Placement {
                    plane: id,
                    image_id: sprixel.image_id,
                    generation: sprixel.generation,
                    y: sy as u32,
                    x: sx as u32,
                });
            }
        }
    }

    finish(frame);
    Ok(())
}

/// Turn accumulated cells into printable ones.
fn finish(frame: &mut FrameBuffer) {
    let cols = frame.dims().cols as usize;
    if cols == 0 {
        return;
    }
    for row in frame.cells_mut().chunks_mut(cols) {
        for x in 0..row.len() {
            let orphan = row[x].is_continuation() && (x == 0 || row[x - 1].width() != 2);
            let split = row[x].width() == 2 && row.get(x + 1).map_or(true, |n| !n.is_continuation());
            if orphan || split {
                let (style, channels) = (row[x].style, row[x].channels);
                row[x].update(" ", style, channels);
            }
        }
        for cell in row.iter_mut() {
            if cell.is_empty() {
                let (style, channels) = (cell.style, cell.channels);
                cell.update(" ", style, channels);
            }
            let bg = cell.channels.bg();
            let fg = resolve_high_contrast(cell.channels.fg(), bg);
            cell.channels = Channels::combine(fg.with_alpha(Alpha::Opaque), bg.with_alpha(Alpha::Opaque));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::geometry::Dims;
    use crate::pile::PlaneOptions;
    use crate::style::Style;

    fn transparent() -> Channels {
        let mut ch = Channels::DEFAULT;
        ch.set_fg_alpha(Alpha::Transparent);
        ch.set_bg_alpha(Alpha::Transparent);
        ch
    }

    fn frame_of(pile: &Pile) -> FrameBuffer {
        let mut frame = FrameBuffer::new(pile.dims());
        compose(pile, &mut frame).unwrap();
        frame
    }

    #[test]
    fn test_blank_root_is_spaces() {
        let pile = Pile::new(Dims::new(2, 3)).unwrap();
        let frame = frame_of(&pile);
        assert_eq!(frame.row_text(0), "   ");
        assert_eq!(frame.get(1, 2).unwrap().channels, Channels::DEFAULT);
    }

    #[test]
    fn test_opaque_top_wins() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root)
            .unwrap()
            .set_base("a", Style::NONE, Channels::from_rgb(0x111111, 0x222222));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        pile.plane_mut(top)
            .unwrap()
            .set_base("b", Style::BOLD, Channels::from_rgb(0xaaaaaa, 0xbbbbbb));

        let cell = frame_of(&pile).get(0, 0).unwrap().clone();
        assert_eq!(cell.glyph(), "b");
        assert_eq!(cell.style, Style::BOLD);
        assert_eq!(cell.channels, Channels::from_rgb(0xaaaaaa, 0xbbbbbb));
    }

    #[test]
    fn test_transparent_empty_top_shows_bottom() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root)
            .unwrap()
            .set_base("a", Style::ITALIC, Channels::from_rgb(0x111111, 0x222222));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        pile.plane_mut(top).unwrap().set_base("", Style::NONE, transparent());

        let cell = frame_of(&pile).get(0, 0).unwrap().clone();
        assert_eq!(cell.glyph(), "a");
        assert_eq!(cell.style, Style::ITALIC);
        assert_eq!(cell.channels, Channels::from_rgb(0x111111, 0x222222));
    }

    #[test]
    fn test_empty_glyph_still_colours() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root)
            .unwrap()
            .set_base("a", Style::NONE, Channels::from_rgb(0x111111, 0x222222));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        let mut tint = transparent();
        tint.set_bg(Channel::from_rgb(0x0000ff));
        pile.plane_mut(top).unwrap().set_base("", Style::NONE, tint);

        let cell = frame_of(&pile).get(0, 0).unwrap().clone();
        assert_eq!(cell.glyph(), "a");
        assert_eq!(cell.channels.fg_rgb(), 0x111111);
        assert_eq!(cell.channels.bg_rgb(), 0x0000ff);
    }

    #[test]
    fn test_blend_means_with_beneath() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root)
            .unwrap()
            .set_base(" ", Style::NONE, Channels::from_rgb(0, 0x0000ff));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        let mut ch = transparent();
        ch.set_bg(Channel::from_rgb(0xff0000).with_alpha(Alpha::Blend));
        pile.plane_mut(top).unwrap().set_base("", Style::NONE, ch);

        let cell = frame_of(&pile).get(0, 0).unwrap().clone();
        assert_eq!(cell.channels.bg_rgb(), 0x7f007f);
        assert_eq!(cell.channels.bg_alpha(), Alpha::Opaque);
    }

    #[test]
    fn test_high_contrast_resolved_last() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        let mut ch = Channels::from_rgb(0x808080, 0xffffff);
        ch.set_fg_alpha(Alpha::HighContrast);
        pile.plane_mut(root).unwrap().set_base("x", Style::NONE, ch);

        let cell = frame_of(&pile).get(0, 0).unwrap().clone();
        assert_eq!(cell.channels.fg_rgb(), 0x000000);
        assert_eq!(cell.channels.fg_alpha(), Alpha::Opaque);
    }

    #[test]
    fn test_child_clipped_by_parent() {
        let mut pile = Pile::new(Dims::new(3, 6)).unwrap();
        let root = pile.root();
        let parent = pile.create(root, PlaneOptions::new(0, 0, 2, 2)).unwrap();
        pile.plane_mut(parent).unwrap().set_base("p", Style::NONE, Channels::DEFAULT);
        let child = pile.create(parent, PlaneOptions::new(1, 1, 2, 4)).unwrap();
        pile.plane_mut(child).unwrap().set_base("c", Style::NONE, Channels::DEFAULT);

        let frame = frame_of(&pile);
        assert_eq!(frame.row_text(0), "pp    ");
        assert_eq!(frame.row_text(1), "pc    ");
        assert_eq!(frame.row_text(2), "      ");
    }

    #[test]
    fn test_zorder_not_tree_order() {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        let parent = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        let child = pile.create(parent, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        pile.plane_mut(parent).unwrap().set_base("P", Style::NONE, Channels::DEFAULT);
        pile.plane_mut(child).unwrap().set_base("C", Style::NONE, Channels::DEFAULT);
        assert_eq!(frame_of(&pile).row_text(0), "C");

        pile.move_top(parent).unwrap();
        assert_eq!(frame_of(&pile).row_text(0), "P");
    }

    #[test]
    fn test_half_covered_wide_glyph_becomes_space() {
        let mut pile = Pile::new(Dims::new(1, 4)).unwrap();
        let root = pile.root();
        pile.plane_mut(root).unwrap().putstr("日本").unwrap();
        let top = pile.create(root, PlaneOptions::new(0, 1, 1, 1)).unwrap();
        pile.plane_mut(top).unwrap().putstr("x").unwrap();

        let frame = frame_of(&pile);
        assert_eq!(frame.get(0, 0).unwrap().glyph(), " ");
        assert_eq!(frame.get(0, 1).unwrap().glyph(), "x");
        assert_eq!(frame.get(0, 2).unwrap().glyph(), "本");
        assert!(frame.get(0, 3).unwrap().is_continuation());
    }

    #[test]
    fn test_offscreen_plane_ignored() {
        let mut pile = Pile::new(Dims::new(2, 2)).unwrap();
        let root = pile.root();
        let p = pile.create(root, PlaneOptions::new(-1, -1, 2, 2)).unwrap();
        pile.plane_mut(p).unwrap().putstr("ab").unwrap();
        pile.plane_mut(p).unwrap().putstr_yx(Some(1), Some(0), "cd").unwrap();

        let frame = frame_of(&pile);
        assert_eq!(frame.row_text(0), "d ");
    }
}
