//! End-to-end compositing and rendering tests.
//!
//! Each test builds a pile through the public API, renders it into a
//! recording sink and checks the displayed frame or the emitted ops.

use proptest::prelude::*;
use stratum_core::{
    blit, Alpha, BlitOptions, Blitter, Capabilities, Channel, Channels, Dims, Pile, PlaneOptions,
    RenderOp, Renderer, Scale, Style, Visual,
};

fn transparent() -> Channels {
    let mut ch = Channels::DEFAULT;
    ch.set_fg_alpha(Alpha::Transparent);
    ch.set_bg_alpha(Alpha::Transparent);
    ch
}

#[test_log::test]
fn hello_world_lands_at_absolute_position() {
    let mut pile = Pile::new(Dims::new(24, 80)).unwrap();
    let plane = pile
        .create(pile.root(), PlaneOptions::new(2, 1, 10, 40))
        .unwrap();
    {
        let p = pile.plane_mut(plane).unwrap();
        p.set_styles(Style::BOLD);
        p.set_channels(Channels::combine(
            Channel::from_rgb(0x00ff00),
            Channel::DEFAULT,
        ));
        assert_eq!(p.putstr_yx(Some(1), Some(1), "Hello World").unwrap(), 11);
    }

    let mut renderer = Renderer::new(pile.dims());
    let mut ops = Vec::new();
    renderer.render(&pile, &mut ops).unwrap();

    let cell = renderer.displayed().get(3, 2).unwrap();
    assert_eq!(cell.glyph(), "H");
    assert!(cell.style.contains(Style::BOLD));
    assert_eq!(cell.channels.fg_rgb(), 0x00ff00);
    assert!(ops.contains(&RenderOp::MoveTo { y: 3, x: 2 }));
    assert!(ops.contains(&RenderOp::Print("Hello World".to_string())));
}

#[test]
fn rendering_twice_emits_nothing_the_second_time() {
    let mut pile = Pile::new(Dims::new(10, 20)).unwrap();
    let a = pile
        .create(pile.root(), PlaneOptions::new(1, 1, 3, 10))
        .unwrap();
    pile.plane_mut(a)
        .unwrap()
        .draw_box(Style::NONE, Channels::from_rgb(0xffffff, 0x202020), stratum_core::BoxStyle::Rounded)
        .unwrap();

    let mut renderer = Renderer::new(pile.dims());
    renderer.render(&pile, &mut Vec::new()).unwrap();
    let mut second = Vec::new();
    renderer.render(&pile, &mut second).unwrap();
    assert!(second.is_empty());
}

#[test]
fn half_block_bitmap_renders_red() {
    let mut pile = Pile::new(Dims::new(4, 4)).unwrap();
    let target = pile
        .create(pile.root(), PlaneOptions::new(0, 0, 1, 1))
        .unwrap();
    let red = [0xffu8, 0, 0, 0xff].repeat(4);
    let visual = Visual::from_rgba(&red, 2, 2, 4).unwrap();
    let opts = BlitOptions {
        rows: Some(1),
        cols: Some(1),
        scaling: Scale::None,
        blitter: Blitter::Half,
        ..BlitOptions::default()
    };
    blit(
        &visual,
        pile.plane_mut(target).unwrap(),
        &opts,
        &Capabilities::UNICODE,
    )
    .unwrap();

    let mut renderer = Renderer::new(pile.dims());
    renderer.render(&pile, &mut Vec::new()).unwrap();
    let cell = renderer.displayed().get(0, 0).unwrap();
    assert_eq!(cell.glyph(), "▀");
    assert_eq!(cell.channels.fg_rgb(), 0xff0000);
    assert_eq!(cell.channels.bg_rgb(), 0xff0000);
}

#[test]
fn pixel_graphics_are_placed_and_removed() {
    let mut pile = Pile::new(Dims::new(4, 4)).unwrap();
    let target = pile
        .create(pile.root(), PlaneOptions::new(1, 1, 2, 2))
        .unwrap();
    let visual = Visual::from_rgba(&[0, 0, 0xff].repeat(4), 2, 2, 3).unwrap();
    let caps = Capabilities {
        pixel: true,
        cell_px: Some((8, 4)),
        ..Capabilities::UNICODE
    };
    blit(
        &visual,
        pile.plane_mut(target).unwrap(),
        &BlitOptions::default(),
        &caps,
    )
    .unwrap();

    let mut renderer = Renderer::new(pile.dims());
    let mut ops = Vec::new();
    let stats = renderer.render(&pile, &mut ops).unwrap();
    assert_eq!(stats.graphics, 1);
    assert!(ops.iter().any(|op| matches!(
        op,
        RenderOp::Graphics { y: 1, x: 1, payload, .. } if payload.starts_with("\x1b_Ga=T")
    )));

    let mut again = Vec::new();
    renderer.render(&pile, &mut again).unwrap();
    assert!(again.is_empty());

    pile.destroy(target, false).unwrap();
    let mut removed = Vec::new();
    renderer.render(&pile, &mut removed).unwrap();
    assert!(removed
        .iter()
        .any(|op| matches!(op, RenderOp::DeleteGraphics { .. })));
}

#[test]
fn merge_down_then_destroy_keeps_picture() {
    let mut pile = Pile::new(Dims::new(2, 6)).unwrap();
    let root = pile.root();
    let overlay = pile.create(root, PlaneOptions::new(0, 2, 1, 3)).unwrap();
    {
        let p = pile.plane_mut(overlay).unwrap();
        p.set_base("", Style::NONE, transparent());
        p.putstr("abc").unwrap();
    }

    let mut renderer = Renderer::new(pile.dims());
    renderer.render(&pile, &mut Vec::new()).unwrap();
    let before = renderer.displayed().row_text(0);

    pile.merge_down(overlay, root).unwrap();
    pile.destroy(overlay, true).unwrap();
    let mut ops = Vec::new();
    renderer.render(&pile, &mut ops).unwrap();
    assert_eq!(renderer.displayed().row_text(0), before);
    assert!(ops.is_empty());
}

#[test]
fn scrolling_plane_keeps_latest_lines() {
    let mut pile = Pile::new(Dims::new(3, 10)).unwrap();
    let log = pile
        .create(
            pile.root(),
            PlaneOptions::new(0, 0, 2, 10).with_flags(stratum_core::PlaneFlags::VSCROLL),
        )
        .unwrap();
    for line in ["one", "two", "three"] {
        let p = pile.plane_mut(log).unwrap();
        let (y, _) = p.cursor();
        p.putstr_yx(Some(y), Some(0), line).unwrap();
        p.putstr("\n").unwrap();
    }
    let mut renderer = Renderer::new(pile.dims());
    renderer.render(&pile, &mut Vec::new()).unwrap();
    assert_eq!(renderer.displayed().row_text(0), "three     ");
}

proptest! {
    #[test]
    fn opaque_top_always_wins(fg in 0u32..=0xff_ffff, bg in 0u32..=0xff_ffff, under in 0u32..=0xff_ffff) {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root).unwrap().set_base("u", Style::NONE, Channels::from_rgb(under, under));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        pile.plane_mut(top).unwrap().set_base("t", Style::NONE, Channels::from_rgb(fg, bg));

        let mut renderer = Renderer::new(pile.dims());
        renderer.render(&pile, &mut Vec::new()).unwrap();
        let cell = renderer.displayed().get(0, 0).unwrap();
        prop_assert_eq!(cell.glyph(), "t");
        prop_assert_eq!(cell.channels, Channels::from_rgb(fg, bg));
    }

    #[test]
    fn transparent_empty_top_is_invisible(fg in 0u32..=0xff_ffff, bg in 0u32..=0xff_ffff) {
        let mut pile = Pile::new(Dims::new(1, 1)).unwrap();
        let root = pile.root();
        pile.plane_mut(root).unwrap().set_base("b", Style::UNDERLINE, Channels::from_rgb(fg, bg));
        let top = pile.create(root, PlaneOptions::new(0, 0, 1, 1)).unwrap();
        pile.plane_mut(top).unwrap().set_base("", Style::NONE, transparent());

        let mut renderer = Renderer::new(pile.dims());
        renderer.render(&pile, &mut Vec::new()).unwrap();
        let cell = renderer.displayed().get(0, 0).unwrap();
        prop_assert_eq!(cell.glyph(), "b");
        prop_assert_eq!(cell.style, Style::UNDERLINE);
        prop_assert_eq!(cell.channels, Channels::from_rgb(fg, bg));
    }

    #[test]
    fn resize_preserves_what_fits(rows in 1u32..12, cols in 1u32..12) {
        let mut pile = Pile::new(Dims::new(20, 20)).unwrap();
        let id = pile.create(pile.root(), PlaneOptions::new(0, 0, 6, 6)).unwrap();
        for y in 0..6u32 {
            let text: String = (0..6u8).map(|x| char::from(b'a' + x + y as u8)).collect();
            pile.plane_mut(id).unwrap().putstr_yx(Some(y), Some(0), &text).unwrap();
        }
        pile.resize(id, rows, cols).unwrap();
        let p = pile.plane(id).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                let glyph = p.cell_at(y, x).unwrap().glyph().to_string();
                if y < 6 && x < 6 {
                    let expected = char::from(b'a' + x as u8 + y as u8).to_string();
                    prop_assert_eq!(glyph, expected);
                } else {
                    prop_assert_eq!(glyph, "");
                }
            }
        }
    }
}
