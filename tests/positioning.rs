//! End-to-end positioning scenarios against the headless platform.

use spark_signals::flush_sync;
use tether_ui::{
    arrow, compute_position, create_floating, flip, hide, offset, shift, ArrowData,
    ArrowOptions, Boundary, ComputePositionConfig, Derivable, DetectOverflowOptions,
    ElementConfig, FlipOptions, FloatingOptions, HeadlessPlatform, HideData, HideOptions,
    OffsetValue, Padding, Placement, Rect, ShiftOptions, Strategy,
};

#[test]
fn test_tooltip_near_the_corner() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    // Reference in the bottom-right corner: the tooltip must flip above it
    // and slide left to stay inside the viewport.
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        740.0, 560.0, 60.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 120.0, 50.0,
    )));

    let config = ComputePositionConfig {
        placement: Placement::BOTTOM,
        strategy: Strategy::Absolute,
        middleware: vec![
            offset(8.0),
            flip(FlipOptions::default()),
            shift(ShiftOptions {
                detect: DetectOverflowOptions {
                    padding: Padding::All(5.0),
                    ..Default::default()
                },
                ..Default::default()
            }),
        ],
    };
    let position = compute_position(&*platform, reference, floating, &config).unwrap();

    assert_eq!(position.placement, Placement::TOP);
    assert_eq!(position.y, 502.0);
    assert_eq!(position.x, 675.0);
}

#[test]
fn test_popover_with_arrow_and_hide() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        300.0, 100.0, 60.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 160.0, 60.0,
    )));
    let arrow_el = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 16.0, 8.0,
    )));

    let config = ComputePositionConfig {
        placement: Placement::BOTTOM,
        strategy: Strategy::Absolute,
        middleware: vec![
            offset(8.0),
            arrow(ArrowOptions::new(arrow_el)),
            hide(HideOptions::default()),
        ],
    };
    let position = compute_position(&*platform, reference, floating, &config).unwrap();

    assert_eq!(position.x, 250.0);
    assert_eq!(position.y, 128.0);

    let arrow_data = position
        .middleware_data
        .deserialize::<ArrowData>("arrow")
        .unwrap();
    // Arrow centered over the reference within the 160-wide popover.
    assert_eq!(arrow_data.x, Some(72.0));
    assert_eq!(arrow_data.center_offset, 0.0);

    let hide_data = position
        .middleware_data
        .deserialize::<HideData>("hide")
        .unwrap();
    assert_eq!(hide_data.reference_hidden, Some(false));
}

#[test]
fn test_flip_respects_custom_boundary() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let container = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 400.0, 200.0,
    )));
    // Plenty of viewport below, but not within the container boundary.
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 160.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 80.0, 40.0,
    )));

    let unbounded = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![flip(FlipOptions::default())],
        },
    )
    .unwrap();
    assert_eq!(unbounded.placement, Placement::BOTTOM);

    let bounded = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![flip(FlipOptions {
                detect: DetectOverflowOptions {
                    boundary: Boundary::Element(container),
                    ..Default::default()
                },
                ..Default::default()
            })],
        },
    )
    .unwrap();
    assert_eq!(bounded.placement, Placement::TOP);
}

#[test]
fn test_reactive_updates_follow_geometry() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 100.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 80.0, 40.0,
    )));

    let handle = create_floating(
        platform.clone(),
        Some(reference),
        Some(floating),
        FloatingOptions {
            middleware: vec![offset(4.0)],
            while_mounted: Some(platform.while_mounted()),
            ..Default::default()
        },
    );
    assert_eq!(handle.x().get(), 85.0);
    assert_eq!(handle.y().get(), 124.0);

    platform
        .set_rect(reference, Rect::new(300.0, 200.0, 50.0, 20.0))
        .unwrap();
    flush_sync();
    assert_eq!(handle.x().get(), 285.0);
    assert_eq!(handle.y().get(), 224.0);

    // Detaching freezes the committed position.
    handle.detach();
    platform
        .set_rect(reference, Rect::new(0.0, 0.0, 50.0, 20.0))
        .unwrap();
    flush_sync();
    assert_eq!(handle.x().get(), 285.0);
}

#[test]
fn test_flip_reacts_to_viewport_resize() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 400.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 80.0, 40.0,
    )));

    let handle = create_floating(
        platform.clone(),
        Some(reference),
        Some(floating),
        FloatingOptions {
            middleware: vec![flip(FlipOptions::default())],
            while_mounted: Some(platform.while_mounted()),
            ..Default::default()
        },
    );
    assert_eq!(handle.placement().get(), Placement::BOTTOM);

    // Shrinking the viewport leaves no room below the reference.
    platform.set_viewport(Rect::new(0.0, 0.0, 800.0, 440.0));
    flush_sync();
    assert_eq!(handle.placement().get(), Placement::TOP);
}

#[test]
fn test_unmount_keeps_state_and_remount_recovers() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 100.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 80.0, 40.0,
    )));

    let handle = create_floating(
        platform.clone(),
        Some(reference),
        Some(floating),
        FloatingOptions {
            while_mounted: Some(platform.while_mounted()),
            ..Default::default()
        },
    );
    assert_eq!(handle.x().get(), 85.0);

    // A removed reference fails the platform queries; the last committed
    // position stays.
    platform.remove(reference);
    flush_sync();
    assert_eq!(handle.x().get(), 85.0);

    // The freed slot is reused, so the same handle picks the element back
    // up on the next geometry change.
    let remounted = platform.insert(ElementConfig::with_rect(Rect::new(
        200.0, 100.0, 50.0, 20.0,
    )));
    assert_eq!(remounted, reference);
    flush_sync();
    assert_eq!(handle.x().get(), 185.0);
}

#[test]
fn test_fixed_strategy_ignores_offset_parent() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let parent = platform.insert(ElementConfig {
        rect: Rect::new(50.0, 50.0, 400.0, 400.0),
        ..Default::default()
    });
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 100.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig {
        rect: Rect::new(0.0, 0.0, 80.0, 40.0),
        offset_parent: Some(parent),
        ..Default::default()
    });

    let absolute = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig::default(),
    )
    .unwrap();
    // Relative to the offset parent at (50, 50).
    assert_eq!(absolute.x, 35.0);
    assert_eq!(absolute.y, 70.0);

    let fixed = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig { strategy: Strategy::Fixed, ..Default::default() },
    )
    .unwrap();
    assert_eq!(fixed.x, 85.0);
    assert_eq!(fixed.y, 120.0);
}

#[test]
fn test_rtl_mirrors_aligned_placements() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        100.0, 100.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig {
        rect: Rect::new(0.0, 0.0, 80.0, 40.0),
        rtl: true,
        ..Default::default()
    });

    let position = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig {
            placement: Placement::BOTTOM_START,
            strategy: Strategy::Absolute,
            middleware: Vec::new(),
        },
    )
    .unwrap();

    // In RTL, bottom-start anchors to the reference's end edge.
    assert_eq!(position.x, 70.0);
    assert_eq!(position.y, 120.0);
}

#[test]
fn test_middleware_order_matters() {
    let platform = HeadlessPlatform::new(800.0, 600.0);
    let reference = platform.insert(ElementConfig::with_rect(Rect::new(
        740.0, 100.0, 50.0, 20.0,
    )));
    let floating = platform.insert(ElementConfig::with_rect(Rect::new(
        0.0, 0.0, 80.0, 40.0,
    )));

    let sideways = OffsetValue { main_axis: 0.0, cross_axis: 30.0, alignment_axis: None };

    // shift before offset: the later offset pushes the element back out of
    // view, which is why the conventional order puts shift last.
    let shifted_first = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![
                shift(ShiftOptions::default()),
                offset(Derivable::Static(sideways)),
            ],
        },
    )
    .unwrap();

    let offset_first = compute_position(
        &*platform,
        reference,
        floating,
        &ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![
                offset(Derivable::Static(sideways)),
                shift(ShiftOptions::default()),
            ],
        },
    )
    .unwrap();

    assert_eq!(shifted_first.x, 750.0);
    assert_eq!(offset_first.x, 720.0);
}
